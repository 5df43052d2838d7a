//! Track descriptor data structures

use crate::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::io::Read;

/// Opaque identifier of a video input, echoed unchanged into the output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VideoInputId {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for VideoInputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoInputId::Number(n) => write!(f, "{}", n),
            VideoInputId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for VideoInputId {
    fn from(id: u64) -> Self {
        VideoInputId::Number(id.into())
    }
}

impl From<&str> for VideoInputId {
    fn from(id: &str) -> Self {
        VideoInputId::Text(id.to_string())
    }
}

impl From<String> for VideoInputId {
    fn from(id: String) -> Self {
        VideoInputId::Text(id)
    }
}

/// Describes one media track feeding a video input slot.
///
/// The position of a descriptor in its list is its slot index, so callers
/// must not reorder the list between compiling and consuming a timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDescriptor {
    /// Identifier of the media source feeding this slot
    pub video_input_id: VideoInputId,
    /// Optional display label; `track<index>` is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<String>,
    /// Time in seconds at which the track becomes active
    #[serde(default, deserialize_with = "null_as_zero")]
    pub start_offset_secs: f64,
    /// Active duration in seconds; zero or absent means open-ended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_in_secs: Option<f64>,
}

/// Reads a number where `null` counts as zero
fn null_as_zero<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

impl TrackDescriptor {
    /// Creates an open-ended track starting at the given offset
    pub fn new(video_input_id: impl Into<VideoInputId>, start_offset_secs: f64) -> Self {
        Self {
            video_input_id: video_input_id.into(),
            participant_id: None,
            start_offset_secs,
            duration_in_secs: None,
        }
    }

    /// Sets the participant label
    pub fn with_participant(mut self, participant_id: impl Into<String>) -> Self {
        self.participant_id = Some(participant_id.into());
        self
    }

    /// Sets the active duration in seconds
    pub fn with_duration(mut self, duration_in_secs: f64) -> Self {
        self.duration_in_secs = Some(duration_in_secs);
        self
    }

    /// Returns true if the track never produces an end frame
    pub fn is_open_ended(&self) -> bool {
        !matches!(self.duration_in_secs, Some(d) if d > 0.0)
    }

    /// Frame at which this track becomes active
    pub fn start_frame(&self, fps: u32) -> u64 {
        secs_to_frame(self.start_offset_secs, fps)
    }

    /// Frame at which this track stops being active, if it has a duration
    pub fn end_frame(&self, fps: u32) -> Option<u64> {
        match self.duration_in_secs {
            Some(duration) if duration > 0.0 => {
                Some(secs_to_frame(self.start_offset_secs + duration, fps))
            }
            _ => None,
        }
    }

    /// Label shown for this track when it occupies `slot`
    pub fn display_name(&self, slot: usize) -> String {
        match &self.participant_id {
            Some(participant_id) => participant_id.clone(),
            None => format!("track{}", slot),
        }
    }
}

/// Converts a time in seconds to the nearest frame number.
///
/// Halves round up, and negative or NaN inputs saturate to frame 0.
pub(crate) fn secs_to_frame(secs: f64, fps: u32) -> u64 {
    (secs * fps as f64).round() as u64
}

/// Reads a JSON array of track descriptors
pub fn read_tracks<R: Read>(reader: R) -> Result<Vec<TrackDescriptor>> {
    Ok(serde_json::from_reader(reader)?)
}
