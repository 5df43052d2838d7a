//! Frame-indexed event timeline consumed by the composition renderer

use crate::{Result, VideoInputId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};

/// Composition profile every timeline targets
pub const COMPOSITION_ID: &str = "daily:baseline";

/// Composition parameters, opaque to the compiler
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Output frame size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSize {
    pub w: u32,
    pub h: u32,
}

impl OutputSize {
    /// Creates a new output size
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }
}

impl Default for OutputSize {
    fn default() -> Self {
        Self { w: 1280, h: 720 }
    }
}

/// A video input occupying a slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotActivation {
    /// Video input feeding the slot
    pub id: VideoInputId,
    /// Label shown by the renderer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl SlotActivation {
    /// Creates a new slot activation
    pub fn new(id: impl Into<VideoInputId>, display_name: Option<String>) -> Self {
        Self {
            id: id.into(),
            display_name,
        }
    }
}

/// Complete renderer state effective from one frame until the next entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSnapshot {
    /// Slots indexed by track position; `None` is an inactive slot
    #[serde(default)]
    pub active_video_input_slots: Vec<Option<SlotActivation>>,
    /// Parameters (re)established at this frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
}

impl EventSnapshot {
    /// Number of slots holding an activation
    pub fn active_count(&self) -> usize {
        self.active_video_input_slots
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }

    /// Activation in `slot`, if any
    pub fn slot(&self, slot: usize) -> Option<&SlotActivation> {
        self.active_video_input_slots.get(slot)?.as_ref()
    }
}

/// Sparse event timeline keyed by frame number.
///
/// Frames without an entry carry forward the most recent prior snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub composition_id: String,
    pub duration_in_frames: u64,
    pub frames_per_second: u32,
    pub output_size: OutputSize,
    pub events_by_frame: BTreeMap<u64, EventSnapshot>,
}

impl Timeline {
    /// Creates a timeline with frame 0 seeded by `initial_params` and no active slots
    pub fn new(
        duration_in_frames: u64,
        frames_per_second: u32,
        output_size: OutputSize,
        initial_params: Params,
    ) -> Self {
        let mut events_by_frame = BTreeMap::new();
        events_by_frame.insert(
            0,
            EventSnapshot {
                active_video_input_slots: Vec::new(),
                params: Some(initial_params),
            },
        );

        Self {
            composition_id: COMPOSITION_ID.to_string(),
            duration_in_frames,
            frames_per_second,
            output_size,
            events_by_frame,
        }
    }

    /// Reads a timeline from a JSON reader
    pub fn read_json<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Writes the timeline as pretty-printed JSON
    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    /// Frames holding an entry, in ascending order
    pub fn change_frames(&self) -> impl Iterator<Item = u64> + '_ {
        self.events_by_frame.keys().copied()
    }

    /// Gets the entry in effect at `frame` together with the frame it was recorded at
    pub fn snapshot_at(&self, frame: u64) -> Option<(u64, &EventSnapshot)> {
        self.events_by_frame
            .range(..=frame)
            .next_back()
            .map(|(&at, snapshot)| (at, snapshot))
    }

    /// Gets the slots active at `frame`
    pub fn active_slots_at(&self, frame: u64) -> &[Option<SlotActivation>] {
        match self.snapshot_at(frame) {
            Some((_, snapshot)) => &snapshot.active_video_input_slots,
            None => &[],
        }
    }

    /// Gets the most recently established parameters at `frame`
    pub fn params_at(&self, frame: u64) -> Option<&Params> {
        self.events_by_frame
            .range(..=frame)
            .rev()
            .find_map(|(_, snapshot)| snapshot.params.as_ref())
    }

    /// Duration of the timeline in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.frames_per_second == 0 {
            return 0.0;
        }
        self.duration_in_frames as f64 / self.frames_per_second as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Timeline {
        let mut params = Params::new();
        params.insert("showTitleSlate".into(), json!(true));
        let mut timeline = Timeline::new(300, 30, OutputSize::default(), params);

        timeline.events_by_frame.insert(
            30,
            EventSnapshot {
                active_video_input_slots: vec![Some(SlotActivation::new(
                    "a",
                    Some("track0".into()),
                ))],
                params: None,
            },
        );

        let mut later = Params::new();
        later.insert("showTitleSlate".into(), json!(false));
        timeline.events_by_frame.insert(
            90,
            EventSnapshot {
                active_video_input_slots: vec![None, Some(SlotActivation::new("b", None))],
                params: Some(later),
            },
        );
        timeline
    }

    #[test]
    fn test_new_seeds_frame_zero() {
        let timeline = Timeline::new(0, 30, OutputSize::default(), Params::new());

        assert_eq!(timeline.composition_id, "daily:baseline");
        assert_eq!(timeline.output_size, OutputSize::new(1280, 720));
        assert_eq!(timeline.change_frames().collect::<Vec<_>>(), vec![0]);

        let frame0 = &timeline.events_by_frame[&0];
        assert!(frame0.active_video_input_slots.is_empty());
        assert_eq!(frame0.params, Some(Params::new()));
    }

    #[test]
    fn test_snapshot_at_carries_forward() {
        let timeline = sample();

        assert_eq!(timeline.snapshot_at(0).map(|(at, _)| at), Some(0));
        assert_eq!(timeline.snapshot_at(29).map(|(at, _)| at), Some(0));
        assert_eq!(timeline.snapshot_at(30).map(|(at, _)| at), Some(30));
        assert_eq!(timeline.snapshot_at(89).map(|(at, _)| at), Some(30));
        assert_eq!(timeline.snapshot_at(10_000).map(|(at, _)| at), Some(90));

        assert!(timeline.active_slots_at(10).is_empty());
        assert_eq!(timeline.active_slots_at(45).len(), 1);
        assert_eq!(timeline.active_slots_at(95)[0], None);
    }

    #[test]
    fn test_params_at_uses_latest_established() {
        let timeline = sample();

        assert_eq!(timeline.params_at(45).unwrap()["showTitleSlate"], json!(true));
        assert_eq!(timeline.params_at(90).unwrap()["showTitleSlate"], json!(false));
    }

    #[test]
    fn test_snapshot_helpers() {
        let timeline = sample();
        let snapshot = &timeline.events_by_frame[&90];

        assert_eq!(snapshot.active_count(), 1);
        assert_eq!(snapshot.slot(0), None);
        assert_eq!(snapshot.slot(1).map(|s| s.id.to_string()), Some("b".to_string()));
        assert_eq!(snapshot.slot(7), None);
    }

    #[test]
    fn test_json_shape() {
        let timeline = sample();
        let value = serde_json::to_value(&timeline).unwrap();

        assert_eq!(value["compositionId"], json!("daily:baseline"));
        assert_eq!(value["framesPerSecond"], json!(30));
        assert_eq!(value["outputSize"], json!({"w": 1280, "h": 720}));
        assert_eq!(
            value["eventsByFrame"]["30"],
            json!({"activeVideoInputSlots": [{"id": "a", "displayName": "track0"}]})
        );
        assert_eq!(
            value["eventsByFrame"]["90"]["activeVideoInputSlots"],
            json!([null, {"id": "b"}])
        );
    }

    #[test]
    fn test_json_roundtrip() {
        let timeline = sample();

        let mut buffer = Vec::new();
        timeline.write_json(&mut buffer).unwrap();

        let read_timeline = Timeline::read_json(buffer.as_slice()).unwrap();
        assert_eq!(timeline, read_timeline);
    }
}
