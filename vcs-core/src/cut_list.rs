//! Cut-list compilation
//!
//! A cut list is a sequence of discrete instructions, each replacing the set
//! of active inputs with pre-rendered clips at a given time. Compiling one
//! produces the event timeline plus the playback timings the input side needs
//! in order to feed the clips to the renderer at the right frames.

use crate::timeline::{EventSnapshot, Params, SlotActivation, Timeline};
use crate::{ClipTime, CompileOptions, Error, Result, VideoInputId};
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Identity and length of a source clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipInfo {
    pub id: String,
    pub duration: ClipTime,
}

/// A clip that has been rendered to an image sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedClip {
    /// Source clip, absent for renders that cannot be referenced by cuts
    #[serde(default)]
    pub clip: Option<ClipInfo>,
    /// Video input the sequence is played into
    pub video_input_id: VideoInputId,
    /// Directory holding the rendered frames
    pub seq_dir: String,
    pub w: u32,
    pub h: u32,
    /// Frame rate of the rendered sequence
    pub fps: f64,
}

/// Switches the active inputs to a list of clips at time `t`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutEvent {
    pub t: ClipTime,
    #[serde(default)]
    pub clips: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
}

/// Tells the input side to start playing a rendered clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackEvent {
    pub frame: u64,
    pub video_input_id: VideoInputId,
    pub duration_in_frames: u64,
    pub clip_id: String,
    pub seq_dir: String,
    pub w: u32,
    pub h: u32,
}

/// Playback schedule for all clips referenced by a cut list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderInputTimings {
    pub playback_events: Vec<PlaybackEvent>,
}

impl RenderInputTimings {
    /// Writes the timings as pretty-printed JSON
    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Result of compiling a cut list
#[derive(Debug, Clone, PartialEq)]
pub struct CutListOutput {
    pub timeline: Timeline,
    pub input_timings: RenderInputTimings,
}

/// Finds the rendered clip for `clip_id`
fn find_clip<'a>(
    rendered_clips: &'a [RenderedClip],
    clip_id: &str,
) -> Result<(&'a RenderedClip, &'a ClipInfo)> {
    rendered_clips
        .iter()
        .find_map(|rendered| match &rendered.clip {
            Some(info) if info.id == clip_id => Some((rendered, info)),
            _ => None,
        })
        .ok_or_else(|| Error::ClipNotFound(clip_id.to_string()))
}

/// Compiles a cut list into a timeline and its playback timings.
///
/// Cuts are applied in list order. A cut naming clips replaces the active
/// set with exactly those clips; a cut naming none keeps the previous set and
/// only changes params. A later cut on the same frame replaces the earlier
/// entry, except that frame 0 keeps its params when the cut brings none.
///
/// Fails on the first clip id that no rendered clip matches.
pub fn compile_cuts(
    rendered_clips: &[RenderedClip],
    cuts: &[CutEvent],
    options: &CompileOptions,
) -> Result<CutListOutput> {
    let mut timeline = Timeline::new(
        options.duration_in_frames,
        options.fps,
        options.output_size,
        options.initial_params.clone(),
    );
    let mut input_timings = RenderInputTimings::default();
    let mut current_slots: Vec<Option<SlotActivation>> = Vec::new();

    debug!(
        "Compiling {} cuts over {} rendered clips",
        cuts.len(),
        rendered_clips.len()
    );

    for cut in cuts {
        let t = cut.t.secs()?;
        let frame = (t * options.fps as f64).floor() as u64;

        if !cut.clips.is_empty() {
            let mut slots = Vec::with_capacity(cut.clips.len());
            for clip_id in &cut.clips {
                let (rendered, info) = find_clip(rendered_clips, clip_id)?;
                let duration = info.duration.secs()?;

                input_timings.playback_events.push(PlaybackEvent {
                    frame,
                    video_input_id: rendered.video_input_id.clone(),
                    duration_in_frames: (duration * rendered.fps).ceil() as u64,
                    clip_id: clip_id.clone(),
                    seq_dir: rendered.seq_dir.clone(),
                    w: rendered.w,
                    h: rendered.h,
                });
                slots.push(Some(SlotActivation::new(
                    rendered.video_input_id.clone(),
                    None,
                )));
            }
            current_slots = slots;
        }

        let mut params = cut.params.clone().filter(|p| !p.is_empty());
        if params.is_none() && frame == 0 {
            params = timeline
                .events_by_frame
                .get(&0)
                .and_then(|snapshot| snapshot.params.clone());
        }

        timeline.events_by_frame.insert(
            frame,
            EventSnapshot {
                active_video_input_slots: current_slots.clone(),
                params,
            },
        );
    }

    debug!(
        "Cut list produced {} entries and {} playback events",
        timeline.events_by_frame.len(),
        input_timings.playback_events.len()
    );

    Ok(CutListOutput {
        timeline,
        input_timings,
    })
}
