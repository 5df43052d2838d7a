//! Compiles track descriptors into a sparse frame-indexed timeline

use crate::timeline::{OutputSize, Params, SlotActivation, Timeline};
use crate::{Error, Result, TrackDescriptor};
use log::{debug, trace};
use std::collections::BTreeMap;

/// Timeline compilation options
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    /// Reported timeline length in frames
    pub duration_in_frames: u64,
    /// Frames per second used to quantize track times
    pub fps: u32,
    /// Output frame size
    pub output_size: OutputSize,
    /// Parameters established at frame 0
    pub initial_params: Params,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            duration_in_frames: 0,
            fps: 30,
            output_size: OutputSize::default(),
            initial_params: Params::new(),
        }
    }
}

impl CompileOptions {
    /// Checks that the frame rate and output size are usable by a renderer
    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(Error::InvalidFrameRate(self.fps));
        }
        let OutputSize { w, h } = self.output_size;
        if w == 0 || h == 0 {
            return Err(Error::InvalidOutputSize { w, h });
        }
        Ok(())
    }
}

/// Slots starting and ending at one frame
#[derive(Debug, Default)]
struct FrameChanges {
    starting: Vec<usize>,
    ending: Vec<usize>,
}

/// Running slot sequence threaded through the change frames
#[derive(Debug, Default)]
struct SlotState {
    slots: Vec<Option<SlotActivation>>,
}

impl SlotState {
    fn put(&mut self, slot: usize, value: Option<SlotActivation>) {
        if slot >= self.slots.len() {
            self.slots.resize(slot + 1, None);
        }
        self.slots[slot] = value;
    }

    /// Clears ending slots, then fills starting ones
    fn apply(mut self, changes: &FrameChanges, tracks: &[TrackDescriptor]) -> Self {
        for &slot in &changes.ending {
            self.put(slot, None);
        }
        for &slot in &changes.starting {
            let track = &tracks[slot];
            self.put(
                slot,
                Some(SlotActivation::new(
                    track.video_input_id.clone(),
                    Some(track.display_name(slot)),
                )),
            );
        }
        self
    }
}

/// Groups slot indices by the frames at which they start and end
fn index_changes(tracks: &[TrackDescriptor], fps: u32) -> BTreeMap<u64, FrameChanges> {
    let mut changes: BTreeMap<u64, FrameChanges> = BTreeMap::new();

    for (slot, track) in tracks.iter().enumerate() {
        changes
            .entry(track.start_frame(fps))
            .or_default()
            .starting
            .push(slot);

        if let Some(end_frame) = track.end_frame(fps) {
            changes.entry(end_frame).or_default().ending.push(slot);
        }
    }

    changes
}

/// Compiles `tracks` into a timeline.
///
/// Every frame at which a track starts or ends gets a complete snapshot of
/// the active slots; all other frames carry forward the previous snapshot.
/// Slot `i` always belongs to `tracks[i]`. Offsets and durations must be
/// non-negative.
pub fn compile(tracks: &[TrackDescriptor], options: &CompileOptions) -> Timeline {
    let timeline = Timeline::new(
        options.duration_in_frames,
        options.fps,
        options.output_size,
        options.initial_params.clone(),
    );

    let changes = index_changes(tracks, options.fps);
    debug!(
        "Compiling {} tracks into {} change frames at {} fps",
        tracks.len(),
        changes.len(),
        options.fps
    );

    let (_, timeline) = changes.iter().fold(
        (SlotState::default(), timeline),
        |(state, mut timeline), (&frame, frame_changes)| {
            trace!(
                "Frame {}: {} starting, {} ending",
                frame,
                frame_changes.starting.len(),
                frame_changes.ending.len()
            );

            let state = state.apply(frame_changes, tracks);
            timeline
                .events_by_frame
                .entry(frame)
                .or_default()
                .active_video_input_slots = state.slots.clone();

            (state, timeline)
        },
    );

    timeline
}
