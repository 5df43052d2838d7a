//! VCS Core Library
//!
//! This library turns continuous-time media track descriptors into the sparse,
//! frame-indexed event timeline consumed by a VCS composition renderer.

pub mod clip_time;
pub mod compiler;
pub mod cut_list;
pub mod timeline;
pub mod track;

pub use clip_time::{parse_clip_time, ClipTime};
pub use compiler::{compile, CompileOptions};
pub use cut_list::{
    compile_cuts, ClipInfo, CutEvent, CutListOutput, PlaybackEvent, RenderInputTimings,
    RenderedClip,
};
pub use timeline::{EventSnapshot, OutputSize, Params, SlotActivation, Timeline};
pub use track::{read_tracks, TrackDescriptor, VideoInputId};

/// Result type for vcs-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for vcs-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cut specifies clip '{0}' that doesn't exist")]
    ClipNotFound(String),

    #[error("Invalid clip time: {0:?}")]
    InvalidClipTime(String),

    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(u32),

    #[error("Invalid output size: {w}x{h}")]
    InvalidOutputSize { w: u32, h: u32 },
}
