//! Core data model definitions shared across Showreel crates.
#![allow(missing_docs)]

pub mod error;
pub mod ids;
pub mod media;
pub mod playlist;
pub mod prelude;
pub mod watch;
pub mod wire;

// Intentionally curated re-exports for downstream consumers.
pub use error::{ModelError, Result as ModelResult};
pub use ids::{EpisodeId, UserId, VideoId};
pub use media::{
    ContainerType, EpisodeMedia, Quality, Rendition, SubtitleFormat,
    SubtitleTrack,
};
pub use playlist::{EpisodePlaylist, EpisodeSummary};
pub use watch::{ProgressRecord, VideoSummary};
pub use wire::{
    EpisodeRecord, ProgressRequest, SourceRecord, SubtitleRecord, VideoRecord,
};
