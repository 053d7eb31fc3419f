//! Player focused snapshot of the model surface.
//! Prefer importing from this module in presentation and orchestration
//! crates instead of reaching into individual modules.

pub use super::error::{ModelError, Result as ModelResult};
pub use super::ids::{EpisodeId, UserId, VideoId};
pub use super::media::{
    ContainerType, EpisodeMedia, Quality, Rendition, SubtitleFormat,
    SubtitleTrack,
};
pub use super::playlist::{EpisodePlaylist, EpisodeSummary};
pub use super::watch::{ProgressRecord, VideoSummary};
