use async_trait::async_trait;
use showreel_model::{
    EpisodeId, EpisodeMedia, EpisodeSummary, VideoId, VideoSummary,
};
use thiserror::Error;

/// Failures reported by a catalog implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("catalog responded with HTTP {status}")]
    Http { status: u16 },

    #[error("catalog unreachable: {0}")]
    Transport(String),

    #[error("catalog response could not be decoded: {0}")]
    Decode(String),

    #[error("catalog returned malformed data: {0}")]
    Malformed(String),
}

impl CatalogError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound(_))
    }
}

/// Read-only access to episode sources and their owning video.
///
/// Every call may suspend for an arbitrary time; callers must not assume a
/// cached or immediate answer.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait EpisodeCatalog: Send + Sync {
    /// Renditions and subtitle tracks for one episode
    async fn fetch_media(
        &self,
        episode: EpisodeId,
    ) -> Result<EpisodeMedia, CatalogError>;

    /// Episodes of a video, in whatever order the catalog keeps them
    async fn list_episodes(
        &self,
        video: VideoId,
    ) -> Result<Vec<EpisodeSummary>, CatalogError>;

    async fn fetch_video(
        &self,
        video: VideoId,
    ) -> Result<VideoSummary, CatalogError>;
}
