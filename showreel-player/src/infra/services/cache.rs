//! In-memory memoization of catalog lookups
//!
//! Episode media is immutable for the lifetime of a catalog entry, so revisiting
//! an episode (previous/next, retry after an engine failure) can skip the round
//! trip. Only successful answers are kept.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use showreel_contracts::{CatalogError, EpisodeCatalog};
use showreel_model::{
    EpisodeId, EpisodeMedia, EpisodeSummary, VideoId, VideoSummary,
};

#[derive(Clone)]
pub struct CachedCatalog {
    inner: Arc<dyn EpisodeCatalog>,
    media: Arc<DashMap<EpisodeId, EpisodeMedia>>,
    episodes: Arc<DashMap<VideoId, Vec<EpisodeSummary>>>,
    videos: Arc<DashMap<VideoId, VideoSummary>>,
}

impl std::fmt::Debug for CachedCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedCatalog")
            .field("media", &self.media.len())
            .field("episode_lists", &self.episodes.len())
            .field("videos", &self.videos.len())
            .finish()
    }
}

impl CachedCatalog {
    pub fn new(inner: Arc<dyn EpisodeCatalog>) -> Self {
        Self {
            inner,
            media: Arc::new(DashMap::new()),
            episodes: Arc::new(DashMap::new()),
            videos: Arc::new(DashMap::new()),
        }
    }

    /// Forget everything known about one episode.
    pub fn invalidate_episode(&self, episode: EpisodeId) {
        self.media.remove(&episode);
    }

    /// Forget the episode list and summary of one video.
    pub fn invalidate_video(&self, video: VideoId) {
        self.episodes.remove(&video);
        self.videos.remove(&video);
    }

    pub fn clear(&self) {
        self.media.clear();
        self.episodes.clear();
        self.videos.clear();
    }
}

#[async_trait]
impl EpisodeCatalog for CachedCatalog {
    async fn fetch_media(
        &self,
        episode: EpisodeId,
    ) -> Result<EpisodeMedia, CatalogError> {
        if let Some(hit) = self.media.get(&episode) {
            log::debug!("[Catalog] media cache hit for episode {episode}");
            return Ok(hit.value().clone());
        }
        let media = self.inner.fetch_media(episode).await?;
        self.media.insert(episode, media.clone());
        Ok(media)
    }

    async fn list_episodes(
        &self,
        video: VideoId,
    ) -> Result<Vec<EpisodeSummary>, CatalogError> {
        if let Some(hit) = self.episodes.get(&video) {
            return Ok(hit.value().clone());
        }
        let episodes = self.inner.list_episodes(video).await?;
        self.episodes.insert(video, episodes.clone());
        Ok(episodes)
    }

    async fn fetch_video(
        &self,
        video: VideoId,
    ) -> Result<VideoSummary, CatalogError> {
        if let Some(hit) = self.videos.get(&video) {
            return Ok(hit.value().clone());
        }
        let summary = self.inner.fetch_video(video).await?;
        self.videos.insert(video, summary.clone());
        Ok(summary)
    }
}
