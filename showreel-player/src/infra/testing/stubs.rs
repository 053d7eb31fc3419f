use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use showreel_contracts::{
    CatalogError, EpisodeCatalog, HistoryError, HistorySink,
};
use showreel_model::{
    EpisodeId, EpisodeMedia, EpisodeSummary, ProgressRecord, VideoId,
    VideoSummary,
};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct CatalogState {
    media: HashMap<EpisodeId, EpisodeMedia>,
    videos: HashMap<VideoId, VideoSummary>,
    failures: HashMap<EpisodeId, CatalogError>,
    media_fetches: HashMap<EpisodeId, usize>,
    list_calls: usize,
    delay: Duration,
}

/// Catalog answering from memory. Episode lists are derived from the
/// registered media.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    inner: Arc<RwLock<CatalogState>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_episode(self, media: EpisodeMedia) -> Self {
        self.insert(media);
        self
    }

    pub fn with_video(self, video: VideoSummary) -> Self {
        self.inner.write().videos.insert(video.id, video);
        self
    }

    pub fn insert(&self, media: EpisodeMedia) {
        self.inner.write().media.insert(media.episode_id, media);
    }

    pub fn fail_episode(&self, episode: EpisodeId, err: CatalogError) {
        self.inner.write().failures.insert(episode, err);
    }

    pub fn heal_episode(&self, episode: EpisodeId) {
        self.inner.write().failures.remove(&episode);
    }

    /// Latency applied to every lookup
    pub fn set_delay(&self, delay: Duration) {
        self.inner.write().delay = delay;
    }

    pub fn media_fetches(&self, episode: EpisodeId) -> usize {
        self.inner
            .read()
            .media_fetches
            .get(&episode)
            .copied()
            .unwrap_or(0)
    }

    pub fn list_calls(&self) -> usize {
        self.inner.read().list_calls
    }

    async fn pause(&self) {
        let delay = self.inner.read().delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl EpisodeCatalog for InMemoryCatalog {
    async fn fetch_media(
        &self,
        episode: EpisodeId,
    ) -> Result<EpisodeMedia, CatalogError> {
        self.pause().await;
        let mut state = self.inner.write();
        *state.media_fetches.entry(episode).or_default() += 1;
        if let Some(err) = state.failures.get(&episode) {
            return Err(err.clone());
        }
        state
            .media
            .get(&episode)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("episode {episode}")))
    }

    async fn list_episodes(
        &self,
        video: VideoId,
    ) -> Result<Vec<EpisodeSummary>, CatalogError> {
        self.pause().await;
        let mut state = self.inner.write();
        state.list_calls += 1;
        Ok(state
            .media
            .values()
            .filter(|media| media.video_id == video)
            .map(|media| EpisodeSummary {
                id: media.episode_id,
                episode_number: media.episode_number,
                title: media.title.clone(),
            })
            .collect())
    }

    async fn fetch_video(
        &self,
        video: VideoId,
    ) -> Result<VideoSummary, CatalogError> {
        self.pause().await;
        self.inner
            .read()
            .videos
            .get(&video)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("video {video}")))
    }
}

/// History sink that keeps every delivered record.
#[derive(Debug, Clone, Default)]
pub struct RecordingHistory {
    records: Arc<Mutex<Vec<ProgressRecord>>>,
    reject_with: Arc<Mutex<Option<u16>>>,
    delivered: Arc<Notify>,
}

impl RecordingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every following call with this HTTP status
    pub fn reject_with(&self, status: Option<u16>) {
        *self.reject_with.lock() = status;
    }

    pub fn records(&self) -> Vec<ProgressRecord> {
        self.records.lock().clone()
    }

    pub fn positions(&self) -> Vec<u64> {
        self.records
            .lock()
            .iter()
            .map(|record| record.position_seconds)
            .collect()
    }

    /// Wait until at least `count` records arrived.
    pub async fn wait_for(&self, count: usize) -> Vec<ProgressRecord> {
        loop {
            let notified = self.delivered.notified();
            {
                let records = self.records.lock();
                if records.len() >= count {
                    return records.clone();
                }
            }
            notified.await;
        }
    }
}

#[async_trait]
impl HistorySink for RecordingHistory {
    async fn record_progress(
        &self,
        record: ProgressRecord,
    ) -> Result<(), HistoryError> {
        if let Some(status) = *self.reject_with.lock() {
            return Err(HistoryError::Rejected { status });
        }
        self.records.lock().push(record);
        self.delivered.notify_waiters();
        Ok(())
    }
}
