//! Watch-progress throttling
//!
//! Decides when a position becomes a [`ProgressRecord`]. Delivery to the
//! history collaborator happens elsewhere; this type only holds the rules.

use std::time::Duration;

use showreel_config::ProgressSettings;
use showreel_model::{EpisodeId, ProgressRecord, UserId, VideoId};

#[derive(Debug, Clone)]
pub struct ProgressReporter {
    settings: ProgressSettings,
    user: Option<UserId>,
    episode: Option<(VideoId, EpisodeId)>,
    /// Content second the current throttle window started at
    window_start: u64,
    last_sent: Option<u64>,
}

impl ProgressReporter {
    pub fn new(settings: ProgressSettings) -> Self {
        Self {
            settings,
            user: None,
            episode: None,
            window_start: 0,
            last_sent: None,
        }
    }

    /// Start tracking a new episode. Clears throttle and duplicate state.
    pub fn begin(
        &mut self,
        user: Option<UserId>,
        video: VideoId,
        episode: EpisodeId,
    ) {
        self.user = user;
        self.episode = Some((video, episode));
        self.window_start = 0;
        self.last_sent = None;
    }

    /// Stop reporting until the next [`begin`](Self::begin).
    pub fn clear(&mut self) {
        self.episode = None;
        self.window_start = 0;
        self.last_sent = None;
    }

    pub fn last_sent(&self) -> Option<u64> {
        self.last_sent
    }

    /// Periodic rule: more than `report_interval_secs` of content time since
    /// the window start, and past the `min_position_secs` guard.
    pub fn observe(&mut self, position: Duration) -> Option<ProgressRecord> {
        let secs = position.as_secs();

        // Backward seeks restart the window from the new position
        if secs < self.window_start {
            self.window_start = secs;
        }

        if secs <= self.settings.min_position_secs {
            return None;
        }
        if secs - self.window_start <= self.settings.report_interval_secs {
            return None;
        }

        let record = self.emit(secs)?;
        self.window_start = secs;
        Some(record)
    }

    /// Final record on end of stream, at the full duration.
    pub fn finish(&mut self, duration: Duration) -> Option<ProgressRecord> {
        let secs = duration.as_secs();
        let record = self.emit(secs)?;
        self.window_start = secs;
        Some(record)
    }

    /// Last checkpoint before leaving an episode.
    pub fn flush(&mut self, position: Duration) -> Option<ProgressRecord> {
        let secs = position.as_secs();
        if secs <= self.settings.min_position_secs {
            return None;
        }
        self.emit(secs)
    }

    fn emit(&mut self, secs: u64) -> Option<ProgressRecord> {
        let user_id = self.user?;
        let (video_id, episode_id) = self.episode?;
        if self.last_sent == Some(secs) {
            return None;
        }
        self.last_sent = Some(secs);
        Some(ProgressRecord {
            user_id,
            video_id,
            episode_id,
            position_seconds: secs,
        })
    }
}
