use std::time::Duration;

use showreel_model::{EpisodeId, ProgressRecord, Quality, UserId};
use tokio::sync::oneshot;

use super::state::{PlaybackError, SessionState, SubtitleChoice};

/// Parameters for one watch attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRequest {
    pub episode_id: EpisodeId,
    /// `None` disables progress reporting
    pub user_id: Option<UserId>,
    pub preferred_quality: Option<Quality>,
    /// Pending resume position, applied after the first successful load
    pub resume_from: Option<Duration>,
}

impl SessionRequest {
    pub fn new(episode_id: EpisodeId) -> Self {
        Self {
            episode_id,
            user_id: None,
            preferred_quality: None,
            resume_from: None,
        }
    }

    pub fn for_user(mut self, user: UserId) -> Self {
        self.user_id = Some(user);
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.preferred_quality = Some(quality);
        self
    }

    pub fn resume_from(mut self, position: Duration) -> Self {
        self.resume_from = Some(position);
        self
    }
}

/// Notifications broadcast to every subscriber of a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged(SessionState),
    ProgressReported(ProgressRecord),
    /// Non-blocking message for the UI (quality rollback, bad request)
    Notice(String),
    Failed(PlaybackError),
}

#[derive(Debug)]
pub(crate) enum SessionCommand {
    Initialize(SessionRequest),
    RequestQuality(Quality),
    RequestSubtitle(SubtitleChoice),
    TogglePlayPause,
    Play,
    Pause,
    SeekTo(Duration),
    /// Signed seconds
    SeekRelative(f64),
    SetVolume(f32),
    AdjustVolume(f32),
    ToggleMute,
    SetPlaybackRate(f32),
    ToggleSubtitles,
    NextEpisode,
    PreviousEpisode,
    Destroy(oneshot::Sender<()>),
}
