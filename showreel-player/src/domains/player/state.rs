use std::fmt;
use std::time::Duration;

use showreel_model::{
    EpisodeId, Quality, SubtitleTrack, VideoId, VideoSummary,
};
use thiserror::Error;

use crate::infra::constants::player::playback::DEFAULT_PLAYBACK_RATE;

/// Lifecycle of a playback session.
///
/// `Idle -> Loading -> Ready -> (Switching -> Ready)* -> Ended`, with `Error`
/// reachable from `Loading`, `Switching` or an engine fatal error and
/// `Destroyed` reachable from anywhere.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Loading,
    Ready,
    Switching,
    Ended,
    Error(PlaybackError),
    Destroyed,
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading | SessionState::Switching)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SessionState::Error(_))
    }

    pub fn error(&self) -> Option<&PlaybackError> {
        match self {
            SessionState::Error(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => f.write_str("idle"),
            SessionState::Loading => f.write_str("loading"),
            SessionState::Ready => f.write_str("ready"),
            SessionState::Switching => f.write_str("switching"),
            SessionState::Ended => f.write_str("ended"),
            SessionState::Error(err) => write!(f, "error ({err})"),
            SessionState::Destroyed => f.write_str("destroyed"),
        }
    }
}

/// Errors surfaced to the UI. Raw engine and HTTP errors are converted into
/// one of these at the controller boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlaybackError {
    /// Episode or video metadata unavailable or malformed
    #[error("episode {episode} could not be fetched: {reason}")]
    CatalogFetch {
        episode: EpisodeId,
        reason: String,
        not_found: bool,
    },

    /// The catalog returned zero renditions
    #[error("episode {0} has no playable renditions")]
    Unplayable(EpisodeId),

    /// The engine failed to load a rendition, or a fetch/load timed out
    #[error("load failed: {reason}")]
    Load {
        quality: Option<Quality>,
        reason: String,
    },

    /// Unrecoverable engine failure reported through its error listener
    #[error("playback engine failed: {0}")]
    EngineFatal(String),
}

/// What the UI should offer next to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Inline retry (replay `initialize`)
    Retry,
    /// "Episode not available" messaging with navigation away
    NavigateAway,
}

impl PlaybackError {
    pub fn recovery(&self) -> Recovery {
        match self {
            PlaybackError::Load { .. } | PlaybackError::EngineFatal(_) => {
                Recovery::Retry
            }
            PlaybackError::CatalogFetch { .. }
            | PlaybackError::Unplayable(_) => Recovery::NavigateAway,
        }
    }

    /// Short user-facing message
    pub fn user_message(&self) -> &'static str {
        match self {
            PlaybackError::CatalogFetch {
                not_found: true, ..
            } => "Episode not found",
            PlaybackError::CatalogFetch { .. } => {
                "Episode details are unavailable right now"
            }
            PlaybackError::Unplayable(_) => {
                "This episode has no playable sources"
            }
            PlaybackError::Load { .. } => {
                "Episode failed to load, retry available"
            }
            PlaybackError::EngineFatal(_) => {
                "Playback stopped unexpectedly, retry available"
            }
        }
    }
}

/// Subtitle selection. `Off` hides every track.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubtitleChoice {
    #[default]
    Off,
    Language(String),
}

impl SubtitleChoice {
    pub fn language(&self) -> Option<&str> {
        match self {
            SubtitleChoice::Off => None,
            SubtitleChoice::Language(lang) => Some(lang),
        }
    }
}

/// Observable view of the session, published after every change.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub episode_id: Option<EpisodeId>,
    pub video_id: Option<VideoId>,
    pub title: Option<String>,
    pub episode_number: Option<i32>,
    pub video: Option<VideoSummary>,
    pub selected_quality: Option<Quality>,
    pub available_qualities: Vec<Quality>,
    pub subtitle_tracks: Vec<SubtitleTrack>,
    pub selected_subtitle: SubtitleChoice,
    pub subtitles_visible: bool,
    pub is_playing: bool,
    pub last_known_position: Duration,
    pub last_reported_position: Option<u64>,
    pub duration: Option<Duration>,
    pub volume: f32,
    pub muted: bool,
    pub playback_rate: f32,
    pub previous_episode: Option<EpisodeId>,
    pub next_episode: Option<EpisodeId>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            episode_id: None,
            video_id: None,
            title: None,
            episode_number: None,
            video: None,
            selected_quality: None,
            available_qualities: Vec::new(),
            subtitle_tracks: Vec::new(),
            selected_subtitle: SubtitleChoice::Off,
            subtitles_visible: false,
            is_playing: false,
            last_known_position: Duration::ZERO,
            last_reported_position: None,
            duration: None,
            volume: 1.0,
            muted: false,
            playback_rate: DEFAULT_PLAYBACK_RATE,
            previous_episode: None,
            next_episode: None,
        }
    }
}
