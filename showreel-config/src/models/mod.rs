pub mod sources;

use std::path::PathBuf;
use std::time::Duration;

use showreel_model::Quality;
use url::Url;

use crate::constants::{
    DEFAULT_FETCH_TIMEOUT, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_LOAD_TIMEOUT,
    DEFAULT_MIN_POSITION_SECS, DEFAULT_REPORT_INTERVAL_SECS,
    DEFAULT_SEEK_STEP_SECS, DEFAULT_SUBTITLE_LANGUAGE, DEFAULT_VOLUME,
    DEFAULT_VOLUME_STEP,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub playback: PlaybackSettings,
    pub progress: ProgressSettings,
    pub controls: ControlSettings,
    pub metadata: ConfigMetadata,
}

/// Catalog and history REST endpoint.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub base_url: Url,
    pub request_timeout: Duration,
    /// Bearer token forwarded on every request when present
    pub auth_token: Option<String>,
}

/// Knobs consumed by the session controller.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSettings {
    /// Upper bound for one catalog fetch
    pub fetch_timeout: Duration,
    /// Upper bound for one engine `load`
    pub load_timeout: Duration,
    /// Used when the session request does not name a quality
    pub preferred_quality: Option<Quality>,
    /// First matching subtitle track is shown on load
    pub preferred_subtitle_languages: Vec<String>,
    pub autoplay: bool,
    pub auto_advance: bool,
    pub heartbeat_interval: Duration,
    pub volume: f32,
    pub cache_media: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            preferred_quality: None,
            preferred_subtitle_languages: vec![
                DEFAULT_SUBTITLE_LANGUAGE.to_string(),
            ],
            autoplay: true,
            auto_advance: true,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            volume: DEFAULT_VOLUME,
            cache_media: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSettings {
    pub report_interval_secs: u64,
    pub min_position_secs: u64,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            report_interval_secs: DEFAULT_REPORT_INTERVAL_SECS,
            min_position_secs: DEFAULT_MIN_POSITION_SECS,
        }
    }
}

/// Keyboard transport steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSettings {
    pub seek_step_secs: u64,
    pub volume_step: f32,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            seek_step_secs: DEFAULT_SEEK_STEP_SECS,
            volume_step: DEFAULT_VOLUME_STEP,
        }
    }
}

impl ControlSettings {
    pub fn seek_step(&self) -> Duration {
        Duration::from_secs(self.seek_step_secs)
    }
}

/// Where the effective values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
