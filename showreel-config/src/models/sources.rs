use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::loader::error::ConfigLoadError;
use crate::util::{duration_var, parse_bool_var, parse_csv_var, string_var};

/// Raw configuration as defined in a TOML file.
///
/// Durations stay as strings here (`"15s"`) and are parsed while composing
/// the effective [`Config`](super::Config).
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub playback: FilePlaybackConfig,
    #[serde(default)]
    pub progress: FileProgressConfig,
    #[serde(default)]
    pub controls: FileControlsConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FilePlaybackConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_subtitle_languages: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoplay: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_advance: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartbeat_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_media: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileProgressConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_interval_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_position_secs: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileControlsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seek_step_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_step: Option<f32>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_url: Option<String>,
    pub auth_token: Option<String>,
    pub load_timeout: Option<Duration>,
    pub fetch_timeout: Option<Duration>,
    pub preferred_quality: Option<String>,
    pub subtitle_languages: Option<Vec<String>>,
    pub autoplay: Option<bool>,
    pub auto_advance: Option<bool>,
}

impl EnvConfig {
    pub fn gather() -> Result<Self, ConfigLoadError> {
        let mut env_config = Self::default();

        env_config.config_path =
            string_var("SHOWREEL_CONFIG_PATH").map(PathBuf::from);
        env_config.server_url = string_var("SHOWREEL_SERVER_URL");
        env_config.auth_token = string_var("SHOWREEL_AUTH_TOKEN");
        env_config.load_timeout = duration_var("SHOWREEL_LOAD_TIMEOUT")
            .map_err(ConfigLoadError::Env)?;
        env_config.fetch_timeout = duration_var("SHOWREEL_FETCH_TIMEOUT")
            .map_err(ConfigLoadError::Env)?;
        env_config.preferred_quality = string_var("SHOWREEL_PREFERRED_QUALITY");
        env_config.subtitle_languages =
            parse_csv_var("SHOWREEL_SUBTITLE_LANGUAGES");
        env_config.autoplay = parse_bool_var("SHOWREEL_AUTOPLAY");
        env_config.auto_advance = parse_bool_var("SHOWREEL_AUTO_ADVANCE");

        Ok(env_config)
    }
}
