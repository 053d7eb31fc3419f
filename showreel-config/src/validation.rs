//! Guard rails applied to the effective configuration.
//!
//! Hard errors stop the player from starting; warnings are surfaced to the
//! caller and logged.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::models::Config;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigGuardRailError {
    #[error("`{field}` must be greater than zero")]
    ZeroDuration { field: &'static str },
    #[error("`playback.volume` must be within 0.0..=1.0 (got {value})")]
    VolumeOutOfRange { value: f32 },
    #[error("`progress.report_interval_secs` must be positive")]
    ReportIntervalNotPositive,
    #[error("`controls.volume_step` must be within (0.0, 1.0] (got {value})")]
    VolumeStepOutOfRange { value: f32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.hint {
            Some(hint) => write!(f, "{} ({hint})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigWarnings {
    items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push(&mut self, message: impl Into<String>) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint(
        &mut self,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    for (field, value) in [
        ("server.request_timeout", config.server.request_timeout),
        ("playback.fetch_timeout", config.playback.fetch_timeout),
        ("playback.load_timeout", config.playback.load_timeout),
        ("playback.heartbeat_interval", config.playback.heartbeat_interval),
    ] {
        if value.is_zero() {
            return Err(ConfigGuardRailError::ZeroDuration { field });
        }
    }

    let volume = config.playback.volume;
    if !(0.0..=1.0).contains(&volume) {
        return Err(ConfigGuardRailError::VolumeOutOfRange { value: volume });
    }

    if config.progress.report_interval_secs == 0 {
        return Err(ConfigGuardRailError::ReportIntervalNotPositive);
    }

    let step = config.controls.volume_step;
    if !(step > 0.0 && step <= 1.0) {
        return Err(ConfigGuardRailError::VolumeStepOutOfRange { value: step });
    }

    if config.server.base_url.scheme() == "http"
        && config.server.auth_token.is_some()
        && !is_loopback(&config.server.base_url)
    {
        warnings.push_with_hint(
            "Auth token is sent over plain HTTP",
            "Point SHOWREEL_SERVER_URL at an https endpoint",
        );
    }

    if config.playback.heartbeat_interval
        > Duration::from_secs(config.progress.report_interval_secs)
    {
        warnings.push(format!(
            "Heartbeat interval {} is longer than the report interval",
            humantime::format_duration(config.playback.heartbeat_interval)
        ));
    }

    if config.playback.preferred_subtitle_languages.is_empty() {
        warnings.push("No preferred subtitle language; subtitles start off");
    }

    Ok(warnings)
}

fn is_loopback(url: &url::Url) -> bool {
    match url.host() {
        Some(url::Host::Domain(domain)) => domain == "localhost",
        Some(url::Host::Ipv4(addr)) => addr.is_loopback(),
        Some(url::Host::Ipv6(addr)) => addr.is_loopback(),
        None => false,
    }
}
