//! Defaults applied when neither the file nor the environment set a value.

use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

pub const DEFAULT_SUBTITLE_LANGUAGE: &str = "en";
pub const DEFAULT_VOLUME: f32 = 1.0;

/// Content seconds between two periodic progress records
pub const DEFAULT_REPORT_INTERVAL_SECS: u64 = 30;
/// Positions at or below this are never reported periodically
pub const DEFAULT_MIN_POSITION_SECS: u64 = 5;

pub const DEFAULT_SEEK_STEP_SECS: u64 = 10;
pub const DEFAULT_VOLUME_STEP: f32 = 0.1;
