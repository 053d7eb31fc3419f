use std::io::Write;
use std::time::Duration;

use showreel_config::models::sources::EnvConfig;
use showreel_config::{ConfigGuardRailError, ConfigLoadError, ConfigLoader};
use showreel_model::Quality;
use tempfile::NamedTempFile;

fn write_config(contents: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp config");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn defaults_apply_without_file_or_env() {
    let load = ConfigLoader::new()
        .without_env_file()
        .load_with_env(EnvConfig::default(), false)
        .expect("default config");
    let config = load.config;

    assert_eq!(config.server.base_url.as_str(), "http://localhost:3000/");
    assert_eq!(config.playback.load_timeout, Duration::from_secs(15));
    assert_eq!(config.playback.fetch_timeout, Duration::from_secs(15));
    assert_eq!(config.playback.preferred_subtitle_languages, vec!["en"]);
    assert!(config.playback.autoplay);
    assert!(config.playback.auto_advance);
    assert_eq!(config.progress.report_interval_secs, 30);
    assert_eq!(config.progress.min_position_secs, 5);
    assert_eq!(config.controls.seek_step_secs, 10);
    assert!(config.metadata.config_path.is_none());
    assert!(!load.warnings.is_empty());
}

#[test]
fn toml_file_values_are_used() {
    let file = write_config(
        r#"
[server]
base_url = "https://catalog.example"
request_timeout = "5s"

[playback]
load_timeout = "2500ms"
preferred_quality = "720p"
preferred_subtitle_languages = ["ko", "en"]
auto_advance = false
volume = 0.5

[progress]
report_interval_secs = 60

[controls]
seek_step_secs = 5
"#,
        ".toml",
    );

    let config = ConfigLoader::new()
        .with_config_path(file.path())
        .without_env_file()
        .load_with_env(EnvConfig::default(), false)
        .expect("file config")
        .config;

    assert_eq!(config.server.base_url.host_str(), Some("catalog.example"));
    assert_eq!(config.server.request_timeout, Duration::from_secs(5));
    assert_eq!(config.playback.load_timeout, Duration::from_millis(2500));
    assert_eq!(config.playback.preferred_quality, Some(Quality::P720));
    assert_eq!(config.playback.preferred_subtitle_languages, vec!["ko", "en"]);
    assert!(!config.playback.auto_advance);
    assert_eq!(config.playback.volume, 0.5);
    assert_eq!(config.progress.report_interval_secs, 60);
    assert_eq!(config.controls.seek_step_secs, 5);
    assert_eq!(config.metadata.config_path.as_deref(), Some(file.path()));
}

#[test]
fn environment_overrides_file() {
    let file = write_config(
        r#"
[server]
base_url = "https://file.example"

[playback]
load_timeout = "30s"
autoplay = true
"#,
        ".toml",
    );

    let env = EnvConfig {
        server_url: Some("https://env.example".into()),
        load_timeout: Some(Duration::from_secs(3)),
        autoplay: Some(false),
        subtitle_languages: Some(vec!["ja".into()]),
        ..EnvConfig::default()
    };

    let config = ConfigLoader::new()
        .with_config_path(file.path())
        .without_env_file()
        .load_with_env(env, false)
        .expect("merged config")
        .config;

    assert_eq!(config.server.base_url.host_str(), Some("env.example"));
    assert_eq!(config.playback.load_timeout, Duration::from_secs(3));
    assert!(!config.playback.autoplay);
    assert_eq!(config.playback.preferred_subtitle_languages, vec!["ja"]);
}

#[test]
fn json_config_is_accepted() {
    let file = write_config(
        r#"{"playback": {"heartbeat_interval": "4s"}}"#,
        ".json",
    );
    let config = ConfigLoader::new()
        .with_config_path(file.path())
        .without_env_file()
        .load_with_env(EnvConfig::default(), false)
        .expect("json config")
        .config;
    assert_eq!(config.playback.heartbeat_interval, Duration::from_secs(4));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let err = ConfigLoader::new()
        .with_config_path("/definitely/not/here/showreel.toml")
        .without_env_file()
        .load_with_env(EnvConfig::default(), false)
        .expect_err("missing config");
    assert!(matches!(err, ConfigLoadError::MissingConfig { .. }));
}

#[test]
fn zero_timeout_is_rejected() {
    let file = write_config("[playback]\nload_timeout = \"0s\"\n", ".toml");
    let err = ConfigLoader::new()
        .with_config_path(file.path())
        .without_env_file()
        .load_with_env(EnvConfig::default(), false)
        .expect_err("zero timeout");
    assert!(matches!(
        err,
        ConfigLoadError::GuardRail(ConfigGuardRailError::ZeroDuration {
            field: "playback.load_timeout"
        })
    ));
}

#[test]
fn volume_out_of_range_is_rejected() {
    let file = write_config("[playback]\nvolume = 1.5\n", ".toml");
    let err = ConfigLoader::new()
        .with_config_path(file.path())
        .without_env_file()
        .load_with_env(EnvConfig::default(), false)
        .expect_err("volume");
    assert!(matches!(
        err,
        ConfigLoadError::GuardRail(
            ConfigGuardRailError::VolumeOutOfRange { .. }
        )
    ));
}

#[test]
fn zero_report_interval_is_rejected() {
    let file =
        write_config("[progress]\nreport_interval_secs = 0\n", ".toml");
    let err = ConfigLoader::new()
        .with_config_path(file.path())
        .without_env_file()
        .load_with_env(EnvConfig::default(), false)
        .expect_err("interval");
    assert!(matches!(
        err,
        ConfigLoadError::GuardRail(
            ConfigGuardRailError::ReportIntervalNotPositive
        )
    ));
}

#[test]
fn unknown_quality_is_a_field_error() {
    let file =
        write_config("[playback]\npreferred_quality = \"4k\"\n", ".toml");
    let err = ConfigLoader::new()
        .with_config_path(file.path())
        .without_env_file()
        .load_with_env(EnvConfig::default(), false)
        .expect_err("quality");
    assert!(matches!(
        err,
        ConfigLoadError::InvalidField {
            field: "playback.preferred_quality",
            ..
        }
    ));
}

#[test]
fn malformed_toml_reports_parse_error() {
    let file = write_config("[playback\nvolume = ", ".toml");
    let err = ConfigLoader::new()
        .with_config_path(file.path())
        .without_env_file()
        .load_with_env(EnvConfig::default(), false)
        .expect_err("parse");
    assert!(matches!(err, ConfigLoadError::Parse { .. }));
}
