pub mod error;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, anyhow};
use showreel_model::Quality;
use url::Url;

use crate::constants::{
    DEFAULT_FETCH_TIMEOUT, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_LOAD_TIMEOUT,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_SERVER_URL,
};
use crate::models::{
    Config, ConfigMetadata, ControlSettings, PlaybackSettings,
    ProgressSettings, ServerConfig,
    sources::{EnvConfig, FileConfig},
};
use crate::util::parse_duration;
use crate::validation::{self, ConfigWarnings};
use error::ConfigLoadError;

const DEFAULT_CONFIG_LOCATIONS: [&str; 2] =
    ["showreel.toml", "config/showreel.toml"];

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    /// Skip `.env` discovery entirely
    pub skip_env_file: bool,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn without_env_file(mut self) -> Self {
        self.options.skip_env_file = true;
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = self.load_env_file()?;
        let env_config = EnvConfig::gather()?;
        self.load_with_env(env_config, env_file_loaded)
    }

    /// Compose a configuration from explicit environment values without
    /// touching the process environment.
    pub fn load_with_env(
        &self,
        env_config: EnvConfig,
        env_file_loaded: bool,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env_config)?;

        let mut warnings = ConfigWarnings::default();
        if config_path.is_none() {
            warnings.push_with_hint(
                "No showreel.toml detected; using defaults and environment",
                "Set SHOWREEL_CONFIG_PATH to point at a configuration file",
            );
        }

        let config = compose_config(
            file_config.unwrap_or_default(),
            env_config,
            ConfigMetadata {
                config_path,
                env_file_loaded,
            },
        )?;

        warnings.extend(validation::apply_guard_rails(&config)?);
        for warning in warnings.iter() {
            log::warn!("[Config] {warning}");
        }

        Ok(ConfigLoad { config, warnings })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        if self.options.skip_env_file {
            return Ok(false);
        }
        let loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true),
            None => dotenvy::dotenv().map(|_| true),
        };
        match loaded {
            Ok(found) => Ok(found),
            Err(dotenvy::Error::Io(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env_config.config_path.clone());

        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigLoadError::MissingConfig { path });
                }
                path
            }
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
            {
                Some(path) => path,
                None => return Ok((None, None)),
            },
        };

        let contents = fs::read_to_string(&path).map_err(|source| {
            ConfigLoadError::Io {
                path: path.clone(),
                source,
            }
        })?;
        let file_config =
            parse_file_config(&path, &contents).map_err(|source| {
                ConfigLoadError::Parse {
                    path: path.clone(),
                    source,
                }
            })?;

        log::debug!("[Config] loaded {}", path.display());
        Ok((Some(file_config), Some(path)))
    }
}

fn parse_file_config(path: &Path, contents: &str) -> anyhow::Result<FileConfig> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(contents)
            .with_context(|| format!("invalid JSON in {}", path.display())),
        _ => toml::from_str(contents).map_err(|err| {
            anyhow!("invalid TOML in {}: {}", path.display(), err)
        }),
    }
}

fn compose_config(
    file: FileConfig,
    env: EnvConfig,
    metadata: ConfigMetadata,
) -> Result<Config, ConfigLoadError> {
    let FileConfig {
        server: file_server,
        playback: file_playback,
        progress: file_progress,
        controls: file_controls,
    } = file;

    let raw_url = env
        .server_url
        .clone()
        .or(file_server.base_url)
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
    let base_url = Url::parse(raw_url.trim()).map_err(|source| {
        ConfigLoadError::InvalidServerUrl {
            value: raw_url.clone(),
            source,
        }
    })?;

    let server = ServerConfig {
        base_url,
        request_timeout: file_duration(
            "server.request_timeout",
            file_server.request_timeout,
        )?
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        auth_token: env
            .auth_token
            .clone()
            .or(file_server.auth_token)
            .filter(|token| !token.trim().is_empty()),
    };

    let preferred_quality = match env
        .preferred_quality
        .clone()
        .or(file_playback.preferred_quality)
    {
        Some(raw) => Some(raw.parse::<Quality>().map_err(|err| {
            ConfigLoadError::InvalidField {
                field: "playback.preferred_quality",
                source: anyhow!(err.to_string()),
            }
        })?),
        None => None,
    };

    let defaults = PlaybackSettings::default();
    let playback = PlaybackSettings {
        fetch_timeout: match env.fetch_timeout {
            Some(value) => value,
            None => file_duration(
                "playback.fetch_timeout",
                file_playback.fetch_timeout,
            )?
            .unwrap_or(DEFAULT_FETCH_TIMEOUT),
        },
        load_timeout: match env.load_timeout {
            Some(value) => value,
            None => file_duration(
                "playback.load_timeout",
                file_playback.load_timeout,
            )?
            .unwrap_or(DEFAULT_LOAD_TIMEOUT),
        },
        preferred_quality,
        preferred_subtitle_languages: env
            .subtitle_languages
            .clone()
            .or(file_playback.preferred_subtitle_languages)
            .unwrap_or(defaults.preferred_subtitle_languages),
        autoplay: env
            .autoplay
            .or(file_playback.autoplay)
            .unwrap_or(defaults.autoplay),
        auto_advance: env
            .auto_advance
            .or(file_playback.auto_advance)
            .unwrap_or(defaults.auto_advance),
        heartbeat_interval: file_duration(
            "playback.heartbeat_interval",
            file_playback.heartbeat_interval,
        )?
        .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL),
        volume: file_playback.volume.unwrap_or(defaults.volume),
        cache_media: file_playback.cache_media.unwrap_or(defaults.cache_media),
    };

    let progress_defaults = ProgressSettings::default();
    let progress = ProgressSettings {
        report_interval_secs: file_progress
            .report_interval_secs
            .unwrap_or(progress_defaults.report_interval_secs),
        min_position_secs: file_progress
            .min_position_secs
            .unwrap_or(progress_defaults.min_position_secs),
    };

    let control_defaults = ControlSettings::default();
    let controls = ControlSettings {
        seek_step_secs: file_controls
            .seek_step_secs
            .unwrap_or(control_defaults.seek_step_secs),
        volume_step: file_controls
            .volume_step
            .unwrap_or(control_defaults.volume_step),
    };

    Ok(Config {
        server,
        playback,
        progress,
        controls,
        metadata,
    })
}

fn file_duration(
    field: &'static str,
    raw: Option<String>,
) -> Result<Option<Duration>, ConfigLoadError> {
    raw.map(|value| parse_duration(&value))
        .transpose()
        .map_err(|source| ConfigLoadError::InvalidField { field, source })
}
