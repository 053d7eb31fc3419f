//! Configuration library for the Showreel player.
//!
//! Values are merged from built-in defaults, an optional `showreel.toml`
//! (or JSON) file, a `.env` file and the process environment, in increasing
//! order of precedence, then checked by the guard rails in [`validation`].

pub mod constants;
pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{
    ConfigLoad, ConfigLoader, ConfigLoaderOptions, error::ConfigLoadError,
};
pub use models::{
    Config, ConfigMetadata, ControlSettings, PlaybackSettings,
    ProgressSettings, ServerConfig,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
