//! Trait surfaces that describe the collaborators of a playback session.
//!
//! A session talks to exactly three outside parties: the catalog that knows
//! which renditions and subtitles an episode has, the history service that
//! stores watch progress, and a media engine that renders to a surface. Each
//! one is a trait here so the controller never couples to a concrete engine
//! or HTTP stack.

pub mod catalog;
pub mod engine;
pub mod history;

pub use catalog::{CatalogError, EpisodeCatalog};
pub use engine::{
    EngineError, EngineEvent, EngineEventReceiver, EngineEventSender,
    EngineFactory, PlaybackEngine, SurfaceHandle, engine_event_channel,
};
pub use history::{HistoryError, HistorySink};

#[cfg(feature = "mock")]
pub use catalog::MockEpisodeCatalog;
#[cfg(feature = "mock")]
pub use history::MockHistorySink;

/// Frequently used trait combinators for orchestration crates.
pub mod prelude {
    pub use super::catalog::{CatalogError, EpisodeCatalog};
    pub use super::engine::{
        EngineError, EngineEvent, EngineFactory, PlaybackEngine,
        SurfaceHandle,
    };
    pub use super::history::{HistoryError, HistorySink};
    pub use showreel_model::prelude::*;
}
