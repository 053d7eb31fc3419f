//! Playback engine abstraction
//!
//! A concrete engine (native HLS player, custom demuxer, browser bridge)
//! renders one episode onto one surface. The session controller owns the
//! engine's lifecycle and is the only caller of these methods.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use showreel_model::{Rendition, SubtitleTrack};
use thiserror::Error;
use tokio::sync::mpsc;

/// Unified error type for engine operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("failed to attach to surface: {0}")]
    Attach(String),

    #[error("network failure while loading: {0}")]
    Network(String),

    #[error("decode failure: {0}")]
    Decode(String),

    #[error("unsupported content: {0}")]
    Unsupported(String),

    #[error("engine is not attached to a surface")]
    Detached,

    #[error("engine has been destroyed")]
    Destroyed,
}

/// Notifications pushed by an engine instance.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Content position advanced
    TimeUpdate(Duration),
    /// End of stream reached
    Ended,
    /// Unrecoverable internal failure
    Error(String),
}

pub type EngineEventSender = mpsc::UnboundedSender<EngineEvent>;
pub type EngineEventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

/// Create the listener pair handed to [`PlaybackEngine::subscribe`].
pub fn engine_event_channel() -> (EngineEventSender, EngineEventReceiver) {
    mpsc::unbounded_channel()
}

/// Opaque token identifying the video output an engine renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub u64);

impl fmt::Display for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// One media engine instance bound to at most one surface.
///
/// The async methods are suspension points; the controller never issues a
/// `load` while another `load` or `destroy` on the same instance is pending.
/// Quality switching is a full `load` of another rendition URL, so position
/// and play state are captured and restored by the caller around it.
#[async_trait]
pub trait PlaybackEngine: Send + Sync + fmt::Debug {
    /// Bind to a rendering surface. Only valid on a fresh instance.
    async fn attach(&self, surface: SurfaceHandle) -> Result<(), EngineError>;

    /// Replace the current content with `rendition`.
    async fn load(&self, rendition: &Rendition) -> Result<(), EngineError>;

    async fn add_subtitle_track(
        &self,
        track: &SubtitleTrack,
    ) -> Result<(), EngineError>;

    /// Release every resource. A second call is a no-op.
    async fn destroy(&self);

    fn set_subtitle_visibility(&self, visible: bool, language: Option<&str>);

    fn seek(&self, position: Duration);

    fn play(&self);

    fn pause(&self);

    fn paused(&self) -> bool;

    /// Linear volume in `0.0..=1.0`
    fn set_volume(&self, volume: f32);

    fn set_muted(&self, muted: bool);

    fn set_playback_rate(&self, rate: f32);

    fn position(&self) -> Duration;

    /// `None` until the content duration is known
    fn duration(&self) -> Option<Duration>;

    /// Route time-update, end and error notifications to `listener`.
    ///
    /// Replaces any previous listener. Engines stop emitting once the
    /// receiving half is dropped.
    fn subscribe(&self, listener: EngineEventSender);
}

/// Builds a fresh engine per episode identity.
pub trait EngineFactory: Send + Sync {
    fn create(&self) -> Arc<dyn PlaybackEngine>;
}

impl<F> EngineFactory for F
where
    F: Fn() -> Arc<dyn PlaybackEngine> + Send + Sync,
{
    fn create(&self) -> Arc<dyn PlaybackEngine> {
        self()
    }
}
