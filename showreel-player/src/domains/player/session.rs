//! Public surface of a playback session
//!
//! [`SessionController::spawn`] starts the session task; everything else
//! happens through the returned [`SessionHandle`]. Commands are queued and
//! never block the caller; state is observed through a `watch` snapshot and
//! a `broadcast` event stream.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use showreel_config::{Config, PlaybackSettings, ProgressSettings};
use showreel_contracts::{
    EngineFactory, EpisodeCatalog, HistorySink, SurfaceHandle,
};
use showreel_model::Quality;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use super::controller::SessionActor;
use super::messages::{SessionCommand, SessionEvent, SessionRequest};
use super::state::{SessionSnapshot, SubtitleChoice};
use crate::infra::api_client::{ApiClient, ApiError};
use crate::infra::constants::player::channels::EVENT_CAPACITY;
use crate::infra::services::{CachedCatalog, HttpCatalog, HttpHistory};

/// Collaborators a session talks to.
#[derive(Clone)]
pub struct SessionDeps {
    pub catalog: Arc<dyn EpisodeCatalog>,
    pub history: Arc<dyn HistorySink>,
    pub engines: Arc<dyn EngineFactory>,
}

impl fmt::Debug for SessionDeps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionDeps").finish_non_exhaustive()
    }
}

impl SessionDeps {
    pub fn new(
        catalog: Arc<dyn EpisodeCatalog>,
        history: Arc<dyn HistorySink>,
        engines: Arc<dyn EngineFactory>,
    ) -> Self {
        Self {
            catalog,
            history,
            engines,
        }
    }

    /// REST collaborators from configuration, with the optional media cache.
    pub fn from_config(
        config: &Config,
        engines: Arc<dyn EngineFactory>,
    ) -> Result<Self, ApiError> {
        let client = ApiClient::new(&config.server)?;
        let http_catalog = Arc::new(HttpCatalog::new(client.clone()));
        let catalog: Arc<dyn EpisodeCatalog> = if config.playback.cache_media {
            Arc::new(CachedCatalog::new(http_catalog))
        } else {
            http_catalog
        };
        Ok(Self {
            catalog,
            history: Arc::new(HttpHistory::new(client)),
            engines,
        })
    }
}

/// Tunables for one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSettings {
    pub playback: PlaybackSettings,
    pub progress: ProgressSettings,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            playback: config.playback.clone(),
            progress: config.progress,
        }
    }
}

#[derive(Debug)]
pub struct SessionController;

impl SessionController {
    /// Start a session task bound to `surface`. Must be called inside a
    /// tokio runtime.
    pub fn spawn(
        deps: SessionDeps,
        settings: SessionSettings,
        surface: SurfaceHandle,
    ) -> SessionHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let initial = SessionSnapshot {
            volume: settings.playback.volume,
            ..SessionSnapshot::default()
        };
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let actor = SessionActor::new(
            deps,
            settings,
            surface,
            command_rx,
            snapshot_tx,
            event_tx.clone(),
        );
        tokio::spawn(actor.run());

        SessionHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            events: event_tx,
        }
    }
}

/// Cloneable control surface of a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    fn send(&self, command: SessionCommand) {
        if let Err(err) = self.commands.send(command) {
            log::debug!("[Session] dropped {:?}: session task gone", err.0);
        }
    }

    /// Load an episode. Replaying this after an error is the retry path: the
    /// failed engine is torn down first and `Destroyed` is published before
    /// `Loading`.
    pub fn initialize(&self, request: SessionRequest) {
        self.send(SessionCommand::Initialize(request));
    }

    pub fn request_quality(&self, quality: Quality) {
        self.send(SessionCommand::RequestQuality(quality));
    }

    pub fn request_subtitle(&self, choice: SubtitleChoice) {
        self.send(SessionCommand::RequestSubtitle(choice));
    }

    pub fn toggle_play_pause(&self) {
        self.send(SessionCommand::TogglePlayPause);
    }

    pub fn play(&self) {
        self.send(SessionCommand::Play);
    }

    pub fn pause(&self) {
        self.send(SessionCommand::Pause);
    }

    pub fn seek_to(&self, position: Duration) {
        self.send(SessionCommand::SeekTo(position));
    }

    /// Seek by signed seconds from the current position
    pub fn seek_relative(&self, seconds: f64) {
        self.send(SessionCommand::SeekRelative(seconds));
    }

    pub fn set_volume(&self, volume: f32) {
        self.send(SessionCommand::SetVolume(volume));
    }

    pub fn adjust_volume(&self, delta: f32) {
        self.send(SessionCommand::AdjustVolume(delta));
    }

    pub fn toggle_mute(&self) {
        self.send(SessionCommand::ToggleMute);
    }

    pub fn set_playback_rate(&self, rate: f32) {
        self.send(SessionCommand::SetPlaybackRate(rate));
    }

    pub fn toggle_subtitles(&self) {
        self.send(SessionCommand::ToggleSubtitles);
    }

    pub fn next_episode(&self) {
        self.send(SessionCommand::NextEpisode);
    }

    pub fn previous_episode(&self) {
        self.send(SessionCommand::PreviousEpisode);
    }

    /// Tear the engine down and stop all timers. Resolves once the engine
    /// `destroy` completed. Calling it again is a no-op.
    pub async fn destroy(&self) {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.commands.send(SessionCommand::Destroy(reply_tx)).is_err() {
            return;
        }
        let _ = reply_rx.await;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Wait for the first snapshot matching `predicate`. `None` once the
    /// session task has exited without producing one.
    pub async fn wait_until<F>(&self, mut predicate: F) -> Option<SessionSnapshot>
    where
        F: FnMut(&SessionSnapshot) -> bool,
    {
        let mut snapshots = self.snapshots.clone();
        snapshots
            .wait_for(|snapshot| predicate(snapshot))
            .await
            .ok()
            .map(|snapshot| snapshot.clone())
    }
}
