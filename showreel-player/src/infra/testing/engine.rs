//! Recording fake engine
//!
//! Every instance created by one [`FakeEngineFactory`] writes into a shared
//! journal, so tests can assert on call order across engine instances (for
//! example that the old engine's `destroy` completed before the next
//! `attach`). Async calls sleep on the tokio clock; run tests with a paused
//! clock to make them deterministic.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use showreel_contracts::{
    EngineError, EngineEvent, EngineEventSender, EngineFactory,
    PlaybackEngine, SurfaceHandle,
};
use showreel_model::{Quality, Rendition, SubtitleTrack};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Attach(SurfaceHandle),
    Load { url: String, quality: Quality },
    AddSubtitle(String),
    /// Recorded when teardown completes
    Destroy,
    SetSubtitleVisibility { visible: bool, language: Option<String> },
    Seek(Duration),
    Play,
    Pause,
    SetVolume(f32),
    SetMuted(bool),
    SetPlaybackRate(f32),
}

/// One journal line: which instance did what.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineRecord {
    pub engine: usize,
    pub call: EngineCall,
}

#[derive(Debug, Clone)]
pub struct FakeEngineBehavior {
    pub attach_delay: Duration,
    pub load_delay: Duration,
    pub destroy_delay: Duration,
    /// Reported once a load succeeded
    pub duration: Option<Duration>,
    /// Loads of these URLs fail with a network error
    pub failing_urls: HashSet<String>,
    /// Every `attach` is rejected by the surface
    pub reject_attach: bool,
}

impl Default for FakeEngineBehavior {
    fn default() -> Self {
        Self {
            attach_delay: Duration::from_millis(5),
            load_delay: Duration::from_millis(50),
            destroy_delay: Duration::from_millis(20),
            duration: Some(Duration::from_secs(1440)),
            failing_urls: HashSet::new(),
            reject_attach: false,
        }
    }
}

#[derive(Debug, Default)]
struct Lab {
    behavior: FakeEngineBehavior,
    journal: Vec<EngineRecord>,
    engines: Vec<Arc<FakeEngine>>,
    loads_in_flight: usize,
    max_loads_in_flight: usize,
    live: usize,
    max_live: usize,
}

/// Builds [`FakeEngine`]s that share one journal and behavior.
#[derive(Debug, Clone, Default)]
pub struct FakeEngineFactory {
    lab: Arc<Mutex<Lab>>,
}

impl FakeEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: FakeEngineBehavior) -> Self {
        let factory = Self::default();
        factory.lab.lock().behavior = behavior;
        factory
    }

    pub fn set_load_delay(&self, delay: Duration) {
        self.lab.lock().behavior.load_delay = delay;
    }

    pub fn set_attach_delay(&self, delay: Duration) {
        self.lab.lock().behavior.attach_delay = delay;
    }

    pub fn reject_attach(&self, reject: bool) {
        self.lab.lock().behavior.reject_attach = reject;
    }

    pub fn set_duration(&self, duration: Option<Duration>) {
        self.lab.lock().behavior.duration = duration;
    }

    pub fn fail_url(&self, url: impl Into<String>) {
        self.lab.lock().behavior.failing_urls.insert(url.into());
    }

    pub fn heal_url(&self, url: &str) {
        self.lab.lock().behavior.failing_urls.remove(url);
    }

    pub fn journal(&self) -> Vec<EngineRecord> {
        self.lab.lock().journal.clone()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.journal().into_iter().map(|record| record.call).collect()
    }

    pub fn calls_for(&self, engine: usize) -> Vec<EngineCall> {
        self.journal()
            .into_iter()
            .filter(|record| record.engine == engine)
            .map(|record| record.call)
            .collect()
    }

    /// URLs passed to `load`, in order, across all instances
    pub fn loaded_urls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Load { url, .. } => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn created(&self) -> usize {
        self.lab.lock().engines.len()
    }

    pub fn engine(&self, index: usize) -> Option<Arc<FakeEngine>> {
        self.lab.lock().engines.get(index).cloned()
    }

    pub fn latest(&self) -> Option<Arc<FakeEngine>> {
        self.lab.lock().engines.last().cloned()
    }

    /// Highest number of loads ever in flight at the same time
    pub fn max_concurrent_loads(&self) -> usize {
        self.lab.lock().max_loads_in_flight
    }

    /// Highest number of attached, not yet destroyed engines at once
    pub fn max_live_engines(&self) -> usize {
        self.lab.lock().max_live
    }

    pub fn live_engines(&self) -> usize {
        self.lab.lock().live
    }

    pub fn clear_journal(&self) {
        self.lab.lock().journal.clear();
    }
}

impl EngineFactory for FakeEngineFactory {
    fn create(&self) -> Arc<dyn PlaybackEngine> {
        let mut lab = self.lab.lock();
        let engine = Arc::new(FakeEngine {
            index: lab.engines.len(),
            lab: Arc::clone(&self.lab),
            state: Mutex::new(EngineState::default()),
        });
        lab.engines.push(Arc::clone(&engine));
        engine
    }
}

#[derive(Debug)]
struct EngineState {
    attached: bool,
    destroyed: bool,
    loaded: Option<Rendition>,
    paused: bool,
    position: Duration,
    duration: Option<Duration>,
    volume: f32,
    muted: bool,
    rate: f32,
    listener: Option<EngineEventSender>,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            attached: false,
            destroyed: false,
            loaded: None,
            paused: true,
            position: Duration::ZERO,
            duration: None,
            volume: 1.0,
            muted: false,
            rate: 1.0,
            listener: None,
        }
    }
}

pub struct FakeEngine {
    index: usize,
    lab: Arc<Mutex<Lab>>,
    state: Mutex<EngineState>,
}

impl std::fmt::Debug for FakeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeEngine")
            .field("index", &self.index)
            .field("state", &self.state)
            .finish()
    }
}

impl FakeEngine {
    pub fn index(&self) -> usize {
        self.index
    }

    fn record(&self, call: EngineCall) {
        self.lab.lock().journal.push(EngineRecord {
            engine: self.index,
            call,
        });
    }

    fn behavior(&self) -> FakeEngineBehavior {
        self.lab.lock().behavior.clone()
    }

    fn send(&self, event: EngineEvent) {
        let state = self.state.lock();
        if state.destroyed {
            return;
        }
        if let Some(listener) = &state.listener {
            let _ = listener.send(event);
        }
    }

    /// Move the playhead and report it, as a running engine would.
    pub fn emit_time(&self, position: Duration) {
        self.state.lock().position = position;
        self.send(EngineEvent::TimeUpdate(position));
    }

    pub fn emit_ended(&self) {
        {
            let mut state = self.state.lock();
            if let Some(duration) = state.duration {
                state.position = duration;
            }
            state.paused = true;
        }
        self.send(EngineEvent::Ended);
    }

    pub fn emit_error(&self, message: impl Into<String>) {
        self.send(EngineEvent::Error(message.into()));
    }

    /// Move the playhead without notifying, like a paused-tab timer gap.
    pub fn set_position_silently(&self, position: Duration) {
        self.state.lock().position = position;
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.lock().destroyed
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    pub fn loaded_url(&self) -> Option<String> {
        self.state.lock().loaded.as_ref().map(|r| r.url.clone())
    }

    pub fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    pub fn muted(&self) -> bool {
        self.state.lock().muted
    }

    pub fn playback_rate(&self) -> f32 {
        self.state.lock().rate
    }
}

#[async_trait]
impl PlaybackEngine for FakeEngine {
    async fn attach(&self, surface: SurfaceHandle) -> Result<(), EngineError> {
        let behavior = self.behavior();
        tokio::time::sleep(behavior.attach_delay).await;
        if behavior.reject_attach {
            return Err(EngineError::Attach(format!("{surface} is gone")));
        }
        {
            let mut state = self.state.lock();
            if state.destroyed {
                return Err(EngineError::Destroyed);
            }
            if state.attached {
                return Err(EngineError::Attach(format!(
                    "already attached when asked for {surface}"
                )));
            }
            state.attached = true;
        }
        {
            let mut lab = self.lab.lock();
            lab.live += 1;
            lab.max_live = lab.max_live.max(lab.live);
        }
        self.record(EngineCall::Attach(surface));
        Ok(())
    }

    async fn load(&self, rendition: &Rendition) -> Result<(), EngineError> {
        self.record(EngineCall::Load {
            url: rendition.url.clone(),
            quality: rendition.quality,
        });
        let behavior = {
            let mut lab = self.lab.lock();
            lab.loads_in_flight += 1;
            lab.max_loads_in_flight =
                lab.max_loads_in_flight.max(lab.loads_in_flight);
            lab.behavior.clone()
        };

        tokio::time::sleep(behavior.load_delay).await;
        self.lab.lock().loads_in_flight -= 1;

        let mut state = self.state.lock();
        if state.destroyed {
            return Err(EngineError::Destroyed);
        }
        if !state.attached {
            return Err(EngineError::Detached);
        }
        // A fresh load resets the element
        state.position = Duration::ZERO;
        state.paused = true;
        if behavior.failing_urls.contains(&rendition.url) {
            state.loaded = None;
            return Err(EngineError::Network(format!(
                "{} unreachable",
                rendition.url
            )));
        }
        state.loaded = Some(rendition.clone());
        state.duration = behavior.duration;
        Ok(())
    }

    async fn add_subtitle_track(
        &self,
        track: &SubtitleTrack,
    ) -> Result<(), EngineError> {
        self.record(EngineCall::AddSubtitle(track.language_code.clone()));
        Ok(())
    }

    async fn destroy(&self) {
        if self.state.lock().destroyed {
            return;
        }
        tokio::time::sleep(self.behavior().destroy_delay).await;
        let was_attached = {
            let mut state = self.state.lock();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            state.listener = None;
            state.paused = true;
            std::mem::replace(&mut state.attached, false)
        };
        if was_attached {
            self.lab.lock().live -= 1;
        }
        self.record(EngineCall::Destroy);
    }

    fn set_subtitle_visibility(&self, visible: bool, language: Option<&str>) {
        self.record(EngineCall::SetSubtitleVisibility {
            visible,
            language: language.map(str::to_string),
        });
    }

    fn seek(&self, position: Duration) {
        self.state.lock().position = position;
        self.record(EngineCall::Seek(position));
    }

    fn play(&self) {
        self.state.lock().paused = false;
        self.record(EngineCall::Play);
    }

    fn pause(&self) {
        self.state.lock().paused = true;
        self.record(EngineCall::Pause);
    }

    fn paused(&self) -> bool {
        self.state.lock().paused
    }

    fn set_volume(&self, volume: f32) {
        self.state.lock().volume = volume;
        self.record(EngineCall::SetVolume(volume));
    }

    fn set_muted(&self, muted: bool) {
        self.state.lock().muted = muted;
        self.record(EngineCall::SetMuted(muted));
    }

    fn set_playback_rate(&self, rate: f32) {
        self.state.lock().rate = rate;
        self.record(EngineCall::SetPlaybackRate(rate));
    }

    fn position(&self) -> Duration {
        self.state.lock().position
    }

    fn duration(&self) -> Option<Duration> {
        self.state.lock().duration
    }

    fn subscribe(&self, listener: EngineEventSender) {
        self.state.lock().listener = Some(listener);
    }
}
