//! Session state machine
//!
//! A single task owns all session state. It reacts to four inputs: queued
//! commands, completion of the one in-flight operation, events from the
//! mounted engine and the heartbeat timer. After each input `advance` compares
//! what the session wants (episode, quality, teardown) with what the engine
//! has and starts the next operation. At most one operation runs at a time,
//! which keeps engine calls on one instance strictly serialized.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use showreel_contracts::{
    EngineEvent, EngineEventReceiver, PlaybackEngine, SurfaceHandle,
    engine_event_channel,
};
use showreel_model::{
    EpisodeId, EpisodeMedia, EpisodePlaylist, ProgressRecord, Quality,
    VideoSummary,
};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::messages::{SessionCommand, SessionEvent, SessionRequest};
use super::ops::{self, FetchedEpisode, OpOutcome};
use super::progress::ProgressReporter;
use super::session::{SessionDeps, SessionSettings};
use super::state::{PlaybackError, SessionSnapshot, SessionState, SubtitleChoice};
use crate::infra::constants::player::playback::{
    DEFAULT_PLAYBACK_RATE, MAX_PLAYBACK_RATE, MIN_PLAYBACK_RATE,
};
use crate::infra::constants::player::seeking::END_GUARD_SECS;

/// Episode the session is working towards.
struct Target {
    request: SessionRequest,
}

/// Engine instance currently bound to the surface.
struct MountedEngine {
    engine: Arc<dyn PlaybackEngine>,
    episode: EpisodeId,
    /// Quality whose load last succeeded on this instance
    loaded: Option<Quality>,
    /// Scheduled for teardown before anything else happens
    retired: bool,
}

/// Position and play state to restore after the next successful load.
#[derive(Debug, Clone, Copy)]
struct ResumePoint {
    position: Duration,
    playing: bool,
}

pub(crate) struct SessionActor {
    deps: SessionDeps,
    settings: SessionSettings,
    surface: SurfaceHandle,

    commands: mpsc::UnboundedReceiver<SessionCommand>,
    snapshots: watch::Sender<SessionSnapshot>,
    events: broadcast::Sender<SessionEvent>,
    history: mpsc::UnboundedSender<ProgressRecord>,

    state: SessionState,
    /// Bumped on every initialize/destroy; older operation results are stale
    generation: u64,
    target: Option<Target>,
    media: Option<EpisodeMedia>,
    playlist: Option<EpisodePlaylist>,
    video: Option<VideoSummary>,

    engine: Option<MountedEngine>,
    engine_events: Option<EngineEventReceiver>,
    op: Option<BoxFuture<'static, OpOutcome>>,
    /// The in-flight op touches no engine and may simply be dropped
    op_droppable: bool,

    desired_quality: Option<Quality>,
    last_good_quality: Option<Quality>,
    resume: Option<ResumePoint>,
    subtitle: SubtitleChoice,
    /// Explicit viewer choice, carried to later episodes
    subtitle_override: Option<SubtitleChoice>,
    last_subtitle_language: Option<String>,

    playing: bool,
    position: Duration,
    duration: Option<Duration>,
    volume: f32,
    muted: bool,
    rate: f32,

    reporter: ProgressReporter,
    heartbeat: Interval,
    destroy_pending: bool,
    destroy_waiters: Vec<oneshot::Sender<()>>,
}

impl SessionActor {
    pub(crate) fn new(
        deps: SessionDeps,
        settings: SessionSettings,
        surface: SurfaceHandle,
        commands: mpsc::UnboundedReceiver<SessionCommand>,
        snapshots: watch::Sender<SessionSnapshot>,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        // interval_at panics on a zero period
        let period = settings
            .playback
            .heartbeat_interval
            .max(Duration::from_millis(100));
        let mut heartbeat =
            tokio::time::interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let history = spawn_history_writer(deps.history.clone());

        Self {
            reporter: ProgressReporter::new(settings.progress),
            volume: settings.playback.volume.clamp(0.0, 1.0),
            deps,
            settings,
            surface,
            commands,
            snapshots,
            events,
            history,
            state: SessionState::Idle,
            generation: 0,
            target: None,
            media: None,
            playlist: None,
            video: None,
            engine: None,
            engine_events: None,
            op: None,
            op_droppable: false,
            desired_quality: None,
            last_good_quality: None,
            resume: None,
            subtitle: SubtitleChoice::Off,
            subtitle_override: None,
            last_subtitle_language: None,
            playing: false,
            position: Duration::ZERO,
            duration: None,
            muted: false,
            rate: DEFAULT_PLAYBACK_RATE,
            heartbeat,
            destroy_pending: false,
            destroy_waiters: Vec::new(),
        }
    }

    pub(crate) async fn run(mut self) {
        log::debug!("[Session] controller started on {}", self.surface);

        loop {
            let heartbeat_armed = self.state == SessionState::Ready
                && self.playing
                && self.engine.is_some();

            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                outcome = next_outcome(&mut self.op) => {
                    self.op = None;
                    self.op_droppable = false;
                    self.handle_outcome(outcome);
                }
                event = next_engine_event(&mut self.engine_events) => {
                    match event {
                        Some(event) => self.handle_engine_event(event),
                        None => self.engine_events = None,
                    }
                }
                _ = self.heartbeat.tick(), if heartbeat_armed => {
                    self.on_heartbeat();
                }
            }

            self.advance();
            self.publish();
        }

        self.shutdown().await;
    }

    // ===== Commands =====

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Initialize(request) => self.initialize(request),
            SessionCommand::RequestQuality(quality) => {
                self.request_quality(quality)
            }
            SessionCommand::RequestSubtitle(choice) => {
                self.request_subtitle(choice)
            }
            SessionCommand::TogglePlayPause => {
                let playing = match self.state {
                    SessionState::Ready => self
                        .mounted_engine()
                        .map(|engine| !engine.paused())
                        .unwrap_or(self.playing),
                    SessionState::Loading | SessionState::Switching => self
                        .resume
                        .map(|resume| resume.playing)
                        .unwrap_or(self.playing),
                    _ => false,
                };
                self.set_playing(!playing);
            }
            SessionCommand::Play => self.set_playing(true),
            SessionCommand::Pause => self.set_playing(false),
            SessionCommand::SeekTo(position) => self.seek_to(position),
            SessionCommand::SeekRelative(seconds) => {
                let base = match self.state {
                    SessionState::Ready | SessionState::Ended => self
                        .mounted_engine()
                        .map(|engine| engine.position())
                        .unwrap_or(self.position),
                    _ => self
                        .resume
                        .map(|resume| resume.position)
                        .unwrap_or(self.position),
                };
                let target = (base.as_secs_f64() + seconds).max(0.0);
                self.seek_to(Duration::from_secs_f64(target));
            }
            SessionCommand::SetVolume(volume) => self.set_volume(volume),
            SessionCommand::AdjustVolume(delta) => {
                self.set_volume(self.volume + delta)
            }
            SessionCommand::ToggleMute => {
                self.muted = !self.muted;
                if let Some(engine) = self.mounted_engine() {
                    engine.set_muted(self.muted);
                }
            }
            SessionCommand::SetPlaybackRate(rate) => {
                if !rate.is_finite() {
                    return;
                }
                self.rate = rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE);
                if let Some(engine) = self.mounted_engine() {
                    engine.set_playback_rate(self.rate);
                }
            }
            SessionCommand::ToggleSubtitles => self.toggle_subtitles(),
            SessionCommand::NextEpisode => self.jump(true),
            SessionCommand::PreviousEpisode => self.jump(false),
            SessionCommand::Destroy(reply) => {
                self.destroy_waiters.push(reply);
                self.begin_destroy();
            }
        }
    }

    fn initialize(&mut self, request: SessionRequest) {
        log::info!(
            "[Session] initialize episode {} (quality {:?})",
            request.episode_id,
            request.preferred_quality
        );
        self.flush_progress();
        if self.state.is_error() {
            // The failed engine is retired below
            self.set_state(SessionState::Destroyed);
        }

        self.generation += 1;
        self.drop_pending_fetch();
        if let Some(mounted) = self.engine.as_mut() {
            mounted.retired = true;
        }
        self.engine_events = None;
        // Waiters of a superseded destroy are answered once the retired
        // engine is gone
        self.destroy_pending = false;

        self.media = None;
        self.desired_quality = request
            .preferred_quality
            .or(self.settings.playback.preferred_quality);
        self.last_good_quality = None;
        self.resume = Some(ResumePoint {
            position: request.resume_from.unwrap_or(Duration::ZERO),
            playing: self.settings.playback.autoplay,
        });
        self.playing = false;
        self.position = request.resume_from.unwrap_or(Duration::ZERO);
        self.duration = None;
        self.reporter.clear();
        self.target = Some(Target { request });
        self.set_state(SessionState::Loading);
    }

    fn request_quality(&mut self, quality: Quality) {
        if let Some(media) = &self.media
            && !media.has_quality(quality)
        {
            self.notice(format!("{quality} is not available for this episode"));
            return;
        }

        match self.state {
            SessionState::Ready => {
                if self.desired_quality == Some(quality) {
                    return;
                }
                let Some(engine) = self.mounted_engine() else {
                    return;
                };
                // Capture strictly before the reload replaces the content
                self.resume = Some(ResumePoint {
                    position: engine.position(),
                    playing: !engine.paused(),
                });
                log::info!(
                    "[Session] switching {:?} -> {quality}",
                    self.desired_quality
                );
                self.desired_quality = Some(quality);
                self.set_state(SessionState::Switching);
            }
            SessionState::Switching | SessionState::Loading => {
                log::debug!("[Session] quality {quality} supersedes pending");
                self.desired_quality = Some(quality);
            }
            _ => {
                log::debug!(
                    "[Session] quality request ignored in {}",
                    self.state
                );
            }
        }
    }

    fn request_subtitle(&mut self, choice: SubtitleChoice) {
        let resolved = match choice {
            SubtitleChoice::Language(language) => {
                let track = self
                    .media
                    .as_ref()
                    .map(|media| media.subtitle(&language));
                match track {
                    // Media not known yet; resolved once it arrives
                    None => SubtitleChoice::Language(language),
                    Some(Some(track)) => {
                        SubtitleChoice::Language(track.language_code.clone())
                    }
                    Some(None) => {
                        self.notice(format!(
                            "No {language} subtitles for this episode"
                        ));
                        return;
                    }
                }
            }
            SubtitleChoice::Off => SubtitleChoice::Off,
        };
        self.subtitle_override = Some(resolved.clone());
        self.select_subtitle(resolved);
    }

    fn toggle_subtitles(&mut self) {
        match self.subtitle.clone() {
            SubtitleChoice::Language(language) => {
                self.last_subtitle_language = Some(language);
                self.subtitle_override = Some(SubtitleChoice::Off);
                self.select_subtitle(SubtitleChoice::Off);
            }
            SubtitleChoice::Off => {
                let Some(media) = &self.media else {
                    return;
                };
                let track = self
                    .last_subtitle_language
                    .as_deref()
                    .and_then(|language| media.subtitle(language))
                    .or_else(|| {
                        media.preferred_subtitle(
                            &self.settings.playback.preferred_subtitle_languages,
                        )
                    })
                    .or_else(|| media.subtitles.first());
                match track.map(|track| track.language_code.clone()) {
                    Some(language) => {
                        let choice = SubtitleChoice::Language(language);
                        self.subtitle_override = Some(choice.clone());
                        self.select_subtitle(choice);
                    }
                    None => self.notice("No subtitles for this episode"),
                }
            }
        }
    }

    fn select_subtitle(&mut self, choice: SubtitleChoice) {
        self.subtitle = choice;
        if let Some(language) = self.subtitle.language() {
            self.last_subtitle_language = Some(language.to_string());
        }
        if self.state == SessionState::Ready
            || self.state == SessionState::Ended
        {
            self.apply_subtitles();
        }
    }

    fn apply_subtitles(&self) {
        if let Some(engine) = self.mounted_engine() {
            let language = self.subtitle.language();
            engine.set_subtitle_visibility(language.is_some(), language);
        }
    }

    fn set_playing(&mut self, playing: bool) {
        match self.state {
            SessionState::Ready => {
                let Some(engine) = self.mounted_engine() else {
                    return;
                };
                if playing {
                    engine.play();
                } else {
                    engine.pause();
                }
                self.playing = playing;
            }
            SessionState::Ended if playing => {
                // Replay from the start
                let Some(engine) = self.mounted_engine() else {
                    return;
                };
                engine.seek(Duration::ZERO);
                engine.play();
                self.position = Duration::ZERO;
                self.playing = true;
                self.set_state(SessionState::Ready);
            }
            SessionState::Loading | SessionState::Switching => {
                if let Some(resume) = self.resume.as_mut() {
                    resume.playing = playing;
                }
            }
            _ => {}
        }
    }

    fn seek_to(&mut self, position: Duration) {
        let position = self.clamp_position(position);
        match self.state {
            SessionState::Ready | SessionState::Ended => {
                let Some(engine) = self.mounted_engine() else {
                    return;
                };
                engine.seek(position);
                self.position = position;
                if self.state == SessionState::Ended {
                    self.playing = false;
                    self.set_state(SessionState::Ready);
                }
            }
            SessionState::Loading | SessionState::Switching => {
                if let Some(resume) = self.resume.as_mut() {
                    resume.position = position;
                }
                self.position = position;
            }
            _ => {}
        }
    }

    fn clamp_position(&self, position: Duration) -> Duration {
        match self.known_duration() {
            Some(duration) if !duration.is_zero() => {
                let limit =
                    (duration.as_secs_f64() - END_GUARD_SECS).max(0.0);
                position.min(Duration::from_secs_f64(limit))
            }
            _ => position,
        }
    }

    fn known_duration(&self) -> Option<Duration> {
        self.mounted_engine()
            .and_then(|engine| engine.duration())
            .or(self.duration)
    }

    fn set_volume(&mut self, volume: f32) {
        if !volume.is_finite() {
            return;
        }
        self.volume = ((volume * 100.0).round() / 100.0).clamp(0.0, 1.0);
        if let Some(engine) = self.mounted_engine() {
            engine.set_volume(self.volume);
        }
    }

    fn jump(&mut self, forward: bool) {
        let (Some(target), Some(playlist)) = (&self.target, &self.playlist)
        else {
            return;
        };
        let current = target.request.episode_id;
        let neighbour = if forward {
            playlist.next_after(current)
        } else {
            playlist.previous_before(current)
        };
        match neighbour.map(|episode| episode.id) {
            Some(episode) => {
                let request = self.follow_up(episode);
                self.initialize(request);
            }
            None if forward => self.notice("This is the last episode"),
            None => self.notice("This is the first episode"),
        }
    }

    /// Request for another episode of the same watch, keeping the viewer and
    /// quality preference.
    fn follow_up(&self, episode: EpisodeId) -> SessionRequest {
        let previous = self.target.as_ref().map(|target| &target.request);
        SessionRequest {
            episode_id: episode,
            user_id: previous.and_then(|request| request.user_id),
            preferred_quality: previous
                .and_then(|request| request.preferred_quality),
            resume_from: None,
        }
    }

    fn drop_pending_fetch(&mut self) {
        if self.op_droppable {
            log::debug!("[Session] abandoning in-flight episode fetch");
            self.op = None;
            self.op_droppable = false;
        }
    }

    fn begin_destroy(&mut self) {
        log::info!("[Session] destroy requested in {}", self.state);
        self.flush_progress();
        self.generation += 1;
        self.drop_pending_fetch();
        self.destroy_pending = true;
        self.target = None;
        self.engine_events = None;
        self.resume = None;
        self.playing = false;
        if let Some(mounted) = self.engine.as_mut() {
            mounted.retired = true;
        }
    }

    // ===== Operation results =====

    fn handle_outcome(&mut self, outcome: OpOutcome) {
        match outcome {
            OpOutcome::Fetched { generation, result } => {
                if generation != self.generation
                    || self.state != SessionState::Loading
                {
                    log::debug!("[Session] stale episode fetch discarded");
                    return;
                }
                match result {
                    Ok(fetched) => self.on_fetched(fetched),
                    Err(err) => self.fail(err),
                }
            }
            OpOutcome::Loaded {
                generation,
                quality,
                result,
            } => self.on_load_settled(generation, quality, result),
            OpOutcome::AttachFailed { generation, error } => {
                if generation != self.generation || !self.state.is_loading() {
                    log::debug!("[Session] stale attach failure discarded");
                    return;
                }
                if let Some(mounted) = self.engine.as_mut() {
                    mounted.retired = true;
                }
                self.engine_events = None;
                self.fail(error);
            }
            OpOutcome::TornDown => {
                log::debug!("[Session] engine torn down");
            }
        }
    }

    fn on_fetched(&mut self, fetched: FetchedEpisode) {
        let FetchedEpisode {
            media,
            playlist,
            video,
        } = fetched;

        if let Some(playlist) = playlist {
            self.playlist = Some(playlist);
            self.video = video;
        }

        let user = self.target.as_ref().and_then(|t| t.request.user_id);
        self.reporter.begin(user, media.video_id, media.episode_id);
        self.duration = media.duration_hint;

        if !media.is_playable() {
            let episode = media.episode_id;
            self.media = Some(media);
            self.fail(PlaybackError::Unplayable(episode));
            return;
        }

        let preferred = self.desired_quality;
        let resolved = media.resolve(preferred).map(|r| r.quality);
        if let Some(quality) = preferred
            && resolved != Some(quality)
        {
            log::info!(
                "[Session] {quality} unavailable for episode {}, using {:?}",
                media.episode_id,
                resolved
            );
        }
        self.desired_quality = resolved;

        let subtitle = match &self.subtitle_override {
            Some(SubtitleChoice::Off) => SubtitleChoice::Off,
            Some(SubtitleChoice::Language(language)) => media
                .subtitle(language)
                .or_else(|| {
                    media.preferred_subtitle(
                        &self.settings.playback.preferred_subtitle_languages,
                    )
                })
                .map(|track| {
                    SubtitleChoice::Language(track.language_code.clone())
                })
                .unwrap_or(SubtitleChoice::Off),
            None => media
                .preferred_subtitle(
                    &self.settings.playback.preferred_subtitle_languages,
                )
                .map(|track| {
                    SubtitleChoice::Language(track.language_code.clone())
                })
                .unwrap_or(SubtitleChoice::Off),
        };
        self.subtitle = subtitle;
        if let Some(language) = self.subtitle.language() {
            self.last_subtitle_language = Some(language.to_string());
        }

        self.media = Some(media);
    }

    fn on_load_settled(
        &mut self,
        generation: u64,
        quality: Quality,
        result: Result<(), PlaybackError>,
    ) {
        if generation != self.generation || !self.state.is_loading() {
            log::debug!("[Session] stale {quality} load discarded");
            return;
        }
        let Some(mounted) = self.engine.as_mut() else {
            return;
        };

        match result {
            Ok(()) => {
                mounted.loaded = Some(quality);
                if self.desired_quality != Some(quality) {
                    // Superseded while loading; advance issues the next load
                    return;
                }
                self.last_good_quality = Some(quality);
                self.finish_load();
            }
            Err(err) => {
                mounted.loaded = None;
                if self.desired_quality != Some(quality) {
                    log::debug!("[Session] superseded {quality} load failed");
                    return;
                }
                match self.last_good_quality {
                    Some(good) if good != quality => {
                        log::warn!(
                            "[Session] switch to {quality} failed ({err}); \
                             rolling back to {good}"
                        );
                        self.desired_quality = Some(good);
                        self.notice(format!(
                            "Couldn't switch to {quality}, staying on {good}"
                        ));
                    }
                    _ => self.fail(err),
                }
            }
        }
    }

    /// Restore everything a fresh load resets, then go `Ready`.
    fn finish_load(&mut self) {
        let Some(engine) = self.mounted_engine().cloned() else {
            return;
        };
        engine.set_volume(self.volume);
        engine.set_muted(self.muted);
        engine.set_playback_rate(self.rate);
        self.apply_subtitles();

        let resume = self.resume.take().unwrap_or(ResumePoint {
            position: Duration::ZERO,
            playing: self.settings.playback.autoplay,
        });
        if !resume.position.is_zero() {
            engine.seek(resume.position);
        }
        self.position = resume.position;
        if resume.playing {
            engine.play();
        } else {
            engine.pause();
        }
        self.playing = resume.playing;
        self.heartbeat.reset();
        if let Some(duration) = engine.duration() {
            self.duration = Some(duration);
        }

        log::info!(
            "[Session] ready at {:?} on {:?}",
            self.position,
            self.desired_quality
        );
        self.set_state(SessionState::Ready);
    }

    // ===== Engine events =====

    fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::TimeUpdate(position) => {
                if self.state == SessionState::Ready {
                    self.on_position(position);
                }
            }
            EngineEvent::Ended => {
                if self.state == SessionState::Ready {
                    self.on_ended();
                }
            }
            EngineEvent::Error(message) => match self.state {
                SessionState::Idle
                | SessionState::Error(_)
                | SessionState::Destroyed => {}
                _ => self.fail(PlaybackError::EngineFatal(message)),
            },
        }
    }

    fn on_heartbeat(&mut self) {
        if let Some(position) =
            self.mounted_engine().map(|engine| engine.position())
        {
            self.on_position(position);
        }
    }

    fn on_position(&mut self, position: Duration) {
        self.position = position;
        if let Some(record) = self.reporter.observe(position) {
            self.report(record);
        }
    }

    fn on_ended(&mut self) {
        let duration = self.known_duration().unwrap_or(self.position);
        self.position = duration;
        self.playing = false;
        if let Some(record) = self.reporter.finish(duration) {
            self.report(record);
        }
        self.set_state(SessionState::Ended);

        if !self.settings.playback.auto_advance {
            return;
        }
        let next = match (&self.target, &self.playlist) {
            (Some(target), Some(playlist)) => playlist
                .next_after(target.request.episode_id)
                .map(|episode| episode.id),
            _ => None,
        };
        if let Some(next) = next {
            log::info!("[Session] auto-advancing to episode {next}");
            let request = self.follow_up(next);
            self.initialize(request);
        }
    }

    // ===== Reconciliation =====

    fn advance(&mut self) {
        if self.op.is_some() {
            return;
        }

        if let Some(mounted) = &self.engine
            && mounted.retired
        {
            self.start_teardown();
            return;
        }

        if self.destroy_pending {
            self.finish_destroy();
            return;
        }
        self.release_destroy_waiters();

        if !self.state.is_loading() {
            return;
        }
        let Some(target) = &self.target else {
            return;
        };
        let episode = target.request.episode_id;

        let Some(media) = self
            .media
            .as_ref()
            .filter(|media| media.episode_id == episode)
        else {
            self.start_fetch(episode);
            return;
        };

        let Some(rendition) = media.resolve(self.desired_quality).cloned()
        else {
            return;
        };
        let subtitles = media.subtitles.clone();
        let timeout = self.settings.playback.load_timeout;
        let generation = self.generation;
        let quality = rendition.quality;

        let loaded = self.engine.as_ref().map(|mounted| mounted.loaded);
        match loaded {
            None => {
                let engine = self.deps.engines.create();
                let (listener, events) = engine_event_channel();
                engine.subscribe(listener);
                self.engine = Some(MountedEngine {
                    engine: engine.clone(),
                    episode,
                    loaded: None,
                    retired: false,
                });
                self.engine_events = Some(events);

                log::debug!(
                    "[Session] mounting engine for episode {episode} at {quality}"
                );
                let surface = self.surface;
                self.op = Some(
                    async move {
                        if let Err(error) =
                            ops::attach(&engine, surface, quality).await
                        {
                            return OpOutcome::AttachFailed {
                                generation,
                                error,
                            };
                        }
                        let result = ops::load_rendition(
                            engine, rendition, subtitles, timeout,
                        )
                        .await;
                        OpOutcome::Loaded {
                            generation,
                            quality,
                            result,
                        }
                    }
                    .boxed(),
                );
            }
            Some(loaded) if loaded != Some(quality) => {
                let Some(engine) = self.mounted_engine().cloned() else {
                    return;
                };
                log::debug!("[Session] loading {quality} on mounted engine");
                self.op = Some(
                    async move {
                        let result = ops::load_rendition(
                            engine, rendition, subtitles, timeout,
                        )
                        .await;
                        OpOutcome::Loaded {
                            generation,
                            quality,
                            result,
                        }
                    }
                    .boxed(),
                );
            }
            Some(_) => {
                // Already showing the desired rendition, e.g. a switch that
                // came back to the loaded quality
                self.last_good_quality = Some(quality);
                self.finish_load();
            }
        }
    }

    fn start_fetch(&mut self, episode: EpisodeId) {
        let catalog = self.deps.catalog.clone();
        let known_video = self.playlist.as_ref().map(|p| p.video_id());
        let timeout = self.settings.playback.fetch_timeout;
        let generation = self.generation;
        log::debug!("[Session] fetching episode {episode}");
        self.op = Some(
            async move {
                let result =
                    ops::fetch_episode(catalog, episode, known_video, timeout)
                        .await;
                OpOutcome::Fetched { generation, result }
            }
            .boxed(),
        );
        self.op_droppable = true;
    }

    fn start_teardown(&mut self) {
        let Some(mounted) = self.engine.take() else {
            return;
        };
        log::debug!(
            "[Session] tearing down engine for episode {}",
            mounted.episode
        );
        self.engine_events = None;
        let engine = mounted.engine;
        self.op = Some(
            async move {
                ops::tear_down(engine).await;
                OpOutcome::TornDown
            }
            .boxed(),
        );
    }

    fn finish_destroy(&mut self) {
        self.destroy_pending = false;
        self.media = None;
        self.desired_quality = None;
        self.last_good_quality = None;
        self.duration = None;
        self.reporter.clear();
        self.set_state(SessionState::Destroyed);
        self.release_destroy_waiters();
    }

    fn release_destroy_waiters(&mut self) {
        for waiter in self.destroy_waiters.drain(..) {
            let _ = waiter.send(());
        }
    }

    async fn shutdown(mut self) {
        log::debug!("[Session] all handles dropped, shutting down");
        self.flush_progress();
        if let Some(op) = self.op.take() {
            let _ = op.await;
        }
        self.engine_events = None;
        if let Some(mounted) = self.engine.take() {
            mounted.engine.destroy().await;
        }
        self.finish_destroy();
        self.publish();
    }

    // ===== Helpers =====

    fn mounted_engine(&self) -> Option<&Arc<dyn PlaybackEngine>> {
        self.engine
            .as_ref()
            .filter(|mounted| !mounted.retired)
            .map(|mounted| &mounted.engine)
    }

    fn flush_progress(&mut self) {
        let position = match self.state {
            SessionState::Ready => self
                .mounted_engine()
                .map(|engine| engine.position())
                .unwrap_or(self.position),
            // Engines may report slightly less than the duration after the end
            SessionState::Ended => self.position,
            _ => return,
        };
        if let Some(record) = self.reporter.flush(position) {
            self.report(record);
        }
    }

    fn report(&mut self, record: ProgressRecord) {
        log::debug!(
            "[Progress] episode {} at {}s",
            record.episode_id,
            record.position_seconds
        );
        if self.history.send(record).is_err() {
            log::warn!("[Progress] history writer stopped; record dropped");
        }
        self.emit(SessionEvent::ProgressReported(record));
    }

    fn fail(&mut self, err: PlaybackError) {
        log::error!("[Session] {err}");
        self.resume = None;
        self.playing = false;
        self.set_state(SessionState::Error(err.clone()));
        self.emit(SessionEvent::Failed(err));
    }

    fn notice(&self, message: impl Into<String>) {
        let message = message.into();
        log::info!("[Session] notice: {message}");
        self.emit(SessionEvent::Notice(message));
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state == state {
            return;
        }
        log::debug!("[Session] {} -> {}", self.state, state);
        self.state = state.clone();
        self.emit(SessionEvent::StateChanged(state));
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }

    fn snapshot(&self) -> SessionSnapshot {
        let media = self.media.as_ref();
        let episode_id = self
            .target
            .as_ref()
            .map(|target| target.request.episode_id)
            .or(media.map(|media| media.episode_id));
        let neighbours = |forward: bool| {
            let (episode, playlist) = (episode_id?, self.playlist.as_ref()?);
            let neighbour = if forward {
                playlist.next_after(episode)
            } else {
                playlist.previous_before(episode)
            };
            neighbour.map(|summary| summary.id)
        };

        SessionSnapshot {
            state: self.state.clone(),
            episode_id,
            video_id: media.map(|media| media.video_id),
            title: media.map(|media| media.title.clone()),
            episode_number: media.map(|media| media.episode_number),
            video: self.video.clone(),
            selected_quality: self.desired_quality,
            available_qualities: media
                .map(|media| media.qualities())
                .unwrap_or_default(),
            subtitle_tracks: media
                .map(|media| media.subtitles.clone())
                .unwrap_or_default(),
            selected_subtitle: self.subtitle.clone(),
            subtitles_visible: self.subtitle != SubtitleChoice::Off,
            is_playing: self.playing,
            last_known_position: self.position,
            last_reported_position: self.reporter.last_sent(),
            duration: self.duration,
            volume: self.volume,
            muted: self.muted,
            playback_rate: self.rate,
            previous_episode: neighbours(false),
            next_episode: neighbours(true),
        }
    }
}

async fn next_outcome(op: &mut Option<BoxFuture<'static, OpOutcome>>) -> OpOutcome {
    match op {
        Some(op) => op.await,
        None => std::future::pending().await,
    }
}

async fn next_engine_event(
    events: &mut Option<EngineEventReceiver>,
) -> Option<EngineEvent> {
    match events {
        Some(events) => events.recv().await,
        None => std::future::pending().await,
    }
}

/// Delivers progress records in order without blocking the session.
fn spawn_history_writer(
    history: Arc<dyn showreel_contracts::HistorySink>,
) -> mpsc::UnboundedSender<ProgressRecord> {
    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressRecord>();
    tokio::spawn(async move {
        while let Some(record) = rx.recv().await {
            if let Err(err) = history.record_progress(record).await {
                log::warn!(
                    "[Progress] episode {} at {}s not recorded: {err}",
                    record.episode_id,
                    record.position_seconds
                );
            }
        }
    });
    tx
}
