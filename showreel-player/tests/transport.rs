//! Keyboard routing wired to a live session.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use showreel_contracts::SurfaceHandle;
use showreel_model::{EpisodeId, Quality, VideoId};
use showreel_player::infra::testing::fixtures;
use showreel_player::infra::testing::{
    FakeEngineFactory, InMemoryCatalog, RecordingHistory,
};
use showreel_player::{
    FullscreenHost, InputFocus, KeyPress, Modifiers, NamedKey,
    SessionController, SessionDeps, SessionHandle, SessionRequest,
    SessionSettings, SessionState, TransportAction, TransportRouter,
};

const VIDEO: VideoId = VideoId(4);
const E1: EpisodeId = EpisodeId(41);
const E2: EpisodeId = EpisodeId(42);

#[derive(Debug, Default)]
struct CountingFullscreen {
    toggles: AtomicUsize,
}

impl FullscreenHost for CountingFullscreen {
    fn toggle_fullscreen(&self) {
        self.toggles.fetch_add(1, Ordering::SeqCst);
    }
}

async fn ready_session() -> (SessionHandle, FakeEngineFactory) {
    let _ = env_logger::builder().is_test(true).try_init();
    let catalog = InMemoryCatalog::new()
        .with_episode(fixtures::episode(VIDEO, E1, 1, &[Quality::P720]))
        .with_episode(fixtures::episode(VIDEO, E2, 2, &[Quality::P720]));
    let engines = FakeEngineFactory::new();
    let deps = SessionDeps::new(
        Arc::new(catalog),
        Arc::new(RecordingHistory::new()),
        Arc::new(engines.clone()),
    );
    let session = SessionController::spawn(
        deps,
        SessionSettings::default(),
        SurfaceHandle(9),
    );
    session.initialize(SessionRequest::new(E1));
    session
        .wait_until(|s| s.state == SessionState::Ready)
        .await
        .expect("session ready");
    (session, engines)
}

#[tokio::test(start_paused = true)]
async fn space_toggles_playback() {
    let (session, engines) = ready_session().await;
    let router = TransportRouter::default();
    let fullscreen = CountingFullscreen::default();

    let consumed = router.handle_key(
        &KeyPress::named(NamedKey::Space),
        InputFocus::None,
        &session,
        &fullscreen,
    );
    assert!(consumed);
    session
        .wait_until(|s| !s.is_playing)
        .await
        .expect("paused");
    assert!(engines.latest().is_some_and(|e| e.is_paused()));
}

#[tokio::test(start_paused = true)]
async fn text_entry_keeps_its_keys() {
    let (session, _engines) = ready_session().await;
    let router = TransportRouter::default();
    let fullscreen = CountingFullscreen::default();

    for press in [
        KeyPress::named(NamedKey::Space),
        KeyPress::character('f'),
        KeyPress::character('m'),
    ] {
        assert!(!router.handle_key(
            &press,
            InputFocus::TextEntry,
            &session,
            &fullscreen,
        ));
    }
    tokio::time::sleep(Duration::from_secs(1)).await;

    let snapshot = session.snapshot();
    assert!(snapshot.is_playing);
    assert!(!snapshot.muted);
    assert_eq!(fullscreen.toggles.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn fullscreen_goes_to_the_host() {
    let (session, _engines) = ready_session().await;
    let router = TransportRouter::default();
    let fullscreen = CountingFullscreen::default();

    router.handle_key(
        &KeyPress::character('f'),
        InputFocus::Other,
        &session,
        &fullscreen,
    );
    router.handle_key(
        &KeyPress::named(NamedKey::F11),
        InputFocus::None,
        &session,
        &fullscreen,
    );
    assert_eq!(fullscreen.toggles.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn shift_n_moves_to_the_next_episode() {
    let (session, engines) = ready_session().await;
    let router = TransportRouter::default();
    let fullscreen = CountingFullscreen::default();

    router.handle_key(
        &KeyPress::character('N').with_modifiers(Modifiers::SHIFT),
        InputFocus::None,
        &session,
        &fullscreen,
    );
    session
        .wait_until(|s| {
            s.state == SessionState::Ready && s.episode_id == Some(E2)
        })
        .await
        .expect("next episode ready");
    assert_eq!(engines.created(), 2);
}

#[tokio::test(start_paused = true)]
async fn on_screen_controls_share_the_dispatch_path() {
    let (session, _engines) = ready_session().await;
    let fullscreen = CountingFullscreen::default();

    TransportRouter::dispatch(TransportAction::ToggleMute, &session, &fullscreen);
    TransportRouter::dispatch(
        TransportAction::AdjustVolume(-0.5),
        &session,
        &fullscreen,
    );
    let snapshot = session
        .wait_until(|s| s.muted && s.volume == 0.5)
        .await
        .expect("volume applied");
    assert!(snapshot.muted);
}
