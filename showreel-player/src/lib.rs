//! Showreel player library
//!
//! The playback session controller that sits between the catalog server and a
//! concrete media engine. One [`SessionController`] task runs per watch page;
//! the embedding UI talks to it through a cloneable [`SessionHandle`] and feeds
//! keyboard input through the [`TransportRouter`].
//!
//! Notes
//! - Engines are pluggable through `showreel_contracts::PlaybackEngine`.
//! - [`infra::testing`] ships the recording fake engine and in-memory
//!   collaborators used by the test suite and by UI prototyping.

pub mod domains;
pub mod infra;

pub use domains::player::{
    FullscreenHost, InputFocus, Key, KeyPress, Modifiers, NamedKey,
    PlaybackError, ProgressReporter, Recovery, SessionController, SessionDeps,
    SessionEvent, SessionHandle, SessionRequest, SessionSettings,
    SessionSnapshot, SessionState, SubtitleChoice, TransportAction,
    TransportRouter,
};
