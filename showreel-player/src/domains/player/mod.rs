//! Playback session domain
//!
//! - `session`: public handle and spawn entry point
//! - `controller`: the task that owns session state
//! - `ops`: suspending catalog and engine operations
//! - `progress`: watch-progress throttling
//! - `controls`: keyboard transport routing

pub mod controls;
mod controller;
pub mod messages;
mod ops;
pub mod progress;
pub mod session;
pub mod state;

pub use controls::{
    FullscreenHost, InputFocus, Key, KeyPress, Modifiers, NamedKey,
    TransportAction, TransportRouter,
};
pub use messages::{SessionEvent, SessionRequest};
pub use progress::ProgressReporter;
pub use session::{SessionController, SessionDeps, SessionHandle, SessionSettings};
pub use state::{
    PlaybackError, Recovery, SessionSnapshot, SessionState, SubtitleChoice,
};
