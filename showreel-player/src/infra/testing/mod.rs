//! Test doubles for sessions
//!
//! Shipped in the library so integration tests and UI prototypes can drive a
//! session without a server or a real media engine.

pub mod engine;
pub mod fixtures;
pub mod stubs;

pub use engine::{
    EngineCall, EngineRecord, FakeEngine, FakeEngineBehavior,
    FakeEngineFactory,
};
pub use stubs::{InMemoryCatalog, RecordingHistory};
