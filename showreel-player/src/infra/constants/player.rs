//! Player tuning constants

pub mod channels {
    /// Lagging event subscribers drop the oldest events beyond this
    pub const EVENT_CAPACITY: usize = 64;
}

pub mod playback {
    pub const MIN_PLAYBACK_RATE: f32 = 0.25;
    pub const MAX_PLAYBACK_RATE: f32 = 4.0;
    pub const DEFAULT_PLAYBACK_RATE: f32 = 1.0;
}

pub mod seeking {
    /// Relative seeks never land closer than this to the end of the content
    pub const END_GUARD_SECS: f64 = 0.5;
}
