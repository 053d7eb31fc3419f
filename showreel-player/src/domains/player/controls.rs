//! Keyboard transport routing
//!
//! Maps key presses to session commands. Shortcuts are suppressed while a
//! text-entry field owns input focus so search boxes and forms keep their
//! keys.

use std::fmt;

use showreel_config::ControlSettings;

use super::session::SessionHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Space,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Escape,
    Enter,
    F11,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Named(NamedKey),
    /// Text produced by the key, as reported by the platform
    Character(String),
}

impl Key {
    pub fn character(c: char) -> Self {
        Key::Character(c.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
    pub logo: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        logo: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        control: false,
        alt: false,
        logo: false,
    };

    /// Control, Alt or the logo key; these belong to the host shortcuts
    pub fn has_command_modifier(&self) -> bool {
        self.control || self.alt || self.logo
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPress {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyPress {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn named(key: NamedKey) -> Self {
        Self::new(Key::Named(key))
    }

    pub fn character(c: char) -> Self {
        Self::new(Key::character(c))
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// What currently owns keyboard focus in the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFocus {
    #[default]
    None,
    /// Text input, search box, text area
    TextEntry,
    /// Buttons, sliders and other non-text widgets
    Other,
}

/// Commands the router can produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportAction {
    TogglePlayPause,
    /// Signed seconds
    SeekRelative(f64),
    ToggleMute,
    /// Signed volume delta
    AdjustVolume(f32),
    ToggleFullscreen,
    ToggleSubtitles,
    NextEpisode,
    PreviousEpisode,
}

/// Platform hook that owns the rendering container's fullscreen state.
pub trait FullscreenHost: Send + Sync {
    fn toggle_fullscreen(&self);
}

#[derive(Debug, Clone)]
pub struct TransportRouter {
    controls: ControlSettings,
}

impl Default for TransportRouter {
    fn default() -> Self {
        Self::new(ControlSettings::default())
    }
}

impl TransportRouter {
    pub fn new(controls: ControlSettings) -> Self {
        Self { controls }
    }

    /// Resolve a key press to an action, honouring focus suppression.
    pub fn route(
        &self,
        press: &KeyPress,
        focus: InputFocus,
    ) -> Option<TransportAction> {
        if focus == InputFocus::TextEntry {
            return None;
        }
        if press.modifiers.has_command_modifier() {
            return None;
        }

        let seek = self.controls.seek_step_secs as f64;
        let volume = self.controls.volume_step;
        let shift = press.modifiers.shift;

        match &press.key {
            Key::Named(NamedKey::Space) => {
                Some(TransportAction::TogglePlayPause)
            }
            Key::Named(NamedKey::ArrowLeft) => {
                Some(TransportAction::SeekRelative(-seek))
            }
            Key::Named(NamedKey::ArrowRight) => {
                Some(TransportAction::SeekRelative(seek))
            }
            Key::Named(NamedKey::ArrowUp) => {
                Some(TransportAction::AdjustVolume(volume))
            }
            Key::Named(NamedKey::ArrowDown) => {
                Some(TransportAction::AdjustVolume(-volume))
            }
            Key::Named(NamedKey::F11) => Some(TransportAction::ToggleFullscreen),
            Key::Named(NamedKey::Escape | NamedKey::Enter) => None,
            Key::Character(c) => match c.as_str() {
                "N" if shift => Some(TransportAction::NextEpisode),
                "n" if shift => Some(TransportAction::NextEpisode),
                "P" if shift => Some(TransportAction::PreviousEpisode),
                "p" if shift => Some(TransportAction::PreviousEpisode),
                "k" | "K" => Some(TransportAction::TogglePlayPause),
                " " => Some(TransportAction::TogglePlayPause),
                "j" | "J" => Some(TransportAction::SeekRelative(-seek)),
                "l" | "L" => Some(TransportAction::SeekRelative(seek)),
                "m" | "M" => Some(TransportAction::ToggleMute),
                "f" | "F" => Some(TransportAction::ToggleFullscreen),
                "c" | "C" => Some(TransportAction::ToggleSubtitles),
                _ => None,
            },
        }
    }

    /// Route and dispatch. Returns `true` when the key was consumed.
    pub fn handle_key(
        &self,
        press: &KeyPress,
        focus: InputFocus,
        session: &SessionHandle,
        fullscreen: &dyn FullscreenHost,
    ) -> bool {
        match self.route(press, focus) {
            Some(action) => {
                log::debug!("[Transport] {:?} -> {action:?}", press.key);
                Self::dispatch(action, session, fullscreen);
                true
            }
            None => false,
        }
    }

    /// Apply an action coming from either the keyboard or on-screen controls.
    pub fn dispatch(
        action: TransportAction,
        session: &SessionHandle,
        fullscreen: &dyn FullscreenHost,
    ) {
        match action {
            TransportAction::TogglePlayPause => session.toggle_play_pause(),
            TransportAction::SeekRelative(secs) => session.seek_relative(secs),
            TransportAction::ToggleMute => session.toggle_mute(),
            TransportAction::AdjustVolume(delta) => session.adjust_volume(delta),
            TransportAction::ToggleFullscreen => fullscreen.toggle_fullscreen(),
            TransportAction::ToggleSubtitles => session.toggle_subtitles(),
            TransportAction::NextEpisode => session.next_episode(),
            TransportAction::PreviousEpisode => session.previous_episode(),
        }
    }
}

impl fmt::Display for TransportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportAction::TogglePlayPause => f.write_str("play/pause"),
            TransportAction::SeekRelative(secs) => write!(f, "seek {secs:+}s"),
            TransportAction::ToggleMute => f.write_str("mute"),
            TransportAction::AdjustVolume(delta) => {
                write!(f, "volume {delta:+.2}")
            }
            TransportAction::ToggleFullscreen => f.write_str("fullscreen"),
            TransportAction::ToggleSubtitles => f.write_str("subtitles"),
            TransportAction::NextEpisode => f.write_str("next episode"),
            TransportAction::PreviousEpisode => {
                f.write_str("previous episode")
            }
        }
    }
}
