use std::fmt::{self, Display};

/// Errors produced by model constructors and parsing routines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    UnknownQuality(String),
    UnknownContainer(String),
    UnknownSubtitleFormat(String),
    InvalidMedia(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::UnknownQuality(label) => {
                write!(f, "unknown quality label: {label}")
            }
            ModelError::UnknownContainer(label) => {
                write!(f, "unknown container type: {label}")
            }
            ModelError::UnknownSubtitleFormat(label) => {
                write!(f, "unknown subtitle format: {label}")
            }
            ModelError::InvalidMedia(msg) => write!(f, "invalid media: {msg}"),
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
