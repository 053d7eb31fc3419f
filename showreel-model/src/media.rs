//! Episode media: the renditions and subtitle tracks a session can play.
//!
//! Renditions of one episode are alternate encodes of identical content, so a
//! time offset in one rendition is directly comparable to the same offset in
//! any other. Switching quality therefore never needs position translation.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::ids::{EpisodeId, VideoId};

/// Encoded quality of a rendition.
///
/// `Auto` tags the implicit rendition synthesized from a bare source URL (the
/// catalog supplied no explicit quality list, typically an adaptive manifest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Quality {
    #[cfg_attr(feature = "serde", serde(rename = "auto"))]
    Auto,
    #[cfg_attr(feature = "serde", serde(rename = "360p"))]
    P360,
    #[cfg_attr(feature = "serde", serde(rename = "480p"))]
    P480,
    #[cfg_attr(feature = "serde", serde(rename = "720p"))]
    P720,
    #[cfg_attr(feature = "serde", serde(rename = "1080p"))]
    P1080,
}

impl Quality {
    pub const ALL: [Self; 5] =
        [Self::Auto, Self::P360, Self::P480, Self::P720, Self::P1080];

    pub fn label(self) -> &'static str {
        match self {
            Quality::Auto => "auto",
            Quality::P360 => "360p",
            Quality::P480 => "480p",
            Quality::P720 => "720p",
            Quality::P1080 => "1080p",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Quality {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Quality::Auto),
            "360p" | "360" => Ok(Quality::P360),
            "480p" | "480" => Ok(Quality::P480),
            "720p" | "720" => Ok(Quality::P720),
            "1080p" | "1080" => Ok(Quality::P1080),
            _ => Err(ModelError::UnknownQuality(raw.to_string())),
        }
    }
}

/// How the engine has to consume a rendition URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ContainerType {
    /// Single progressive file (mp4)
    #[default]
    Progressive,
    /// Segmented stream behind a playlist manifest (hls)
    Segmented,
}

impl ContainerType {
    /// Guess the container from the URL path when the catalog omits it.
    pub fn infer_from_url(url: &str) -> Self {
        if url_extension(url).is_some_and(|ext| ext == "m3u8") {
            ContainerType::Segmented
        } else {
            ContainerType::Progressive
        }
    }
}

impl FromStr for ContainerType {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mp4" | "progressive" => Ok(ContainerType::Progressive),
            "hls" | "m3u8" | "segmented" => Ok(ContainerType::Segmented),
            _ => Err(ModelError::UnknownContainer(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SubtitleFormat {
    #[default]
    Vtt,
    Srt,
}

impl SubtitleFormat {
    pub fn infer_from_url(url: &str) -> Self {
        if url_extension(url).is_some_and(|ext| ext == "srt") {
            SubtitleFormat::Srt
        } else {
            SubtitleFormat::Vtt
        }
    }
}

impl FromStr for SubtitleFormat {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "vtt" | "webvtt" => Ok(SubtitleFormat::Vtt),
            "srt" | "subrip" => Ok(SubtitleFormat::Srt),
            _ => Err(ModelError::UnknownSubtitleFormat(raw.to_string())),
        }
    }
}

/// One quality-specific encode of an episode.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rendition {
    pub quality: Quality,
    pub url: String,
    pub container: ContainerType,
}

impl Rendition {
    pub fn new(quality: Quality, url: impl Into<String>) -> Self {
        let url = url.into();
        let container = ContainerType::infer_from_url(&url);
        Self {
            quality,
            url,
            container,
        }
    }
}

/// A language-tagged external subtitle file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubtitleTrack {
    pub language_code: String,
    pub display_label: String,
    pub url: String,
    pub format: SubtitleFormat,
}

impl SubtitleTrack {
    pub fn new(language_code: impl Into<String>, url: impl Into<String>) -> Self {
        let language_code = language_code.into();
        let url = url.into();
        Self {
            display_label: language_code.to_uppercase(),
            format: SubtitleFormat::infer_from_url(&url),
            language_code,
            url,
        }
    }

    /// Case-insensitive match that also accepts a region-qualified code
    /// (`en` matches `en-US`).
    pub fn matches_language(&self, language: &str) -> bool {
        let ours = self.language_code.to_ascii_lowercase();
        let theirs = language.trim().to_ascii_lowercase();
        if theirs.is_empty() {
            return false;
        }
        ours == theirs
            || ours
                .split(['-', '_'])
                .next()
                .is_some_and(|primary| primary == theirs)
    }
}

/// Read-only view of one episode's playable sources.
///
/// Immutable for the lifetime of a session and fetched again whenever the
/// episode identity changes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EpisodeMedia {
    pub episode_id: EpisodeId,
    pub video_id: VideoId,
    pub title: String,
    pub episode_number: i32,
    pub duration_hint: Option<Duration>,
    pub renditions: Vec<Rendition>,
    pub subtitles: Vec<SubtitleTrack>,
}

impl EpisodeMedia {
    /// At least one rendition is required before anything can be loaded.
    pub fn is_playable(&self) -> bool {
        !self.renditions.is_empty()
    }

    pub fn qualities(&self) -> Vec<Quality> {
        self.renditions.iter().map(|r| r.quality).collect()
    }

    pub fn rendition(&self, quality: Quality) -> Option<&Rendition> {
        self.renditions.iter().find(|r| r.quality == quality)
    }

    pub fn has_quality(&self, quality: Quality) -> bool {
        self.rendition(quality).is_some()
    }

    /// Resolve a requested quality to a rendition that actually exists,
    /// falling back to the first rendition.
    pub fn resolve(&self, requested: Option<Quality>) -> Option<&Rendition> {
        requested
            .and_then(|quality| self.rendition(quality))
            .or_else(|| self.renditions.first())
    }

    pub fn subtitle(&self, language: &str) -> Option<&SubtitleTrack> {
        self.subtitles
            .iter()
            .find(|track| track.matches_language(language))
    }

    /// First track matching the preference list, in preference order.
    pub fn preferred_subtitle(
        &self,
        preferences: &[String],
    ) -> Option<&SubtitleTrack> {
        preferences
            .iter()
            .find_map(|language| self.subtitle(language))
    }
}

fn url_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next()?;
    let (_, ext) = file.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(renditions: Vec<Rendition>) -> EpisodeMedia {
        EpisodeMedia {
            episode_id: EpisodeId(1),
            video_id: VideoId(1),
            title: "Pilot".into(),
            episode_number: 1,
            duration_hint: None,
            renditions,
            subtitles: vec![
                SubtitleTrack::new("fr", "https://cdn.test/ep1.fr.vtt"),
                SubtitleTrack::new("en-US", "https://cdn.test/ep1.en.srt"),
            ],
        }
    }

    #[test]
    fn quality_labels_parse_case_insensitively() {
        assert_eq!("720P".parse::<Quality>(), Ok(Quality::P720));
        assert_eq!(" auto ".parse::<Quality>(), Ok(Quality::Auto));
        assert!("4k".parse::<Quality>().is_err());
    }

    #[test]
    fn container_is_inferred_from_manifest_extension() {
        assert_eq!(
            ContainerType::infer_from_url("https://cdn.test/a/master.m3u8?t=1"),
            ContainerType::Segmented
        );
        assert_eq!(
            ContainerType::infer_from_url("https://cdn.test/a/ep.mp4"),
            ContainerType::Progressive
        );
    }

    #[test]
    fn resolve_falls_back_to_first_rendition() {
        let media = media(vec![
            Rendition::new(Quality::P720, "https://cdn.test/720.mp4"),
            Rendition::new(Quality::P480, "https://cdn.test/480.mp4"),
        ]);
        assert_eq!(
            media.resolve(Some(Quality::P480)).map(|r| r.quality),
            Some(Quality::P480)
        );
        assert_eq!(
            media.resolve(Some(Quality::P1080)).map(|r| r.quality),
            Some(Quality::P720)
        );
        assert_eq!(media.resolve(None).map(|r| r.quality), Some(Quality::P720));
    }

    #[test]
    fn preferred_subtitle_follows_preference_order() {
        let media = media(vec![]);
        let prefs = vec!["de".to_string(), "en".to_string()];
        let track = media.preferred_subtitle(&prefs).expect("english track");
        assert_eq!(track.language_code, "en-US");
        assert_eq!(track.format, SubtitleFormat::Srt);
        assert_eq!(track.display_label, "EN-US");
        assert!(!media.is_playable());
    }
}
