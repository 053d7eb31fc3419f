//! JSON shapes exchanged with the catalog REST API and their normalization
//! into the playback model.

use std::collections::HashSet;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::{EpisodeId, UserId, VideoId};
use crate::media::{
    ContainerType, EpisodeMedia, Quality, Rendition, SubtitleFormat,
    SubtitleTrack,
};
use crate::watch::{ProgressRecord, VideoSummary};

/// `GET /api/episodes/:id`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct EpisodeRecord {
    pub id: EpisodeId,
    pub video_id: VideoId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub episode_number: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub source_url: Option<String>,
    /// Seconds
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sources: Option<Vec<SourceRecord>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub subtitles: Option<Vec<SubtitleRecord>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SourceRecord {
    pub quality: String,
    pub url: String,
    #[cfg_attr(feature = "serde", serde(rename = "type", default))]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubtitleRecord {
    pub language: String,
    pub url: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub format: Option<String>,
}

/// `GET /api/videos/:id`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct VideoRecord {
    pub id: VideoId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub category_id: Option<i64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
}

/// `POST /api/history` body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ProgressRequest {
    pub user_id: UserId,
    pub video_id: VideoId,
    pub episode_id: EpisodeId,
    pub progress: u64,
}

impl From<&ProgressRecord> for ProgressRequest {
    fn from(record: &ProgressRecord) -> Self {
        Self {
            user_id: record.user_id,
            video_id: record.video_id,
            episode_id: record.episode_id,
            progress: record.position_seconds,
        }
    }
}

impl From<VideoRecord> for VideoSummary {
    fn from(record: VideoRecord) -> Self {
        Self {
            id: record.id,
            category_id: record.category_id,
            title: record.title,
            description: record.description,
        }
    }
}

impl From<EpisodeRecord> for EpisodeMedia {
    /// Normalize a catalog record. Invalid source rows are dropped rather
    /// than failing the whole episode; a record with no usable rendition
    /// comes out unplayable and the session decides what to do with it.
    fn from(record: EpisodeRecord) -> Self {
        let mut seen = HashSet::new();
        let mut renditions = Vec::new();

        for source in record.sources.unwrap_or_default() {
            if source.url.trim().is_empty() {
                log::warn!(
                    "[Catalog] episode {} source without url skipped",
                    record.id
                );
                continue;
            }
            let quality = match source.quality.parse::<Quality>() {
                Ok(quality) => quality,
                Err(err) => {
                    log::warn!("[Catalog] episode {}: {err}", record.id);
                    continue;
                }
            };
            if !seen.insert(quality) {
                log::debug!(
                    "[Catalog] episode {} duplicate {quality} rendition ignored",
                    record.id
                );
                continue;
            }
            let container = source
                .kind
                .as_deref()
                .and_then(|kind| kind.parse::<ContainerType>().ok())
                .unwrap_or_else(|| ContainerType::infer_from_url(&source.url));
            renditions.push(Rendition {
                quality,
                url: source.url,
                container,
            });
        }

        if renditions.is_empty()
            && let Some(url) = record
                .source_url
                .filter(|url| !url.trim().is_empty())
        {
            renditions.push(Rendition::new(Quality::Auto, url));
        }

        let subtitles = record
            .subtitles
            .unwrap_or_default()
            .into_iter()
            .filter(|sub| !sub.url.trim().is_empty())
            .map(|sub| {
                let format = sub
                    .format
                    .as_deref()
                    .and_then(|raw| raw.parse::<SubtitleFormat>().ok())
                    .unwrap_or_else(|| SubtitleFormat::infer_from_url(&sub.url));
                SubtitleTrack {
                    display_label: sub.language.to_uppercase(),
                    language_code: sub.language,
                    url: sub.url,
                    format,
                }
            })
            .collect();

        EpisodeMedia {
            episode_id: record.id,
            video_id: record.video_id,
            title: record.title,
            episode_number: record.episode_number,
            duration_hint: record
                .duration
                .filter(|secs| *secs > 0)
                .map(|secs| Duration::from_secs(u64::from(secs))),
            renditions,
            subtitles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> EpisodeRecord {
        EpisodeRecord {
            id: EpisodeId(3),
            video_id: VideoId(1),
            title: "Episode 3".into(),
            episode_number: 3,
            source_url: Some("https://cdn.test/ep3/master.m3u8".into()),
            duration: Some(1440),
            sources: None,
            subtitles: None,
        }
    }

    #[test]
    fn bare_source_url_becomes_implicit_auto_rendition() {
        let media = EpisodeMedia::from(record());
        assert_eq!(media.renditions.len(), 1);
        assert_eq!(media.renditions[0].quality, Quality::Auto);
        assert_eq!(media.renditions[0].container, ContainerType::Segmented);
        assert_eq!(media.duration_hint, Some(Duration::from_secs(1440)));
    }

    #[test]
    fn explicit_sources_win_over_source_url() {
        let mut rec = record();
        rec.sources = Some(vec![
            SourceRecord {
                quality: "720p".into(),
                url: "https://cdn.test/ep3/720.mp4".into(),
                kind: Some("mp4".into()),
            },
            SourceRecord {
                quality: "8k".into(),
                url: "https://cdn.test/ep3/8k.mp4".into(),
                kind: None,
            },
            SourceRecord {
                quality: "720p".into(),
                url: "https://cdn.test/ep3/720-alt.mp4".into(),
                kind: None,
            },
            SourceRecord {
                quality: "480p".into(),
                url: "https://cdn.test/ep3/480.m3u8".into(),
                kind: None,
            },
        ]);

        let media = EpisodeMedia::from(rec);
        assert_eq!(media.qualities(), vec![Quality::P720, Quality::P480]);
        assert_eq!(media.renditions[0].url, "https://cdn.test/ep3/720.mp4");
        assert_eq!(media.renditions[1].container, ContainerType::Segmented);
    }

    #[test]
    fn no_sources_and_blank_url_is_unplayable() {
        let mut rec = record();
        rec.source_url = Some("  ".into());
        rec.sources = Some(Vec::new());
        assert!(!EpisodeMedia::from(rec).is_playable());
    }

    #[test]
    fn subtitle_rows_are_labelled_and_typed() {
        let mut rec = record();
        rec.subtitles = Some(vec![
            SubtitleRecord {
                language: "en".into(),
                url: "https://cdn.test/ep3/en.srt".into(),
                format: None,
            },
            SubtitleRecord {
                language: "ko".into(),
                url: String::new(),
                format: None,
            },
        ]);
        let media = EpisodeMedia::from(rec);
        assert_eq!(media.subtitles.len(), 1);
        assert_eq!(media.subtitles[0].display_label, "EN");
        assert_eq!(media.subtitles[0].format, SubtitleFormat::Srt);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn episode_json_uses_camel_case_fields() {
        let json = r#"{
            "id": 5,
            "videoId": 2,
            "title": "Five",
            "episodeNumber": 5,
            "sourceUrl": "https://cdn.test/5.mp4",
            "duration": null,
            "thumbnailUrl": "https://cdn.test/5.jpg",
            "sources": [{"quality": "1080p", "url": "https://cdn.test/5-1080.mp4", "type": "mp4"}],
            "subtitles": [{"language": "en", "url": "https://cdn.test/5.vtt", "format": "vtt"}]
        }"#;
        let record: EpisodeRecord =
            serde_json::from_str(json).expect("episode json");
        let media = EpisodeMedia::from(record);
        assert_eq!(media.episode_id, EpisodeId(5));
        assert_eq!(media.video_id, VideoId(2));
        assert_eq!(media.qualities(), vec![Quality::P1080]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn progress_request_matches_history_route_shape() {
        let record = ProgressRecord {
            user_id: UserId(9),
            video_id: VideoId(2),
            episode_id: EpisodeId(5),
            position_seconds: 61,
        };
        let value = serde_json::to_value(ProgressRequest::from(&record))
            .expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "userId": 9, "videoId": 2, "episodeId": 5, "progress": 61
            })
        );
    }
}
