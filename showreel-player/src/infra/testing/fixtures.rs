//! Canned catalog data
//!
//! Rendition URLs follow `https://cdn.test/v{video}/e{episode}/{quality}.m3u8`
//! so tests can name the exact URL a load should hit.

use std::time::Duration;

use showreel_model::{
    EpisodeId, EpisodeMedia, Quality, Rendition, SubtitleTrack, VideoId,
    VideoSummary,
};

pub fn rendition_url(video: VideoId, episode: EpisodeId, quality: Quality) -> String {
    format!("https://cdn.test/v{video}/e{episode}/{quality}.m3u8")
}

/// Episode with the given qualities and an English subtitle track.
pub fn episode(
    video: VideoId,
    episode: EpisodeId,
    number: i32,
    qualities: &[Quality],
) -> EpisodeMedia {
    EpisodeMedia {
        episode_id: episode,
        video_id: video,
        title: format!("Episode {number}"),
        episode_number: number,
        duration_hint: Some(Duration::from_secs(1440)),
        renditions: qualities
            .iter()
            .map(|&quality| {
                Rendition::new(quality, rendition_url(video, episode, quality))
            })
            .collect(),
        subtitles: vec![SubtitleTrack::new(
            "en",
            format!("https://cdn.test/v{video}/e{episode}/en.vtt"),
        )],
    }
}

pub fn video(id: VideoId) -> VideoSummary {
    VideoSummary {
        id,
        category_id: Some(1),
        title: format!("Video {id}"),
        description: None,
    }
}
