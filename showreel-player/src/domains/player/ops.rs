//! Suspending operations the controller runs one at a time.
//!
//! Each operation owns clones of what it needs so it can outlive the command
//! that started it; the controller decides on completion whether the result
//! still applies.

use std::sync::Arc;
use std::time::Duration;

use showreel_contracts::{
    CatalogError, EngineError, EpisodeCatalog, PlaybackEngine, SurfaceHandle,
};
use showreel_model::{
    EpisodeId, EpisodeMedia, EpisodePlaylist, Quality, Rendition,
    SubtitleTrack, VideoId, VideoSummary,
};

use super::state::PlaybackError;

pub(crate) enum OpOutcome {
    Fetched {
        generation: u64,
        result: Result<FetchedEpisode, PlaybackError>,
    },
    Loaded {
        generation: u64,
        quality: Quality,
        result: Result<(), PlaybackError>,
    },
    /// The fresh engine never attached; nothing was loaded
    AttachFailed {
        generation: u64,
        error: PlaybackError,
    },
    TornDown,
}

pub(crate) struct FetchedEpisode {
    pub media: EpisodeMedia,
    /// Present only when the owning video changed
    pub playlist: Option<EpisodePlaylist>,
    pub video: Option<VideoSummary>,
}

pub(crate) async fn fetch_episode(
    catalog: Arc<dyn EpisodeCatalog>,
    episode: EpisodeId,
    known_video: Option<VideoId>,
    timeout: Duration,
) -> Result<FetchedEpisode, PlaybackError> {
    let media =
        match tokio::time::timeout(timeout, catalog.fetch_media(episode)).await
        {
            Err(_) => {
                return Err(PlaybackError::Load {
                    quality: None,
                    reason: format!(
                        "episode fetch timed out after {timeout:?}"
                    ),
                });
            }
            Ok(Err(err)) => return Err(catalog_failure(episode, &err)),
            Ok(Ok(media)) => media,
        };

    if media.episode_id != episode {
        return Err(PlaybackError::CatalogFetch {
            episode,
            reason: format!("catalog answered with episode {}", media.episode_id),
            not_found: false,
        });
    }

    if known_video == Some(media.video_id) {
        return Ok(FetchedEpisode {
            media,
            playlist: None,
            video: None,
        });
    }

    let video_id = media.video_id;
    let (episodes, video) = tokio::join!(
        tokio::time::timeout(timeout, catalog.list_episodes(video_id)),
        tokio::time::timeout(timeout, catalog.fetch_video(video_id)),
    );

    // Neither is needed to play the episode itself
    let episodes = match episodes {
        Ok(Ok(episodes)) => episodes,
        Ok(Err(err)) => {
            log::warn!("[Session] episode list for video {video_id}: {err}");
            Vec::new()
        }
        Err(_) => {
            log::warn!("[Session] episode list for video {video_id} timed out");
            Vec::new()
        }
    };
    let video = match video {
        Ok(Ok(video)) => Some(video),
        Ok(Err(err)) => {
            log::warn!("[Session] video {video_id} details: {err}");
            None
        }
        Err(_) => {
            log::warn!("[Session] video {video_id} details timed out");
            None
        }
    };

    Ok(FetchedEpisode {
        media,
        playlist: Some(EpisodePlaylist::new(video_id, episodes)),
        video,
    })
}

/// Bind a fresh engine to the surface ahead of its first load.
pub(crate) async fn attach(
    engine: &Arc<dyn PlaybackEngine>,
    surface: SurfaceHandle,
    quality: Quality,
) -> Result<(), PlaybackError> {
    engine
        .attach(surface)
        .await
        .map_err(|err| load_failure(quality, &err))
}

pub(crate) async fn load_rendition(
    engine: Arc<dyn PlaybackEngine>,
    rendition: Rendition,
    subtitles: Vec<SubtitleTrack>,
    timeout: Duration,
) -> Result<(), PlaybackError> {
    let quality = rendition.quality;
    match tokio::time::timeout(timeout, engine.load(&rendition)).await {
        Err(_) => {
            return Err(PlaybackError::Load {
                quality: Some(quality),
                reason: format!("{quality} load timed out after {timeout:?}"),
            });
        }
        Ok(Err(err)) => return Err(load_failure(quality, &err)),
        Ok(Ok(())) => {}
    }

    for track in &subtitles {
        if let Err(err) = engine.add_subtitle_track(track).await {
            log::warn!(
                "[Session] subtitle track {} unavailable: {err}",
                track.language_code
            );
        }
    }
    Ok(())
}

pub(crate) async fn tear_down(engine: Arc<dyn PlaybackEngine>) {
    engine.destroy().await;
}

fn catalog_failure(episode: EpisodeId, err: &CatalogError) -> PlaybackError {
    PlaybackError::CatalogFetch {
        episode,
        reason: err.to_string(),
        not_found: err.is_not_found(),
    }
}

fn load_failure(quality: Quality, err: &EngineError) -> PlaybackError {
    PlaybackError::Load {
        quality: Some(quality),
        reason: format!("{quality}: {err}"),
    }
}
