use crate::ids::{EpisodeId, VideoId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Minimal episode row used for ordering within a video.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct EpisodeSummary {
    pub id: EpisodeId,
    pub episode_number: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: String,
}

/// Episodes of one video sorted by episode number ascending.
///
/// Only used to answer "what comes before / after this episode".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodePlaylist {
    video_id: VideoId,
    episodes: Vec<EpisodeSummary>,
}

impl EpisodePlaylist {
    pub fn new(video_id: VideoId, mut episodes: Vec<EpisodeSummary>) -> Self {
        // Stable sort keeps catalog order for duplicate episode numbers
        episodes.sort_by_key(|episode| episode.episode_number);
        Self { video_id, episodes }
    }

    pub fn empty(video_id: VideoId) -> Self {
        Self {
            video_id,
            episodes: Vec::new(),
        }
    }

    pub fn video_id(&self) -> VideoId {
        self.video_id
    }

    pub fn episodes(&self) -> &[EpisodeSummary] {
        &self.episodes
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    pub fn position_of(&self, episode: EpisodeId) -> Option<usize> {
        self.episodes.iter().position(|e| e.id == episode)
    }

    pub fn next_after(&self, episode: EpisodeId) -> Option<&EpisodeSummary> {
        let index = self.position_of(episode)?;
        self.episodes.get(index + 1)
    }

    pub fn previous_before(
        &self,
        episode: EpisodeId,
    ) -> Option<&EpisodeSummary> {
        let index = self.position_of(episode)?;
        index.checked_sub(1).and_then(|i| self.episodes.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: i64, number: i32) -> EpisodeSummary {
        EpisodeSummary {
            id: EpisodeId(id),
            episode_number: number,
            title: format!("Episode {number}"),
        }
    }

    #[test]
    fn neighbours_follow_episode_number_not_catalog_order() {
        let playlist = EpisodePlaylist::new(
            VideoId(7),
            vec![summary(30, 3), summary(10, 1), summary(20, 2)],
        );

        assert_eq!(
            playlist.next_after(EpisodeId(10)).map(|e| e.id),
            Some(EpisodeId(20))
        );
        assert_eq!(
            playlist.previous_before(EpisodeId(30)).map(|e| e.id),
            Some(EpisodeId(20))
        );
        assert!(playlist.previous_before(EpisodeId(10)).is_none());
        assert!(playlist.next_after(EpisodeId(30)).is_none());
    }

    #[test]
    fn unknown_episode_has_no_neighbours() {
        let playlist = EpisodePlaylist::new(VideoId(7), vec![summary(10, 1)]);
        assert!(playlist.next_after(EpisodeId(99)).is_none());
        assert!(playlist.previous_before(EpisodeId(99)).is_none());
    }
}
