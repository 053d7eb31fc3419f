use crate::ids::{EpisodeId, UserId, VideoId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Outbound watch-progress checkpoint for the history collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProgressRecord {
    pub user_id: UserId,
    pub video_id: VideoId,
    pub episode_id: EpisodeId,
    /// Whole seconds, floored
    pub position_seconds: u64,
}

/// Owning video context shown alongside playback.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VideoSummary {
    pub id: VideoId,
    pub category_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
}
