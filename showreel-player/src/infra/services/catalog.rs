use async_trait::async_trait;
use showreel_contracts::{CatalogError, EpisodeCatalog};
use showreel_model::{
    EpisodeId, EpisodeMedia, EpisodeRecord, EpisodeSummary, VideoId,
    VideoRecord, VideoSummary,
};

use crate::infra::api_client::{ApiClient, ApiError};

/// Catalog backed by the server's JSON routes
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: ApiClient,
}

impl HttpCatalog {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EpisodeCatalog for HttpCatalog {
    async fn fetch_media(
        &self,
        episode: EpisodeId,
    ) -> Result<EpisodeMedia, CatalogError> {
        let record: EpisodeRecord = self
            .client
            .get_json(&format!("/api/episodes/{episode}"))
            .await
            .map_err(|err| catalog_error(err, || format!("episode {episode}")))?;

        if record.id != episode {
            return Err(CatalogError::Malformed(format!(
                "requested episode {episode}, got {}",
                record.id
            )));
        }
        Ok(EpisodeMedia::from(record))
    }

    async fn list_episodes(
        &self,
        video: VideoId,
    ) -> Result<Vec<EpisodeSummary>, CatalogError> {
        self.client
            .get_json(&format!("/api/videos/{video}/episodes"))
            .await
            .map_err(|err| catalog_error(err, || format!("video {video}")))
    }

    async fn fetch_video(
        &self,
        video: VideoId,
    ) -> Result<VideoSummary, CatalogError> {
        let record: VideoRecord = self
            .client
            .get_json(&format!("/api/videos/{video}"))
            .await
            .map_err(|err| catalog_error(err, || format!("video {video}")))?;
        Ok(record.into())
    }
}

pub(crate) fn catalog_error(
    err: ApiError,
    subject: impl FnOnce() -> String,
) -> CatalogError {
    match err {
        err if err.is_not_found() => CatalogError::NotFound(subject()),
        ApiError::Status { status, .. } => CatalogError::Http { status },
        ApiError::Transport(err) | ApiError::Client(err) => {
            CatalogError::Transport(err.to_string())
        }
        ApiError::Decode(message) => CatalogError::Decode(message),
        ApiError::Url(err) => CatalogError::Malformed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_status_maps_to_not_found() {
        let err = catalog_error(
            ApiError::Status {
                status: 404,
                message: String::new(),
            },
            || "episode 9".into(),
        );
        assert_eq!(err, CatalogError::NotFound("episode 9".into()));
        assert!(err.is_not_found());
    }

    #[test]
    fn other_statuses_keep_the_code() {
        let err = catalog_error(
            ApiError::Status {
                status: 503,
                message: "busy".into(),
            },
            || unreachable!(),
        );
        assert_eq!(err, CatalogError::Http { status: 503 });
    }

    #[test]
    fn decode_failures_stay_decode_failures() {
        let err = catalog_error(ApiError::Decode("eof".into()), String::new);
        assert_eq!(err, CatalogError::Decode("eof".into()));
    }
}
