use async_trait::async_trait;
use showreel_contracts::{HistoryError, HistorySink};
use showreel_model::{ProgressRecord, ProgressRequest};

use crate::infra::api_client::{ApiClient, ApiError};

/// Posts progress records to `/api/history`
#[derive(Debug, Clone)]
pub struct HttpHistory {
    client: ApiClient,
}

impl HttpHistory {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HistorySink for HttpHistory {
    async fn record_progress(
        &self,
        record: ProgressRecord,
    ) -> Result<(), HistoryError> {
        let body = ProgressRequest::from(&record);
        self.client
            .post_json("/api/history", &body)
            .await
            .map_err(|err| match err {
                ApiError::Status { status, .. } => {
                    HistoryError::Rejected { status }
                }
                other => HistoryError::Transport(other.to_string()),
            })
    }
}
