use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use showreel_config::ServerConfig;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),

    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err)
        }
    }
}

/// JSON client for the catalog server
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    /// Always ends with `/` so relative joins keep any path prefix
    base_url: Url,
    auth_token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("has_token", &self.auth_token.is_some())
            .finish()
    }
}

impl ApiClient {
    pub fn new(server: &ServerConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(server.request_timeout)
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self::with_client(
            client,
            server.base_url.clone(),
            server.auth_token.clone(),
        ))
    }

    pub fn with_client(
        client: Client,
        mut base_url: Url,
        auth_token: Option<String>,
    ) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        log::info!("[Catalog] API client for {base_url}");
        Self {
            client,
            base_url,
            auth_token,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an API path such as `/api/episodes/3` against the base url.
    pub fn build_url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ApiError> {
        let url = self.build_url(path)?;
        log::debug!("[Catalog] GET {url}");
        let request = self.authorize(self.client.get(url));
        let response = Self::check(request).await?;
        response.json::<T>().await.map_err(ApiError::from_reqwest)
    }

    /// POST a JSON body; the response body is ignored.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let url = self.build_url(path)?;
        log::debug!("[Catalog] POST {url}");
        let request = self.authorize(self.client.post(url).json(body));
        Self::check(request).await?;
        Ok(())
    }

    async fn check(
        request: RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        let response =
            request.send().await.map_err(ApiError::from_reqwest)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ApiError::Status {
            status: status.as_u16(),
            message: truncate(message, 200),
        })
    }
}

fn truncate(mut message: String, limit: usize) -> String {
    if message.len() > limit {
        let mut cut = limit;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
        message.push('…');
    }
    message
}
