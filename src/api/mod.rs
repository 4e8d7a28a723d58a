/// REST client for the dashboard backend
///
/// This module handles:
/// - The shared `Client` (base URL + bearer token over reqwest)
/// - Response envelope decoding and the error taxonomy
/// - Typed endpoint wrappers (auth.rs, storage.rs, people.rs)
/// - Multipart upload with a live progress stream (upload.rs)

pub mod auth;
pub mod people;
pub mod storage;
pub mod upload;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::error;

/// Errors surfaced by API calls. All variants degrade to an inline
/// message in the UI; nothing is retried automatically.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Transport-level failure (connection refused, DNS, TLS, timeout)
    #[error("network error: {0}")]
    Http(String),
    /// The server answered with a non-success status
    #[error("{message}")]
    Status { code: u16, message: String },
    /// The body did not match the expected shape
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { code: 404, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Http(err.to_string())
        }
    }
}

/// Standard `{ "data": ... }` envelope the backend wraps payloads in.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

/// Error body shape: `{ "message": "..." }`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl Client {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub(crate) fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.apply_auth(self.http.get(self.url(path)))
    }

    pub(crate) fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.apply_auth(self.http.post(self.url(path)))
    }

    pub(crate) fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.apply_auth(self.http.put(self.url(path)))
    }

    pub(crate) fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.apply_auth(self.http.delete(self.url(path)))
    }

    /// Send a request and decode the enveloped payload.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let response = Self::check_status(response).await?;
        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.data)
    }

    /// Send a request, checking only the status.
    pub(crate) async fn send_unit(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<(), ApiError> {
        let response = builder.send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // Prefer the backend's own message when it sends one.
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });

        error!("api request failed with {status}: {message}");
        Err(ApiError::Status {
            code: status.as_u16(),
            message,
        })
    }

    /// Fetch raw bytes from an absolute URL (thumbnails, photos,
    /// profile pictures served from object storage).
    pub async fn fetch_bytes(self, url: String) -> Result<Vec<u8>, ApiError> {
        let response = self.http.get(&url).send().await?;
        let response = Self::check_status(response).await?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
