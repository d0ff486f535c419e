use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::domain::Door;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Status and body text returned by the door service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorResponse {
    pub status: u16,
    pub body: String,
}

impl DoorResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response (connection refused, DNS, timeout).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(value: reqwest::Error) -> Self {
        Self::new(value.to_string())
    }
}

#[async_trait]
pub trait DoorApi: Send + Sync {
    /// Issues exactly one open request for `door`.
    async fn open(&self, door: Door) -> Result<DoorResponse, TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

/// [`DoorApi`] backed by the door service's HTTP endpoints.
pub struct HttpDoorApi {
    http: Client,
    base_url: Url,
    credentials: Option<Credentials>,
}

impl HttpDoorApi {
    pub fn new(
        server_url: &str,
        credentials: Option<Credentials>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let base_url = Url::parse(server_url.trim())
            .with_context(|| format!("invalid door service url '{server_url}'"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "door service url must use http or https, got '{}'",
                base_url.scheme()
            );
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Endpoint paths are absolute, so they replace any path on the base url.
    pub fn endpoint_url(&self, door: Door) -> Result<Url, TransportError> {
        self.base_url
            .join(door.endpoint())
            .map_err(|e| TransportError::new(format!("invalid endpoint url: {e}")))
    }
}

#[async_trait]
impl DoorApi for HttpDoorApi {
    async fn open(&self, door: Door) -> Result<DoorResponse, TransportError> {
        let url = self.endpoint_url(door)?;
        let mut request = self.http.post(url);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, credentials.password.as_deref());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(error) => {
                warn!(%door, status, %error, "failed to read door service response body");
                String::new()
            }
        };
        debug!(%door, status, "door service responded");

        Ok(DoorResponse { status, body })
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
