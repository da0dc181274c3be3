use async_trait::async_trait;
use log::{debug, error};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::{Batch, Config, ConfigError};

/// Path of create notification API. <https://documentation.onesignal.com/reference/create-notification>
pub const NOTIFICATIONS_PATH: &str = "api/v1/notifications";

/// Failure of one outbound batch.
#[derive(Error, Debug)]
pub enum TransportError {
    /// OneSignal responded with status code 299 or above.
    #[error("OneSignal error: status {status}, body {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
    /// Error connecting to OneSignal, from [`reqwest`] crate.
    #[error("error connecting to OneSignal: {0}")]
    Network(#[from] reqwest::Error),
}

/// Submits one [`Batch`] to OneSignal.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Returns `Ok` when OneSignal accepts the batch.
    async fn submit(&self, batch: &Batch<'_>) -> Result<(), TransportError>;
}

#[derive(Serialize)]
struct Envelope<'a> {
    app_id: &'a str,
    #[serde(flatten)]
    batch: &'a Batch<'a>,
}

/// [`Transport`] over HTTPS with [`reqwest`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
    app_id: String,
    authorization: String,
}

impl HttpTransport {
    /// Creates a [`HttpTransport`] from [`Config`].
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            endpoint: config.base_url().join(NOTIFICATIONS_PATH)?,
            app_id: config.app_id().to_string(),
            authorization: format!("Basic {}", config.api_key()),
        })
    }

    /// URL which batches are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn submit(&self, batch: &Batch<'_>) -> Result<(), TransportError> {
        let envelope = Envelope {
            app_id: &self.app_id,
            batch,
        };
        debug!("post {} tokens to {}", batch.len(), self.endpoint);
        let res = self
            .client
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, &self.authorization)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| {
                error!("error connecting to OneSignal: {e}");
                TransportError::Network(e)
            })?;

        let status = res.status().as_u16();
        if status < 299 {
            return Ok(());
        }
        let body = res.text().await.unwrap_or_else(|e| {
            error!("failed to read response body from OneSignal: {e}");
            String::new()
        });
        error!("OneSignal error: status {status}, body {body}");
        Err(TransportError::Status { status, body })
    }
}
