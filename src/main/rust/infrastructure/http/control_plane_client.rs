use async_trait::async_trait;
use tracing::debug;

use super::wire::{RegisterBody, RegisterReply};
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::ControlPlane;
use crate::domain::value_objects::{ControlPlaneConfig, MediaConfig, StreamRegistration};

/// Control-plane adapter over HTTP/JSON.
///
/// reqwest never retries on its own and no timeout is configured, so each call
/// is exactly one attempt bounded only by the TCP stack.
pub struct HttpControlPlane {
    config: ControlPlaneConfig,
    client: reqwest::Client,
}

impl HttpControlPlane {
    pub fn new(config: ControlPlaneConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn register(&self, media: &MediaConfig) -> Result<StreamRegistration> {
        let url = self.config.streams_url();
        let body = RegisterBody::for_now(&self.config, media);
        debug!(url = %url, title = %body.title, "Sending register request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::ControlPlaneUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // A JSON rejection is still a rejection, whatever the HTTP status
            return match response.json::<RegisterReply>().await {
                Ok(reply) if reply.status != 0 => reply.into_registration(&self.config),
                _ => Err(DomainError::ControlPlaneUnavailable(format!("HTTP {}", status))),
            };
        }

        let reply: RegisterReply = response
            .json()
            .await
            .map_err(|e| DomainError::MalformedReply(e.to_string()))?;

        reply.into_registration(&self.config)
    }

    async fn deregister(&self, stream_id: i64) -> Result<()> {
        let url = self.config.stream_url(stream_id);
        debug!(url = %url, stream_id, "Sending kill request");

        let response = self
            .client
            .patch(&url)
            .send()
            .await
            .map_err(|e| DomainError::DeregistrationFailed {
                stream_id,
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(DomainError::DeregistrationFailed {
                stream_id,
                reason: format!("HTTP {}", response.status()),
            });
        }

        Ok(())
    }
}
