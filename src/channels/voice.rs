//! Voice-agent provisioning client.
//!
//! Given an interview name and description, the provisioning service
//! returns an opaque agent id. Failures here are never fatal upstream —
//! the interview is created without an agent.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::debug;

use crate::channels::VoiceAgentProvisioner;
use crate::config::{FETCH_TIMEOUT, VoiceAgentConfig};
use crate::error::TransportError;

/// HTTP implementation of the voice-agent provisioning collaborator.
pub struct HttpVoiceProvisioner {
    config: VoiceAgentConfig,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ProvisionResponse {
    agent_id: String,
}

impl HttpVoiceProvisioner {
    pub fn new(config: VoiceAgentConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl VoiceAgentProvisioner for HttpVoiceProvisioner {
    async fn provision(
        &self,
        name: &str,
        description: &str,
    ) -> Result<String, TransportError> {
        let response = self
            .http
            .post(format!("{}/agents", self.config.base_url))
            .timeout(FETCH_TIMEOUT)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&serde_json::json!({
                "name": name,
                "description": description,
            }))
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TransportError::Http(format!(
                "provisioning returned {}",
                response.status()
            )));
        }

        let provisioned: ProvisionResponse =
            response
                .json()
                .await
                .map_err(|e| TransportError::InvalidResponse {
                    name: "voice-agent".into(),
                    reason: e.to_string(),
                })?;

        debug!(agent_id = %provisioned.agent_id, interview = name, "Voice agent provisioned");
        Ok(provisioned.agent_id)
    }
}
