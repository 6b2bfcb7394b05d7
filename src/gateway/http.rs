//! HTTP agent gateway
//!
//! Posts `{message, agent_id, session_id}` to `{base}/api/agent` and reads
//! back the normalized envelope. Uses a long-lived reqwest::Client for
//! connection pooling.

use super::{AgentContext, AgentGateway, AgentResponse};
use crate::error::WizardError;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

const AGENT_PATH: &str = "/api/agent";

#[derive(Debug, Serialize)]
struct AgentCallBody<'a> {
    message: &'a str,
    agent_id: &'a str,
    session_id: &'a str,
}

/// Reusable gateway client (connection-pooled)
pub struct HttpAgentGateway {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpAgentGateway {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, AGENT_PATH)
    }
}

#[async_trait]
impl AgentGateway for HttpAgentGateway {
    async fn invoke(
        &self,
        agent_id: &str,
        message: &str,
        context: &AgentContext,
    ) -> Result<AgentResponse> {
        let body = AgentCallBody {
            message,
            agent_id,
            session_id: &context.session_id,
        };

        debug!(agent_id, session_id = %context.session_id, "Calling agent gateway");

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            error!(agent_id, "Agent gateway request failed: {}", e);
            WizardError::Gateway(format!("request to {} failed: {}", agent_id, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(agent_id, %status, "Agent gateway error response: {}", error_text);
            return Err(WizardError::Gateway(format!(
                "gateway returned {} for {}: {}",
                status, agent_id, error_text
            )));
        }

        let envelope: AgentResponse = response.json().await.map_err(|e| {
            error!(agent_id, "Failed to parse agent gateway response: {}", e);
            WizardError::Gateway(format!("invalid envelope from {}: {}", agent_id, e))
        })?;

        Ok(envelope)
    }
}
