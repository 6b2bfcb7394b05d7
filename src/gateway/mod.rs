//! Agent gateway
//!
//! Single normalized call interface shared by all five remote advisors.
//! The gateway never interprets results; the wizard decides what a
//! successful answer means for each role.

use crate::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod http;
pub mod mock;

pub use http::HttpAgentGateway;
pub use mock::{FailureMode, MockAgentGateway};

/// Correlation context attached to every call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentContext {
    pub session_id: String,
}

/// Normalized response envelope: `{success, response: {status, result}}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub response: Option<AgentPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentPayload {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub result: Value,
}

pub const STATUS_SUCCESS: &str = "success";

impl AgentResponse {
    pub fn success(result: Value) -> Self {
        Self {
            success: true,
            response: Some(AgentPayload {
                status: STATUS_SUCCESS.to_string(),
                result,
            }),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            response: None,
            error: Some(message.into()),
        }
    }

    /// The agent result, only when `success` is set and the status is "success".
    pub fn successful_result(&self) -> Option<&Value> {
        if !self.success {
            return None;
        }
        self.response
            .as_ref()
            .filter(|payload| payload.status == STATUS_SUCCESS)
            .map(|payload| &payload.result)
    }

    /// Decode the successful result into a role-specific shape.
    ///
    /// Agents sometimes deliver the result as a JSON-encoded string; that
    /// form is accepted too.
    pub fn result_as<T: DeserializeOwned>(&self) -> Option<T> {
        let result = self.successful_result()?;
        match result {
            Value::String(text) => serde_json::from_str(text).ok(),
            other => serde_json::from_value(other.clone()).ok(),
        }
    }
}

/// Trait every gateway backend implements
#[async_trait]
pub trait AgentGateway: Send + Sync {
    /// Send `message` to the agent with `agent_id`.
    ///
    /// `Err` means the call never produced an envelope (transport failure);
    /// an envelope with `success = false` is returned as `Ok`.
    async fn invoke(
        &self,
        agent_id: &str,
        message: &str,
        context: &AgentContext,
    ) -> Result<AgentResponse>;
}
