//! Process configuration
//!
//! Read once at startup from the environment (after loading `.env`).

use crate::error::WizardError;
use crate::gateway::{AgentGateway, HttpAgentGateway, MockAgentGateway};
use crate::state::{self, SessionStore};
use crate::wizard::WizardConfig;
use crate::Result;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_AGENT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_STATE_PATH: &str = "./moneyCommanderState.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// Unset means the offline mock gateway.
    pub agent_base_url: Option<String>,
    pub agent_api_key: Option<String>,
    pub agent_timeout: Duration,
    pub state_path: PathBuf,
    pub database_url: Option<String>,
    pub wizard: WizardConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            agent_base_url: None,
            agent_api_key: None,
            agent_timeout: Duration::from_secs(DEFAULT_AGENT_TIMEOUT_SECS),
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            database_url: None,
            wizard: WizardConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => parse_number("PORT", &raw)?,
            None => defaults.port,
        };

        let agent_timeout = match get("AGENT_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number("AGENT_TIMEOUT_SECS", &raw)?),
            None => defaults.agent_timeout,
        };

        let include_landing = match get("WIZARD_INCLUDE_LANDING") {
            Some(raw) => parse_flag("WIZARD_INCLUDE_LANDING", &raw)?,
            None => defaults.wizard.include_landing,
        };

        Ok(Self {
            port,
            agent_base_url: get("AGENT_API_BASE_URL"),
            agent_api_key: get("AGENT_API_KEY"),
            agent_timeout,
            state_path: get("SESSION_STATE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_path),
            database_url: get("POSTGRES_URL").or_else(|| get("DATABASE_URL")),
            wizard: WizardConfig { include_landing },
        })
    }

    /// HTTP gateway when an endpoint is configured, the mock otherwise.
    pub fn build_gateway(&self) -> Result<Arc<dyn AgentGateway>> {
        match &self.agent_base_url {
            Some(url) => {
                let gateway =
                    HttpAgentGateway::new(url, self.agent_api_key.clone(), self.agent_timeout)?;
                info!(endpoint = %gateway.endpoint(), "Agent gateway: http");
                Ok(Arc::new(gateway))
            }
            None => {
                warn!("AGENT_API_BASE_URL not set; using the offline mock gateway");
                Ok(Arc::new(MockAgentGateway::new()))
            }
        }
    }

    pub fn build_store(&self) -> Arc<dyn SessionStore> {
        state::build_store(self.database_url.as_deref(), &self.state_path)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| WizardError::ConfigError(format!("{} must be a number, got {:?}", key, raw)))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(WizardError::ConfigError(format!(
            "{} must be true or false, got {:?}",
            key, raw
        ))),
    }
}
