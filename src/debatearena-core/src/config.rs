//! Configuration module for loading TOML config files.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::agent::{Agent, AgentCatalog, default_agents};
use crate::error::DebateError;
use crate::session::{MAX_ROUNDS, MIN_ROUNDS};
use crate::topics::default_topics;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/send_answer";

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub reveal: RevealConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default = "default_agents")]
    pub agents: Vec<Agent>,
    #[serde(default = "default_topics")]
    pub topics: Vec<String>,
}

/// Remote debate endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub url: String,
    /// Request timeout. Absent means wait indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: None,
        }
    }
}

impl EndpointConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevealConfig {
    pub turn_delay_ms: u64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            turn_delay_ms: 10_000,
        }
    }
}

impl RevealConfig {
    pub fn turn_delay(&self) -> Duration {
        Duration::from_millis(self.turn_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub default_rounds: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { default_rounds: 3 }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DebateError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| DebateError::ConfigError(format!("Failed to read config: {}", e)))?;

        Self::from_str(&content)
    }

    /// Load configuration from string content.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, DebateError> {
        let config: Config = toml::from_str(content)
            .map_err(|e| DebateError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DebateError> {
        if !(MIN_ROUNDS..=MAX_ROUNDS).contains(&self.session.default_rounds) {
            return Err(DebateError::ConfigError(format!(
                "default_rounds must be {}-{}, got {}",
                MIN_ROUNDS, MAX_ROUNDS, self.session.default_rounds
            )));
        }
        AgentCatalog::new(self.agents.clone())?;
        Ok(())
    }

    pub fn catalog(&self) -> Result<AgentCatalog, DebateError> {
        AgentCatalog::new(self.agents.clone())
    }

    /// Replace the endpoint URL from `DEBATEARENA_ENDPOINT` if it is set.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("DEBATEARENA_ENDPOINT") {
            if !url.is_empty() {
                self.endpoint.url = url;
            }
        }
    }
}

/// Default configuration embedded in the binary.
pub fn default_config() -> Config {
    Config {
        endpoint: EndpointConfig::default(),
        reveal: RevealConfig::default(),
        session: SessionConfig::default(),
        agents: default_agents(),
        topics: default_topics(),
    }
}
