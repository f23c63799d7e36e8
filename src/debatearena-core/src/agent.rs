//! Debate agent definitions.
//!
//! The catalog is fixed at process start; agents are compared by `id`.

use serde::{Deserialize, Serialize};

use crate::error::DebateError;

/// A debate participant that can be assigned to either side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Display name, also sent on the wire as `model1`/`model2`.
    pub name: String,
    /// Stable identity of the agent.
    pub id: String,
    /// Advisory availability flag. Not enforced by the session.
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl Agent {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            available: true,
        }
    }

    /// Mark the agent as unavailable.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Label shown while this agent's turn is pending.
    pub fn typing_label(&self) -> String {
        format!("{} is typing...", self.name)
    }
}

impl PartialEq for Agent {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Agent {}

/// The static set of selectable agents.
#[derive(Debug, Clone)]
pub struct AgentCatalog {
    agents: Vec<Agent>,
}

impl AgentCatalog {
    /// Build a catalog. Needs at least two agents with distinct ids.
    pub fn new(agents: Vec<Agent>) -> Result<Self, DebateError> {
        if agents.len() < 2 {
            return Err(DebateError::ConfigError(format!(
                "At least 2 agents are required, got {}",
                agents.len()
            )));
        }

        for (i, agent) in agents.iter().enumerate() {
            if agents[..i].iter().any(|a| a.id == agent.id) {
                return Err(DebateError::ConfigError(format!(
                    "Duplicate agent id '{}'",
                    agent.id
                )));
            }
        }

        Ok(Self { agents })
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Look up an agent by id or display name (case-insensitive).
    pub fn find(&self, key: &str) -> Option<&Agent> {
        self.agents
            .iter()
            .find(|a| a.id == key)
            .or_else(|| self.agents.iter().find(|a| a.name.eq_ignore_ascii_case(key)))
    }
}

impl Default for AgentCatalog {
    fn default() -> Self {
        Self {
            agents: default_agents(),
        }
    }
}

/// The stock catalog: ChatGPT, Gemini and Claude.
pub fn default_agents() -> Vec<Agent> {
    vec![
        Agent::new("ChatGPT", "gpt-3.5-turbo"),
        Agent::new("Gemini", "gemini-1.5-pro"),
        Agent::new("Claude", "claude-3-5-sonnet-20240620"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agents_compare_by_id() {
        let a = Agent::new("ChatGPT", "gpt-3.5-turbo");
        let b = Agent::new("Renamed", "gpt-3.5-turbo").unavailable();
        assert_eq!(a, b);
        assert_ne!(a, Agent::new("ChatGPT", "gpt-4o"));
    }

    #[test]
    fn test_find_by_id_or_name() {
        let catalog = AgentCatalog::default();
        assert_eq!(catalog.find("gemini-1.5-pro").unwrap().name, "Gemini");
        assert_eq!(catalog.find("claude").unwrap().id, "claude-3-5-sonnet-20240620");
        assert!(catalog.find("llama").is_none());
    }

    #[test]
    fn test_catalog_rejects_single_agent() {
        let result = AgentCatalog::new(vec![Agent::new("Solo", "solo")]);
        assert!(matches!(result, Err(DebateError::ConfigError(_))));
    }

    #[test]
    fn test_catalog_rejects_duplicate_ids() {
        let result = AgentCatalog::new(vec![
            Agent::new("One", "same"),
            Agent::new("Two", "same"),
        ]);
        assert!(matches!(result, Err(DebateError::ConfigError(_))));
    }

    #[test]
    fn test_typing_label() {
        assert_eq!(Agent::new("Claude", "c").typing_label(), "Claude is typing...");
    }
}
