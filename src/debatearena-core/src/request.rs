//! Conversation turns and the outbound debate request.

use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::error::DebateError;

/// Who spoke a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Speaker {
    User,
    Agent(Agent),
}

/// A single entry in the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn agent(agent: Agent, text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Agent(agent),
            text: text.into(),
        }
    }

    /// Wire role: agent turns travel as `system`.
    pub fn role(&self) -> &'static str {
        match self.speaker {
            Speaker::User => "user",
            Speaker::Agent(_) => "system",
        }
    }

    pub fn agent_name(&self) -> Option<&str> {
        match &self.speaker {
            Speaker::User => None,
            Speaker::Agent(agent) => Some(&agent.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

/// Body of the POST sent to the debate endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateRequest {
    pub messages: Vec<WireMessage>,
    /// Display name of the first agent.
    pub model1: String,
    /// Display name of the second agent.
    pub model2: String,
    /// Round count, encoded as a decimal string.
    pub rounds: String,
}

/// Assemble the request for a new topic.
///
/// Turns with empty content are dropped; the endpoint never receives an empty
/// `content` field.
pub fn build_request(
    conversation: &[Turn],
    first: &Agent,
    second: &Agent,
    rounds: u32,
    topic: &str,
) -> Result<DebateRequest, DebateError> {
    if topic.is_empty() {
        return Err(DebateError::Validation("Please enter a message.".to_string()));
    }

    let messages = conversation
        .iter()
        .map(|turn| WireMessage {
            role: turn.role().to_string(),
            content: turn.text.clone(),
        })
        .chain(std::iter::once(WireMessage {
            role: "user".to_string(),
            content: topic.to_string(),
        }))
        .filter(|msg| !msg.content.is_empty())
        .collect();

    Ok(DebateRequest {
        messages,
        model1: first.name.clone(),
        model2: second.name.clone(),
        rounds: rounds.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn agents() -> (Agent, Agent) {
        (
            Agent::new("ChatGPT", "gpt-3.5-turbo"),
            Agent::new("Gemini", "gemini-1.5-pro"),
        )
    }

    #[test]
    fn test_build_request_wire_shape() {
        let (first, second) = agents();
        let request = build_request(&[], &first, &second, 3, "Is AI a threat?").unwrap();

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "messages": [{"role": "user", "content": "Is AI a threat?"}],
                "model1": "ChatGPT",
                "model2": "Gemini",
                "rounds": "3"
            })
        );
    }

    #[test]
    fn test_build_request_keeps_history_in_order() {
        let (first, second) = agents();
        let history = vec![
            Turn::user("Old topic"),
            Turn::agent(first.clone(), "For it."),
            Turn::agent(second.clone(), "Against it."),
        ];

        let request = build_request(&history, &first, &second, 1, "New topic").unwrap();

        let roles: Vec<_> = request.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["user", "system", "system", "user"]);
        assert_eq!(request.messages[3].content, "New topic");
    }

    #[test]
    fn test_build_request_drops_empty_content() {
        let (first, second) = agents();
        let history = vec![
            Turn::user(""),
            Turn::agent(first.clone(), ""),
            Turn::agent(second.clone(), "kept"),
        ];

        let request = build_request(&history, &first, &second, 2, "Topic").unwrap();

        assert_eq!(request.messages.len(), 2);
        assert!(request.messages.iter().all(|m| !m.content.is_empty()));
    }

    #[test]
    fn test_build_request_rejects_empty_topic() {
        let (first, second) = agents();
        let result = build_request(&[Turn::user("history")], &first, &second, 2, "");
        assert!(matches!(result, Err(DebateError::Validation(_))));
    }

    #[test]
    fn test_rounds_encoded_as_string() {
        let (first, second) = agents();
        let request = build_request(&[], &first, &second, 10, "Topic").unwrap();
        assert_eq!(request.rounds, "10");
    }
}
