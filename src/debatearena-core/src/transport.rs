//! Transport to the remote debate-generation endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DebateError;
use crate::request::DebateRequest;

/// One debate round as returned by the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    #[serde(rename = "Model1Res", default)]
    pub first_agent_text: String,
    #[serde(rename = "Model2Res", default)]
    pub second_agent_text: String,
}

impl RoundResult {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first_agent_text: first.into(),
            second_agent_text: second.into(),
        }
    }
}

/// Sends a debate request and returns the full batch of rounds.
///
/// Implementations make a single attempt; failures are reported as
/// [`DebateError::Transport`].
#[async_trait]
pub trait DebateTransport: Send + Sync {
    async fn send(&self, request: &DebateRequest) -> Result<Vec<RoundResult>, DebateError>;
}

/// JSON-over-HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Create a transport for `endpoint`. Without a timeout the call waits
    /// indefinitely.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, DebateError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            DebateError::ConfigError(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl DebateTransport for HttpTransport {
    async fn send(&self, request: &DebateRequest) -> Result<Vec<RoundResult>, DebateError> {
        debug!(endpoint = %self.endpoint, rounds = %request.rounds, "Sending debate request");

        let response = self.client.post(&self.endpoint).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DebateError::Transport(status_text(status)));
        }

        let body = response.text().await?;
        parse_rounds(&body)
    }
}

/// The reason phrase for a status, falling back to the numeric code.
fn status_text(status: reqwest::StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

/// Parse a response body into rounds.
///
/// Only requires a JSON array of objects; missing fields read as empty text.
pub fn parse_rounds(body: &str) -> Result<Vec<RoundResult>, DebateError> {
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rounds_in_order() {
        let body = r#"[
            {"Model1Res": "Yes, because...", "Model2Res": "No, because..."},
            {"Model1Res": "Still yes.", "Model2Res": "Still no."}
        ]"#;

        let rounds = parse_rounds(body).unwrap();

        assert_eq!(
            rounds,
            vec![
                RoundResult::new("Yes, because...", "No, because..."),
                RoundResult::new("Still yes.", "Still no."),
            ]
        );
    }

    #[test]
    fn test_parse_rounds_tolerates_missing_fields() {
        let rounds = parse_rounds(r#"[{"Model1Res": "only first", "extra": 1}]"#).unwrap();
        assert_eq!(rounds, vec![RoundResult::new("only first", "")]);
    }

    #[test]
    fn test_parse_rounds_rejects_non_array() {
        let result = parse_rounds(r#"{"detail": "oops"}"#);
        assert!(matches!(result, Err(DebateError::Transport(_))));
    }

    #[test]
    fn test_parse_rounds_rejects_garbage() {
        assert!(matches!(parse_rounds("<html>"), Err(DebateError::Transport(_))));
    }

    #[test]
    fn test_status_text() {
        assert_eq!(
            status_text(reqwest::StatusCode::INTERNAL_SERVER_ERROR),
            "Internal Server Error"
        );
        let unusual = reqwest::StatusCode::from_u16(599).unwrap();
        assert_eq!(status_text(unusual), "599");
    }

    #[test]
    fn test_http_transport_builds() {
        assert!(
            HttpTransport::new("http://localhost:8000/send_answer", Some(Duration::from_secs(5)))
                .is_ok()
        );
        assert!(HttpTransport::new("http://localhost:8000/send_answer", None).is_ok());
    }
}
