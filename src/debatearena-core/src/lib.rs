//! DebateArena Core Library
//!
//! Drives a two-agent debate session: agent selection, the outbound request,
//! the remote debate endpoint, and the paced reveal of each round.

pub mod agent;
pub mod config;
pub mod error;
pub mod request;
pub mod reveal;
pub mod selection;
pub mod session;
pub mod topics;
pub mod transport;

pub use agent::{Agent, AgentCatalog};
pub use config::{Config, default_config};
pub use error::DebateError;
pub use request::{DebateRequest, Speaker, Turn, build_request};
pub use reveal::{Delay, NoDelay, RevealScheduler, TokioDelay};
pub use selection::{AgentSelection, Slot};
pub use session::{DebateSession, SessionCallback, SessionEvent, SessionPhase, SessionView};
pub use topics::{TopicInput, TopicSuggestions};
pub use transport::{DebateTransport, HttpTransport, RoundResult};
