//! Debate session state machine.
//!
//! Owns the conversation, the agent selection and the phase. A submission
//! sends one request, then reveals the returned rounds one turn at a time.
//! Every reveal run carries the generation it was started under; steps from
//! an older generation are dropped.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::agent::{Agent, AgentCatalog};
use crate::config::Config;
use crate::error::DebateError;
use crate::request::{Turn, build_request};
use crate::reveal::{PendingTurn, RevealOutcome, RevealScheduler, RevealStep, TokioDelay, plan_reveal};
use crate::selection::{AgentSelection, Slot};
use crate::topics::TopicInput;
use crate::transport::{DebateTransport, HttpTransport};

pub const MIN_ROUNDS: u32 = 1;
pub const MAX_ROUNDS: u32 = 10;
pub const DEFAULT_ROUNDS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Nothing submitted yet; the selection form is shown.
    Empty,
    /// Request in flight.
    Constructing,
    /// Response received, turns being revealed.
    Revealing,
    Complete,
    Errored,
}

impl SessionPhase {
    /// A debate is in flight and cannot be replaced or reset.
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionPhase::Constructing | SessionPhase::Revealing)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Empty => "empty",
            SessionPhase::Constructing => "constructing debate",
            SessionPhase::Revealing => "revealing",
            SessionPhase::Complete => "complete",
            SessionPhase::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Events emitted to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    PhaseChanged(SessionPhase),
    TurnAppended(Turn),
    /// An agent is composing its next turn.
    Typing { agent: Agent, label: String },
    TypingCleared,
    Error(String),
    Warning(String),
}

/// Callback for session events.
pub type SessionCallback = Box<dyn Fn(SessionEvent) + Send + Sync>;

/// Snapshot of everything the presentation layer renders.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub conversation: Vec<Turn>,
    pub typing: Option<Agent>,
    pub last_error: Option<String>,
    pub phase: SessionPhase,
    pub first: Agent,
    pub second: Agent,
    pub rounds: u32,
    pub draft: TopicInput,
    /// Turns fetched but not yet revealed.
    pub pending: usize,
}

struct SessionState {
    conversation: Vec<Turn>,
    selection: AgentSelection,
    rounds: u32,
    phase: SessionPhase,
    pending_reveal: Option<VecDeque<PendingTurn>>,
    typing: Option<Agent>,
    last_error: Option<String>,
    draft: TopicInput,
    generation: u64,
}

impl SessionState {
    fn new(selection: AgentSelection) -> Self {
        Self {
            conversation: Vec::new(),
            selection,
            rounds: DEFAULT_ROUNDS,
            phase: SessionPhase::Empty,
            pending_reveal: None,
            typing: None,
            last_error: None,
            draft: TopicInput::default(),
            generation: 0,
        }
    }

    fn is_pristine(&self) -> bool {
        self.phase == SessionPhase::Empty
            && self.conversation.is_empty()
            && self.last_error.is_none()
            && self.pending_reveal.is_none()
            && self.typing.is_none()
    }
}

/// The debate session. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct DebateSession {
    state: Arc<Mutex<SessionState>>,
    transport: Arc<dyn DebateTransport>,
    scheduler: RevealScheduler,
    callback: Option<Arc<dyn Fn(SessionEvent) + Send + Sync>>,
}

impl DebateSession {
    /// Create a session with the stock catalog and default round count.
    pub fn new(transport: Arc<dyn DebateTransport>, scheduler: RevealScheduler) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::new(AgentSelection::default()))),
            transport,
            scheduler,
            callback: None,
        }
    }

    /// Build a session talking HTTP to the configured endpoint.
    pub fn from_config(config: &Config) -> Result<Self, DebateError> {
        let transport = HttpTransport::new(&config.endpoint.url, config.endpoint.timeout())?;
        let scheduler = RevealScheduler::new(Arc::new(TokioDelay), config.reveal.turn_delay());

        let session = Self::new(Arc::new(transport), scheduler).with_catalog(config.catalog()?);
        session.set_round_count(i64::from(config.session.default_rounds))?;
        Ok(session)
    }

    /// Replace the agent catalog. The first two agents take the slots.
    pub fn with_catalog(self, catalog: AgentCatalog) -> Self {
        self.lock().selection = AgentSelection::new(catalog);
        self
    }

    /// Set a callback for session events.
    pub fn with_callback(mut self, callback: SessionCallback) -> Self {
        self.callback = Some(Arc::from(callback));
        self
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, events: Vec<SessionEvent>) {
        if let Some(ref callback) = self.callback {
            for event in events {
                callback(event);
            }
        }
    }

    pub fn view(&self) -> SessionView {
        let state = self.lock();
        SessionView {
            conversation: state.conversation.clone(),
            typing: state.typing.clone(),
            last_error: state.last_error.clone(),
            phase: state.phase,
            first: state.selection.first().clone(),
            second: state.selection.second().clone(),
            rounds: state.rounds,
            draft: state.draft.clone(),
            pending: state.pending_reveal.as_ref().map_or(0, VecDeque::len),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().phase
    }

    pub fn conversation(&self) -> Vec<Turn> {
        self.lock().conversation.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    pub fn catalog(&self) -> AgentCatalog {
        self.lock().selection.catalog().clone()
    }

    // Agent selection

    pub fn available_for_first(&self) -> Vec<Agent> {
        self.lock().selection.available_for_first()
    }

    pub fn available_for_second(&self) -> Vec<Agent> {
        self.lock().selection.available_for_second()
    }

    pub fn select_first(&self, agent: &Agent) -> Result<(), DebateError> {
        self.select(Slot::First, agent)
    }

    pub fn select_second(&self, agent: &Agent) -> Result<(), DebateError> {
        self.select(Slot::Second, agent)
    }

    pub fn select(&self, slot: Slot, agent: &Agent) -> Result<(), DebateError> {
        let result = self.lock().selection.select(slot, agent);
        if let Err(ref e) = result {
            debug!(slot = slot.display_name(), error = %e, "Agent selection rejected");
        }
        result
    }

    /// Select by agent id or display name.
    pub fn select_by_key(&self, slot: Slot, key: &str) -> Result<(), DebateError> {
        self.lock().selection.select_by_key(slot, key)
    }

    /// Bind both slots by key in one step. A missing key keeps that slot.
    pub fn select_pair_by_key(
        &self,
        first: Option<&str>,
        second: Option<&str>,
    ) -> Result<(), DebateError> {
        let result = self.lock().selection.select_pair_by_key(first, second);
        if let Err(ref e) = result {
            debug!(error = %e, "Agent pair selection rejected");
        }
        result
    }

    pub fn toggle_menu(&self, slot: Slot) {
        self.lock().selection.toggle_menu(slot);
    }

    pub fn is_menu_open(&self, slot: Slot) -> bool {
        self.lock().selection.is_menu_open(slot)
    }

    /// Set the number of rounds. Values outside 1-10 are rejected and the
    /// previous value is kept.
    pub fn set_round_count(&self, value: i64) -> Result<(), DebateError> {
        let rounds = u32::try_from(value)
            .ok()
            .filter(|r| (MIN_ROUNDS..=MAX_ROUNDS).contains(r))
            .ok_or(DebateError::InvalidRoundCount {
                value,
                min: MIN_ROUNDS,
                max: MAX_ROUNDS,
            })?;
        self.lock().rounds = rounds;
        Ok(())
    }

    pub fn round_count(&self) -> u32 {
        self.lock().rounds
    }

    // Topic input

    /// Pre-fill the topic from a suggestion and lock it.
    pub fn pick_topic(&self, topic: impl Into<String>) {
        self.lock().draft.pick_suggestion(topic);
    }

    /// Replace the topic text. Always releases a suggestion lock.
    pub fn edit_topic(&self, text: impl Into<String>) {
        self.lock().draft.edit(text);
    }

    pub fn draft(&self) -> TopicInput {
        self.lock().draft.clone()
    }

    /// Submit the current draft, clearing it.
    pub async fn submit_draft(&self) -> Result<SessionPhase, DebateError> {
        let topic = {
            let mut state = self.lock();
            if state.phase.is_busy() {
                return Err(DebateError::SessionBusy(state.phase));
            }
            state.draft.take()
        };
        self.submit(topic).await
    }

    /// Start a debate on `topic` and drive it to completion.
    ///
    /// The user's turn is in the conversation before the request is sent.
    /// Returns the phase the session ended in.
    pub async fn submit(&self, topic: impl Into<String>) -> Result<SessionPhase, DebateError> {
        let topic = topic.into();

        let (request, token, first, second, rounds) = {
            let mut state = self.lock();
            if state.phase.is_busy() {
                return Err(DebateError::SessionBusy(state.phase));
            }

            let first = state.selection.first().clone();
            let second = state.selection.second().clone();
            let request =
                match build_request(&state.conversation, &first, &second, state.rounds, &topic) {
                    Ok(request) => request,
                    Err(e) => {
                        state.last_error = Some(e.to_string());
                        drop(state);
                        self.emit(vec![SessionEvent::Error(e.to_string())]);
                        return Err(e);
                    }
                };

            state.generation += 1;
            state.last_error = None;
            state.pending_reveal = None;
            state.typing = None;
            state.conversation.clear();
            state.conversation.push(Turn::user(topic.clone()));
            state.phase = SessionPhase::Constructing;

            (request, state.generation, first, second, state.rounds)
        };
        let _in_flight = InFlight {
            session: self,
            token,
        };

        info!(
            first = %first.name,
            second = %second.name,
            rounds,
            "Constructing debate"
        );
        self.emit(vec![
            SessionEvent::TurnAppended(Turn::user(topic)),
            SessionEvent::PhaseChanged(SessionPhase::Constructing),
        ]);

        let batch = match self.transport.send(&request).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!(error = %e, "Debate request failed");
                self.fail(token, &e);
                return Err(e);
            }
        };

        let plan = plan_reveal(&first, &second, &batch, rounds as usize);
        {
            let mut state = self.lock();
            if state.generation != token {
                return Ok(state.phase);
            }
            state.pending_reveal = Some(plan.turns.clone());
            state.phase = SessionPhase::Revealing;
        }

        let mut events = vec![SessionEvent::PhaseChanged(SessionPhase::Revealing)];
        if let Some(mismatch) = plan.mismatch {
            events.push(SessionEvent::Warning(mismatch.message()));
        }
        self.emit(events);

        let outcome = self
            .scheduler
            .run(plan.turns, |step| self.apply_step(token, step))
            .await;

        match outcome {
            RevealOutcome::Completed { turns } => {
                {
                    let mut state = self.lock();
                    if state.generation != token {
                        return Ok(state.phase);
                    }
                    state.pending_reveal = None;
                    state.typing = None;
                    state.phase = SessionPhase::Complete;
                }
                info!(turns, "Debate complete");
                self.emit(vec![SessionEvent::PhaseChanged(SessionPhase::Complete)]);
                Ok(SessionPhase::Complete)
            }
            RevealOutcome::Cancelled { .. } => Ok(self.phase()),
        }
    }

    /// Settle a debate whose `submit` future was dropped mid-flight.
    fn abandon(&self, token: u64) {
        let had_typing = {
            let mut state = self.lock();
            if state.generation != token || !state.phase.is_busy() {
                return;
            }
            state.generation += 1;
            state.pending_reveal = None;
            state.last_error = Some(DebateError::Interrupted.to_string());
            state.phase = SessionPhase::Errored;
            state.typing.take().is_some()
        };

        warn!(token, "Debate abandoned before it finished");
        let mut events = Vec::new();
        if had_typing {
            events.push(SessionEvent::TypingCleared);
        }
        events.push(SessionEvent::Error(DebateError::Interrupted.to_string()));
        events.push(SessionEvent::PhaseChanged(SessionPhase::Errored));
        self.emit(events);
    }

    fn fail(&self, token: u64, error: &DebateError) {
        {
            let mut state = self.lock();
            if state.generation != token {
                return;
            }
            state.last_error = Some(error.to_string());
            state.phase = SessionPhase::Errored;
        }
        self.emit(vec![
            SessionEvent::Error(error.to_string()),
            SessionEvent::PhaseChanged(SessionPhase::Errored),
        ]);
    }

    /// Apply one reveal step. Returns `false` when `token` is stale.
    fn apply_step(&self, token: u64, step: RevealStep) -> bool {
        let event = {
            let mut state = self.lock();
            if state.generation != token {
                warn!(token, current = state.generation, "Dropping stale reveal step");
                return false;
            }

            match step {
                RevealStep::Typing(agent) => {
                    debug!(agent = %agent.name, "Typing");
                    state.typing = Some(agent.clone());
                    SessionEvent::Typing {
                        label: agent.typing_label(),
                        agent,
                    }
                }
                RevealStep::Append(pending) => {
                    if let Some(queue) = state.pending_reveal.as_mut() {
                        queue.pop_front();
                    }
                    let turn = Turn::agent(pending.agent, pending.text);
                    state.conversation.push(turn.clone());
                    SessionEvent::TurnAppended(turn)
                }
                RevealStep::ClearTyping => {
                    state.typing = None;
                    SessionEvent::TypingCleared
                }
            }
        };
        self.emit(vec![event]);
        true
    }

    /// Return to `Empty` with an empty conversation.
    ///
    /// Rejected while a debate is constructing or revealing.
    pub fn reset_session(&self) -> Result<(), DebateError> {
        {
            let mut state = self.lock();
            if state.phase.is_busy() {
                return Err(DebateError::SessionBusy(state.phase));
            }
            if state.is_pristine() {
                return Ok(());
            }

            state.generation += 1;
            state.conversation.clear();
            state.pending_reveal = None;
            state.typing = None;
            state.last_error = None;
            state.phase = SessionPhase::Empty;
        }
        debug!("Session reset");
        self.emit(vec![SessionEvent::PhaseChanged(SessionPhase::Empty)]);
        Ok(())
    }
}

/// Lives for the body of `submit`. If the future is dropped while its debate
/// is still in flight, the session moves to `Errored` instead of staying busy.
struct InFlight<'a> {
    session: &'a DebateSession,
    token: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.session.abandon(self.token);
    }
}
