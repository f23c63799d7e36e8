//! Paced reveal of an already-fetched batch of rounds.
//!
//! The scheduler never touches the conversation itself. It hands each step
//! to the caller, which applies it and reports whether the run is still
//! current. A `false` answer stops the run with no further steps.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::agent::Agent;
use crate::transport::RoundResult;

/// Simulated latency before each agent turn.
pub const DEFAULT_TURN_DELAY: Duration = Duration::from_secs(10);

/// Suspends the reveal between steps.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}

/// Real wall-clock delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Delay for NoDelay {
    async fn wait(&self, _duration: Duration) {}
}

/// A turn waiting to be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    pub agent: Agent,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealStep {
    Typing(Agent),
    Append(PendingTurn),
    ClearTyping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Completed { turns: usize },
    Cancelled { turns: usize },
}

/// Ordered turns to reveal, plus the batch-size mismatch if there was one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealPlan {
    pub turns: VecDeque<PendingTurn>,
    pub mismatch: Option<BatchMismatch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchMismatch {
    pub requested: usize,
    pub received: usize,
}

impl BatchMismatch {
    pub fn message(&self) -> String {
        format!(
            "Requested {} rounds but received {}; showing {}.",
            self.requested,
            self.received,
            self.requested.min(self.received)
        )
    }
}

/// Flatten rounds into alternating first/second turns.
///
/// Exactly `min(requested, received)` rounds are kept.
pub fn plan_reveal(
    first: &Agent,
    second: &Agent,
    rounds: &[RoundResult],
    requested: usize,
) -> RevealPlan {
    let mismatch = (rounds.len() != requested).then(|| BatchMismatch {
        requested,
        received: rounds.len(),
    });
    if let Some(m) = &mismatch {
        warn!(requested = m.requested, received = m.received, "Round batch size mismatch");
    }

    let turns = rounds
        .iter()
        .take(requested)
        .flat_map(|round| {
            [
                PendingTurn {
                    agent: first.clone(),
                    text: round.first_agent_text.clone(),
                },
                PendingTurn {
                    agent: second.clone(),
                    text: round.second_agent_text.clone(),
                },
            ]
        })
        .collect();

    RevealPlan { turns, mismatch }
}

#[derive(Clone)]
pub struct RevealScheduler {
    delay: Arc<dyn Delay>,
    turn_delay: Duration,
}

impl RevealScheduler {
    pub fn new(delay: Arc<dyn Delay>, turn_delay: Duration) -> Self {
        Self { delay, turn_delay }
    }

    /// Scheduler that does not wait between turns.
    pub fn instant() -> Self {
        Self::new(Arc::new(NoDelay), Duration::ZERO)
    }

    /// Reveal `turns` one at a time.
    ///
    /// For each turn: indicator on, wait, append, indicator off. `apply`
    /// returns `false` once the run is stale, which ends it immediately.
    pub async fn run<F>(&self, turns: VecDeque<PendingTurn>, mut apply: F) -> RevealOutcome
    where
        F: FnMut(RevealStep) -> bool + Send,
    {
        let mut revealed = 0;

        for turn in turns {
            if !apply(RevealStep::Typing(turn.agent.clone())) {
                return self.cancelled(revealed);
            }

            self.delay.wait(self.turn_delay).await;

            if !apply(RevealStep::Append(turn)) {
                return self.cancelled(revealed);
            }
            revealed += 1;

            if !apply(RevealStep::ClearTyping) {
                return self.cancelled(revealed);
            }
        }

        RevealOutcome::Completed { turns: revealed }
    }

    fn cancelled(&self, turns: usize) -> RevealOutcome {
        debug!(turns, "Reveal run superseded, dropping remaining steps");
        RevealOutcome::Cancelled { turns }
    }
}

impl Default for RevealScheduler {
    fn default() -> Self {
        Self::new(Arc::new(TokioDelay), DEFAULT_TURN_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    fn agents() -> (Agent, Agent) {
        (Agent::new("ChatGPT", "gpt"), Agent::new("Gemini", "gemini"))
    }

    fn rounds(n: usize) -> Vec<RoundResult> {
        (0..n)
            .map(|i| RoundResult::new(format!("for {}", i), format!("against {}", i)))
            .collect()
    }

    /// Records each requested duration and bumps `generation` on the nth wait.
    struct CountingDelay {
        waits: AtomicUsize,
        bump_on: usize,
        generation: Arc<AtomicU64>,
        durations: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Delay for CountingDelay {
        async fn wait(&self, duration: Duration) {
            self.durations.lock().unwrap().push(duration);
            let n = self.waits.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.bump_on {
                self.generation.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_plan_alternates_in_round_order() {
        let (first, second) = agents();
        let plan = plan_reveal(&first, &second, &rounds(3), 3);

        assert!(plan.mismatch.is_none());
        assert_eq!(plan.turns.len(), 6);
        for (i, turn) in plan.turns.iter().enumerate() {
            let expected_agent = if i % 2 == 0 { &first } else { &second };
            assert_eq!(&turn.agent, expected_agent);
            let side = if i % 2 == 0 { "for" } else { "against" };
            assert_eq!(turn.text, format!("{} {}", side, i / 2));
        }
    }

    #[test]
    fn test_plan_truncates_longer_batch() {
        let (first, second) = agents();
        let plan = plan_reveal(&first, &second, &rounds(5), 2);

        assert_eq!(plan.turns.len(), 4);
        assert_eq!(
            plan.mismatch,
            Some(BatchMismatch {
                requested: 2,
                received: 5
            })
        );
    }

    #[test]
    fn test_plan_accepts_shorter_batch() {
        let (first, second) = agents();
        let plan = plan_reveal(&first, &second, &rounds(1), 3);

        assert_eq!(plan.turns.len(), 2);
        let mismatch = plan.mismatch.unwrap();
        assert_eq!(mismatch.message(), "Requested 3 rounds but received 1; showing 1.");
    }

    #[tokio::test]
    async fn test_run_emits_steps_with_single_indicator() {
        let (first, second) = agents();
        let plan = plan_reveal(&first, &second, &rounds(2), 2);
        let mut steps = Vec::new();

        let outcome = RevealScheduler::instant()
            .run(plan.turns, |step| {
                steps.push(step);
                true
            })
            .await;

        assert_eq!(outcome, RevealOutcome::Completed { turns: 4 });
        assert_eq!(steps.len(), 12);

        let mut typing: Option<Agent> = None;
        let mut appended = Vec::new();
        for step in steps {
            match step {
                RevealStep::Typing(agent) => {
                    assert!(typing.is_none(), "two indicators active at once");
                    typing = Some(agent);
                }
                RevealStep::Append(turn) => {
                    assert_eq!(typing.as_ref(), Some(&turn.agent));
                    appended.push(turn.text);
                }
                RevealStep::ClearTyping => typing = None,
            }
        }
        assert_eq!(appended, ["for 0", "against 0", "for 1", "against 1"]);
    }

    #[tokio::test]
    async fn test_run_waits_fixed_delay_per_turn() {
        let (first, second) = agents();
        let delay = Arc::new(CountingDelay {
            waits: AtomicUsize::new(0),
            bump_on: usize::MAX,
            generation: Arc::new(AtomicU64::new(0)),
            durations: Mutex::new(Vec::new()),
        });
        let scheduler = RevealScheduler::new(delay.clone(), DEFAULT_TURN_DELAY);
        let plan = plan_reveal(&first, &second, &rounds(2), 2);

        scheduler.run(plan.turns, |_| true).await;

        let durations = delay.durations.lock().unwrap();
        assert_eq!(*durations, vec![DEFAULT_TURN_DELAY; 4]);
    }

    #[tokio::test]
    async fn test_stale_run_stops_after_generation_bump() {
        let (first, second) = agents();
        let generation = Arc::new(AtomicU64::new(7));
        let delay = Arc::new(CountingDelay {
            waits: AtomicUsize::new(0),
            bump_on: 2,
            generation: generation.clone(),
            durations: Mutex::new(Vec::new()),
        });
        let scheduler = RevealScheduler::new(delay, Duration::from_millis(1));
        let plan = plan_reveal(&first, &second, &rounds(3), 3);

        let token = generation.load(Ordering::SeqCst);
        let mut appended = Vec::new();
        let outcome = scheduler
            .run(plan.turns, |step| {
                if generation.load(Ordering::SeqCst) != token {
                    return false;
                }
                if let RevealStep::Append(turn) = step {
                    appended.push(turn.text);
                }
                true
            })
            .await;

        assert_eq!(outcome, RevealOutcome::Cancelled { turns: 1 });
        assert_eq!(appended, ["for 0"]);
    }

    #[tokio::test]
    async fn test_run_empty_plan_completes() {
        let outcome = RevealScheduler::instant()
            .run(VecDeque::new(), |_| panic!("no steps expected"))
            .await;
        assert_eq!(outcome, RevealOutcome::Completed { turns: 0 });
    }
}
