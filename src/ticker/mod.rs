//! Cosmetic "auto-learning" progress counter.
//!
//! The ticker owns its state and a cancellation token for the running tick
//! task. `stop()` cancels the token, so the task exits right away instead of
//! waiting out the current interval.

use chrono::{DateTime, Local};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Shown as the denominator in the status line. Progress is never clamped to it.
pub const DISPLAY_CAPACITY: u64 = 1000;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

const TOPICS: [&str; 12] = [
    "Python Syntax",
    "Data Structures",
    "Algorithms",
    "Machine Learning",
    "Web Development",
    "GUI Programming",
    "Data Analysis",
    "OOP Concepts",
    "Error Handling",
    "Optimization",
    "Async Programming",
    "Design Patterns",
];

const FALLBACK_CONCEPT: &str = "Programming Concept";

fn concepts_for(topic: &str) -> &'static [&'static str] {
    match topic {
        "Python Syntax" => &["Variables", "Functions", "Loops", "Conditionals"],
        "Data Structures" => &["Lists", "Dictionaries", "Tuples", "Sets"],
        "Algorithms" => &["Sorting", "Searching", "Recursion", "Dynamic Programming"],
        _ => &[],
    }
}

/// Label for the concept "learned" on the tick that brought progress to `progress`.
pub fn concept_label(progress: u64) -> Option<String> {
    let step = progress.checked_sub(1)?;
    let topic = TOPICS[(step % TOPICS.len() as u64) as usize];
    let concepts = concepts_for(topic);
    let concept = if concepts.is_empty() {
        FALLBACK_CONCEPT
    } else {
        concepts[((step / TOPICS.len() as u64) % concepts.len() as u64) as usize]
    };
    Some(format!("{concept} in {topic}"))
}

#[derive(Debug, Error)]
pub enum TickerError {
    #[error("learning state lock poisoned")]
    StatePoisoned,
}

#[derive(Debug, Clone)]
struct LearningState {
    progress: u64,
    is_active: bool,
    last_tick: DateTime<Local>,
    last_concept: Option<String>,
}

impl LearningState {
    fn new() -> Self {
        Self {
            progress: 0,
            is_active: false,
            last_tick: Local::now(),
            last_concept: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LearningSnapshot {
    pub progress: u64,
    pub is_active: bool,
    pub last_tick: DateTime<Local>,
    pub last_concept: Option<String>,
}

impl From<&LearningState> for LearningSnapshot {
    fn from(state: &LearningState) -> Self {
        Self {
            progress: state.progress,
            is_active: state.is_active,
            last_tick: state.last_tick,
            last_concept: state.last_concept.clone(),
        }
    }
}

pub struct ProgressTicker {
    state: Arc<RwLock<LearningState>>,
    cancel: Mutex<Option<CancellationToken>>,
    interval: Duration,
    runtime_handle: Handle,
}

impl ProgressTicker {
    pub fn new(runtime_handle: Handle, interval: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(LearningState::new())),
            cancel: Mutex::new(None),
            interval,
            runtime_handle,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// No-op when already running.
    pub fn start(&self) {
        let mut cancel = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        if cancel.is_some() {
            debug!("learning ticker already running");
            return;
        }

        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .is_active = true;

        let token = CancellationToken::new();
        *cancel = Some(token.clone());

        let state = Arc::clone(&self.state);
        let period = self.interval;
        info!(interval_secs = period.as_secs_f64(), "learning ticker started");
        self.runtime_handle.spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(err) = advance(&state) {
                            warn!(error = %err, "learning tick failed");
                        }
                    }
                }
            }
            debug!("learning ticker task exited");
        });
    }

    pub fn stop(&self) {
        // Held until `is_active` is cleared so a concurrent `start` sees both or neither.
        let mut cancel = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(token) = cancel.take() else {
            return;
        };

        token.cancel();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.is_active = false;
        info!(progress = state.progress, "learning ticker stopped");
    }

    #[cfg(test)]
    fn is_running(&self) -> bool {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn snapshot(&self) -> LearningSnapshot {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        LearningSnapshot::from(&*state)
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Counts one tick. A poisoned lock is recovered and reported, and the tick still counts.
fn advance(lock: &RwLock<LearningState>) -> Result<(), TickerError> {
    let (mut state, outcome) = match lock.write() {
        Ok(guard) => (guard, Ok(())),
        Err(poisoned) => {
            lock.clear_poison();
            (poisoned.into_inner(), Err(TickerError::StatePoisoned))
        }
    };
    if !state.is_active {
        return outcome;
    }
    state.progress += 1;
    state.last_tick = Local::now();
    state.last_concept = concept_label(state.progress);
    debug!(
        progress = state.progress,
        concept = state.last_concept.as_deref().unwrap_or("-"),
        "learning tick"
    );
    outcome
}
