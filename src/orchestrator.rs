//! One-sink orchestration of tool invocations.

use crate::classifier::ResultClassifier;
use crate::config::Config;
use crate::errors::{Result, WatchError};
use crate::invocation::ToolInvocation;
use crate::runner::ToolRunner;
use crate::scheduler::{PollCycleState, PollScheduler};
use crate::sink::ResultSink;
use std::sync::atomic::{AtomicBool, Ordering};

/// Orchestrates invocations for a single result sink.
///
/// Owns the one active-invocation slot: a second submission while a
/// cycle is outstanding is rejected with
/// [`WatchError::InvocationActive`], never queued or superseded.
/// Callers needing several sinks create several orchestrators.
pub struct WatchOrchestrator<S> {
    sink: S,
    scheduler: PollScheduler,
    busy: AtomicBool,
}

impl<S: ResultSink> WatchOrchestrator<S> {
    pub fn new(config: &Config, sink: S) -> Self {
        let classifier =
            ResultClassifier::with_ambiguous_separators(config.tool.ambiguous_path_separators);
        WatchOrchestrator {
            sink,
            scheduler: PollScheduler::new(classifier),
            busy: AtomicBool::new(false),
        }
    }

    /// Spawn the tool for `invocation` and poll it to a terminal state.
    ///
    /// The invocation is consumed; results, status updates, and
    /// failure reports all land on the sink. Returns the terminal
    /// state reached.
    pub async fn run(&self, invocation: ToolInvocation) -> Result<PollCycleState> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(WatchError::InvocationActive);
        }

        let mut handle = ToolRunner::spawn(&invocation);
        let outcome = self
            .scheduler
            .supervise(&invocation, &mut handle, &self.sink)
            .await;
        self.busy.store(false, Ordering::SeqCst);
        Ok(outcome)
    }

    /// Current slot state: `Idle` when no invocation is outstanding.
    pub fn state(&self) -> PollCycleState {
        if self.busy.load(Ordering::SeqCst) {
            PollCycleState::Running
        } else {
            PollCycleState::Idle
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
