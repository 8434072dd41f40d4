//! Timer-driven poll cycle for an active invocation.
//!
//! A cooperative state machine: the spawned process runs in parallel
//! at the OS level, but its progress is observed only through periodic
//! non-blocking polls on a single logical timer loop. No blocking
//! waits anywhere on the polling path.

use crate::classifier::ResultClassifier;
use crate::errors::WatchError;
use crate::invocation::ToolInvocation;
use crate::runner::{PollableProcess, ProcessOutput};
use crate::sink::ResultSink;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};

/// How often the active handle is polled.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// The dot animation cycles through 0..=MAX_DOTS dots.
const MAX_DOTS: usize = 3;

/// States of a poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollCycleState {
    /// No invocation active
    Idle,

    /// Handle spawned, ticks in progress
    Running,

    /// Process exited; results classified and dispatched (terminal)
    Finished,

    /// Timeout elapsed; process force-terminated (terminal)
    TimedOut,
}

impl PollCycleState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollCycleState::Finished | PollCycleState::TimedOut)
    }
}

/// Per-invocation poll state. Exists only while a cycle is active.
struct PollState {
    started_at: Instant,
    last_dot: Instant,
    dots: usize,
    base_message: String,
}

/// Cooperative scheduler driving one invocation to a terminal state.
pub struct PollScheduler {
    classifier: ResultClassifier,
    tick_interval: Duration,
}

impl PollScheduler {
    pub fn new(classifier: ResultClassifier) -> Self {
        PollScheduler {
            classifier,
            tick_interval: TICK_INTERVAL,
        }
    }

    /// Override the tick interval.
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// Drive `handle` until the process finishes or the invocation
    /// times out, then finalize.
    ///
    /// Exactly one of the normal and timeout finalizers runs. Both
    /// clear the status message and terminate the handle exactly once;
    /// the poll state is torn down when this returns.
    pub async fn supervise<P, S>(
        &self,
        invocation: &ToolInvocation,
        handle: &mut P,
        sink: &S,
    ) -> PollCycleState
    where
        P: PollableProcess,
        S: ResultSink + ?Sized,
    {
        let now = Instant::now();
        let mut state = PollState {
            started_at: now,
            last_dot: now,
            dots: 0,
            base_message: invocation.base_message(),
        };
        sink.show_status(&state.base_message).await;

        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a fresh interval completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            if handle.poll() {
                sink.show_status("").await;
                let output = handle.terminate().await;
                self.finalize(invocation, output, sink).await;
                return PollCycleState::Finished;
            }

            if state.started_at.elapsed() >= invocation.timeout {
                sink.show_status("").await;
                let output = handle.terminate().await;
                self.finalize_timed_out(invocation, output, sink).await;
                return PollCycleState::TimedOut;
            }

            self.advance_dots(&mut state, sink).await;
        }
    }

    /// Advance the animated progress indicator roughly once per
    /// elapsed second, not once per tick.
    async fn advance_dots<S>(&self, state: &mut PollState, sink: &S)
    where
        S: ResultSink + ?Sized,
    {
        if state.last_dot.elapsed() < Duration::from_secs(1) {
            return;
        }
        state.dots = (state.dots + 1) % (MAX_DOTS + 1);
        state.last_dot = Instant::now();

        let status = format!("{}{}", state.base_message, ".".repeat(state.dots));
        sink.show_status(&status).await;
    }

    async fn finalize<S>(&self, invocation: &ToolInvocation, output: ProcessOutput, sink: &S)
    where
        S: ResultSink + ?Sized,
    {
        if let Some(detail) = output.spawn_error {
            let err = WatchError::Spawn {
                command: invocation.command.clone(),
                detail,
            };
            let body = if output.stderr.is_empty() {
                err.to_string()
            } else {
                format!("{}\n{}", err, output.stderr)
            };
            sink.show_error("Tool failed", &body).await;
            return;
        }

        let results = self
            .classifier
            .classify(&output.stdout, invocation.directory_target);
        sink.dispatch_results(results).await;
    }

    async fn finalize_timed_out<S>(
        &self,
        invocation: &ToolInvocation,
        output: ProcessOutput,
        sink: &S,
    ) where
        S: ResultSink + ?Sized,
    {
        let err = WatchError::Timeout {
            seconds: invocation.timeout.as_secs(),
        };
        let body = format!(
            "{}\nOutput captured before termination:\n{}{}",
            err, output.stderr, output.stdout
        );
        sink.show_timeout("Tool timed out", &body).await;
    }
}
