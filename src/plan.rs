//! Bounded step loop over an externally defined plan.
//!
//! The executor never inspects a plan beyond the [`PlanState`] queries. Each
//! iteration asks the [`StepExecutor`] for the next state and stops on
//! success, on failure, or when the step budget runs out.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{info, warn};

/// Default step budget.
pub const DEFAULT_MAX_STEPS: usize = 10;

/// Read-only view of a plan's progress.
pub trait PlanState: Send + Sync {
    /// True once the plan has no further steps.
    fn is_complete(&self) -> bool;
    /// False once a step has failed.
    fn is_successful(&self) -> bool;
    /// Result text accumulated so far.
    fn result(&self) -> &str;
    /// Human-readable description of the plan.
    fn describe(&self) -> String;
}

/// Runs one plan step, producing the next state.
pub trait StepExecutor<S: PlanState>: Send + Sync {
    /// Executes the next step of `state`.
    fn execute_next_step<'a>(
        &'a self,
        state: &'a S,
    ) -> Pin<Box<dyn Future<Output = Result<S>> + Send + 'a>>;
}

/// How a plan execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanOutcome {
    /// A step reported success and completion.
    Succeeded,
    /// A step reported failure.
    Failed {
        /// 1-based step number that failed (0 for an already failed plan).
        step: usize,
    },
    /// The step budget ran out first.
    StepLimitExceeded,
}

/// Final state of a plan execution.
#[derive(Debug)]
pub struct PlanExecution<S> {
    /// How the loop ended.
    pub outcome: PlanOutcome,
    /// The returned state: the completing state on success, the last good
    /// state on failure, the last reached state on step-limit.
    pub state: S,
    /// Number of `execute_next_step` invocations.
    pub steps: usize,
    /// Wall-clock duration of the loop.
    pub elapsed: Duration,
}

/// Drives `initial` to completion in at most `max_steps` steps.
///
/// A plan that is already complete returns immediately without invoking
/// the executor. Errors from the step operation propagate unchanged.
pub async fn execute_plan<S, E>(
    executor: &E,
    initial: S,
    max_steps: usize,
) -> Result<PlanExecution<S>>
where
    S: PlanState,
    E: StepExecutor<S> + ?Sized,
{
    let started = Instant::now();
    info!(plan = %initial.describe(), max_steps, "Executing plan");

    let mut state = initial;
    let mut steps = 0;
    let mut outcome = PlanOutcome::StepLimitExceeded;

    if state.is_complete() {
        outcome = if state.is_successful() {
            PlanOutcome::Succeeded
        } else {
            PlanOutcome::Failed { step: 0 }
        };
    } else {
        while steps < max_steps {
            steps += 1;
            let next = executor.execute_next_step(&state).await?;

            if !next.is_successful() {
                warn!(
                    step = steps,
                    diagnostic = next.result(),
                    "Plan execution failed at step {steps}"
                );
                outcome = PlanOutcome::Failed { step: steps };
                break;
            }

            state = next;
            if state.is_complete() {
                outcome = PlanOutcome::Succeeded;
                break;
            }
        }
    }

    let elapsed = started.elapsed();
    match outcome {
        PlanOutcome::Succeeded => {
            info!(result = state.result(), steps, "Plan complete");
        }
        PlanOutcome::StepLimitExceeded => {
            warn!(steps, "Plan did not complete within {max_steps} steps");
        }
        PlanOutcome::Failed { .. } => {}
    }
    info!(elapsed_ms = elapsed.as_millis() as u64, "Plan execution finished");

    Ok(PlanExecution {
        outcome,
        state,
        steps,
        elapsed,
    })
}
