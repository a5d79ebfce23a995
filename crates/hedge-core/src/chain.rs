//! Sequential composition of independently budgeted steps.
//!
//! A [`BudgetedChain`] runs each step in its own child scope, named after the
//! step, so a failure always reports which stage produced it. The chain clock
//! is never reset between steps: every child is also clamped to the chain's own
//! scope. Once a step fails the chain is closed and later calls return the
//! recorded failure without touching their step.
//!
//! ```rust
//! use std::time::Duration;
//! use hedge_core::{step_fn, BudgetedChain, DeadlineScope};
//!
//! # async fn demo() -> Result<(), hedge_core::Failure> {
//! let fetch = step_fn("outbound-call", Duration::from_millis(200), |_: (), _scope: DeadlineScope| async {
//!     Ok(41_u32)
//! });
//! let bump = step_fn("persistence", Duration::from_millis(10), |value: u32, _scope: DeadlineScope| async move {
//!     Ok(value + 1)
//! });
//!
//! let mut chain = BudgetedChain::with_budget("quote", Duration::from_secs(1));
//! let fetched = chain.run(&fetch, ()).await?;
//! let stored = chain.run(&bump, fetched).await?;
//! assert_eq!(stored, 42);
//! assert_eq!(chain.stages().len(), 2);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::deadline::DeadlineScope;
use crate::outcome::{Failure, FailureKind, Outcome};

/// Boxed future returned by [`Step::run`].
pub type StepFuture<'a, O> = Pin<Box<dyn Future<Output = Outcome<O>> + Send + 'a>>;

/// One named, budgeted unit of a chain.
///
/// The scope handed to `run` is the step's own child scope; implementations
/// should run their I/O inside it so they stop promptly on expiry.
pub trait Step<I>: Send + Sync {
    type Output: Send;

    fn name(&self) -> &str;

    fn budget(&self) -> Duration;

    fn run<'a>(&'a self, input: I, scope: DeadlineScope) -> StepFuture<'a, Self::Output>;
}

/// Step backed by a closure, created with [`step_fn`].
#[derive(Clone)]
pub struct FnStep<F> {
    name: String,
    budget: Duration,
    action: F,
}

/// Turns `action` into a [`Step`] named `name` with the given budget.
pub fn step_fn<I, O, F, Fut>(name: impl Into<String>, budget: Duration, action: F) -> FnStep<F>
where
    F: Fn(I, DeadlineScope) -> Fut + Send + Sync,
    Fut: Future<Output = Outcome<O>> + Send + 'static,
{
    FnStep {
        name: name.into(),
        budget,
        action,
    }
}

impl<I, O, F, Fut> Step<I> for FnStep<F>
where
    F: Fn(I, DeadlineScope) -> Fut + Send + Sync,
    Fut: Future<Output = Outcome<O>> + Send + 'static,
    O: Send,
{
    type Output = O;

    fn name(&self) -> &str {
        &self.name
    }

    fn budget(&self) -> Duration {
        self.budget
    }

    fn run<'a>(&'a self, input: I, scope: DeadlineScope) -> StepFuture<'a, O> {
        Box::pin((self.action)(input, scope))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Succeeded,
    Failed,
}

/// What happened to one executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageRecord {
    pub name: String,
    pub elapsed_ms: u64,
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

/// Ordered sequence of budgeted steps sharing one chain scope.
#[derive(Debug)]
pub struct BudgetedChain {
    scope: DeadlineScope,
    stages: Vec<StageRecord>,
    failed: Option<Failure>,
}

impl Default for BudgetedChain {
    fn default() -> Self {
        Self::new()
    }
}

impl BudgetedChain {
    /// Chain under a fresh, unbounded root scope.
    pub fn new() -> Self {
        Self::within(&DeadlineScope::root())
    }

    /// Chain under a fresh scope with an overall budget.
    pub fn with_budget(label: impl Into<String>, budget: Duration) -> Self {
        Self::within(&DeadlineScope::new(label, budget))
    }

    /// Chain nested inside a caller-supplied scope.
    pub fn within(parent: &DeadlineScope) -> Self {
        Self {
            scope: parent.clone(),
            stages: Vec::new(),
            failed: None,
        }
    }

    pub fn scope(&self) -> &DeadlineScope {
        &self.scope
    }

    pub fn stages(&self) -> &[StageRecord] {
        &self.stages
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.failed.as_ref()
    }

    /// Runs `step` with `input` in a child scope named after the step.
    ///
    /// The step scope is released on every exit path, so work the step left
    /// behind observes cancellation.
    pub async fn run<I, S>(&mut self, step: &S, input: I) -> Outcome<S::Output>
    where
        S: Step<I> + ?Sized,
    {
        if let Some(failure) = &self.failed {
            debug!(stage = step.name(), "chain already failed; step skipped");
            return Err(failure.clone());
        }

        let scope = self.scope.child(step.name(), step.budget());
        let _release = scope.release_on_drop();
        let started = Instant::now();

        let outcome = match scope.run(step.run(input, scope.clone())).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(failure)) if failure.is_timeout() && scope.is_expired() => {
                Err(Failure::timeout(step.name()))
            }
            Ok(Err(failure)) => Err(failure.at_stage(step.name())),
            Err(_elapsed) => Err(Failure::timeout(step.name())),
        };

        let elapsed_ms = started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64;
        match &outcome {
            Ok(_) => {
                info!(stage = step.name(), elapsed_ms, "chain stage completed");
                self.stages.push(StageRecord {
                    name: step.name().to_owned(),
                    elapsed_ms,
                    status: StageStatus::Succeeded,
                    failure: None,
                });
            }
            Err(failure) => {
                if failure.is_timeout() {
                    warn!(stage = step.name(), elapsed_ms, "chain stage deadline elapsed");
                } else {
                    debug!(stage = step.name(), elapsed_ms, error = %failure, "chain stage failed");
                }
                self.stages.push(StageRecord {
                    name: step.name().to_owned(),
                    elapsed_ms,
                    status: StageStatus::Failed,
                    failure: Some(failure.kind()),
                });
                self.failed = Some(failure.clone());
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn output_of_one_step_feeds_the_next() {
        let double = step_fn("double", Duration::from_millis(50), |value: u32, _| async move {
            Ok(value * 2)
        });
        let mut chain = BudgetedChain::with_budget("chain", Duration::from_secs(1));

        let first = chain.run(&double, 3).await.expect("first");
        let second = chain.run(&double, first).await.expect("second");

        assert_eq!(second, 12);
        assert!(chain.stages().iter().all(|stage| stage.status == StageStatus::Succeeded));
    }

    #[tokio::test(start_paused = true)]
    async fn step_errors_are_tagged_with_the_step_name() {
        let broken = step_fn("decode-body", Duration::from_millis(50), |_: (), _| async {
            Err::<(), _>(Failure::decode("unexpected token"))
        });
        let mut chain = BudgetedChain::new();

        let failure = chain.run(&broken, ()).await.expect_err("step fails");

        assert_eq!(failure.kind(), FailureKind::Decode);
        assert_eq!(failure.stage(), Some("decode-body"));
        assert_eq!(chain.stages()[0].failure, Some(FailureKind::Decode));
    }

    #[tokio::test(start_paused = true)]
    async fn chain_budget_caps_every_step() {
        let slow = step_fn("slow", Duration::from_secs(10), |_: (), _| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        });
        let mut chain = BudgetedChain::with_budget("chain", Duration::from_millis(300));
        let started = Instant::now();

        let failure = chain.run(&slow, ()).await.expect_err("chain budget elapses");

        assert_eq!(failure, Failure::timeout("slow"));
        assert!(started.elapsed() < Duration::from_millis(310));
    }

    #[tokio::test(start_paused = true)]
    async fn step_scope_is_released_after_the_step() {
        let captured = std::sync::Arc::new(std::sync::Mutex::new(None));
        let capture = {
            let captured = captured.clone();
            step_fn("capture", Duration::from_secs(1), move |_: (), scope: DeadlineScope| {
                *captured.lock().expect("lock") = Some(scope);
                async { Ok(()) }
            })
        };
        let mut chain = BudgetedChain::new();

        chain.run(&capture, ()).await.expect("step succeeds");

        let scope = captured.lock().expect("lock").clone().expect("scope captured");
        assert!(scope.is_expired());
        assert!(!chain.scope().is_expired());
    }
}
