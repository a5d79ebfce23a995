//! Cancellable, time-bounded execution scopes.
//!
//! A [`DeadlineScope`] is the unit every race, chain step, provider and sink
//! runs inside. Scopes nest: a child's deadline is clamped to its parent's and
//! cancelling (or observing the expiry of) a parent expires every descendant.
//!
//! ```rust
//! use std::time::Duration;
//! use hedge_core::DeadlineScope;
//!
//! # async fn demo() {
//! let request = DeadlineScope::new("request", Duration::from_secs(1));
//! let call = request.child("outbound-call", Duration::from_secs(5));
//!
//! // The child never outlives its parent.
//! assert!(call.deadline() <= request.deadline());
//!
//! let result = call.run(async { 42 }).await;
//! assert_eq!(result.ok(), Some(42));
//! # }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::outcome::Failure;

/// A cancellable, optionally time-bounded execution context.
///
/// Cloning is cheap and yields a handle to the same scope.
#[derive(Debug, Clone)]
pub struct DeadlineScope {
    inner: Arc<ScopeInner>,
}

#[derive(Debug)]
struct ScopeInner {
    label: String,
    deadline: Option<Instant>,
    token: CancellationToken,
    parent: Option<DeadlineScope>,
}

impl DeadlineScope {
    /// Unbounded top-level scope; it only ends when cancelled.
    pub fn root() -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                label: String::from("root"),
                deadline: None,
                token: CancellationToken::new(),
                parent: None,
            }),
        }
    }

    /// Top-level scope that expires `budget` from now.
    pub fn new(label: impl Into<String>, budget: Duration) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                label: label.into(),
                deadline: Instant::now().checked_add(budget),
                token: CancellationToken::new(),
                parent: None,
            }),
        }
    }

    /// Nested scope whose deadline is `min(now + budget, parent deadline)`.
    pub fn child(&self, label: impl Into<String>, budget: Duration) -> Self {
        let requested = Instant::now().checked_add(budget);
        let deadline = match (requested, self.inner.deadline) {
            (Some(requested), Some(parent)) => Some(requested.min(parent)),
            (Some(requested), None) => Some(requested),
            (None, parent) => parent,
        };

        Self {
            inner: Arc::new(ScopeInner {
                label: label.into(),
                deadline,
                token: self.inner.token.child_token(),
                parent: Some(self.clone()),
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn parent(&self) -> Option<&DeadlineScope> {
        self.inner.parent.as_ref()
    }

    /// Effective deadline, `None` for an unbounded scope.
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left before expiry; `None` when unbounded and still live.
    pub fn remaining(&self) -> Option<Duration> {
        if self.inner.token.is_cancelled() {
            return Some(Duration::ZERO);
        }
        self.inner
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Non-blocking expiry check.
    pub fn is_expired(&self) -> bool {
        self.inner.token.is_cancelled()
            || self
                .inner
                .deadline
                .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Ends this scope and every descendant. Irreversible.
    pub fn cancel(&self) {
        self.inner.token.cancel();
    }

    /// Cancels the scope when the returned guard drops.
    #[must_use = "the scope is cancelled as soon as the guard is dropped"]
    pub fn release_on_drop(&self) -> DropGuard {
        self.inner.token.clone().drop_guard()
    }

    /// Resolves once the deadline passes or this scope (or an ancestor) is cancelled.
    pub async fn expired(&self) {
        if self.is_expired() {
            return;
        }

        match self.inner.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.inner.token.cancelled() => {}
                    () = sleep_until(deadline) => {}
                }
            }
            None => self.inner.token.cancelled().await,
        }
    }

    /// Drives `future` inside this scope.
    ///
    /// When the scope expires first the future is dropped, the scope is
    /// cancelled so descendants observe the expiry, and [`Elapsed`] is returned.
    pub async fn run<F>(&self, future: F) -> Result<F::Output, Elapsed>
    where
        F: Future,
    {
        if self.is_expired() {
            self.cancel();
            return Err(self.elapsed());
        }

        tokio::select! {
            biased;
            output = future => Ok(output),
            () = self.expired() => {
                self.cancel();
                Err(self.elapsed())
            }
        }
    }

    /// Cancellation handle for work that cannot await, such as blocking threads.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.token.clone()
    }

    fn elapsed(&self) -> Elapsed {
        Elapsed {
            stage: self.inner.label.clone(),
        }
    }
}

/// The scope expired before the wrapped work completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Elapsed {
    stage: String,
}

impl Elapsed {
    pub fn stage(&self) -> &str {
        &self.stage
    }
}

impl Display for Elapsed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "scope '{}' elapsed", self.stage)
    }
}

impl std::error::Error for Elapsed {}

impl From<Elapsed> for Failure {
    fn from(elapsed: Elapsed) -> Self {
        Failure::timeout(elapsed.stage)
    }
}
