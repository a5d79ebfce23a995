//! Deterministic providers shared by the behaviour suites.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hedge_core::{DeadlineScope, Failure, FetchFuture, Outcome, Provider, ProviderId};

/// Provider that answers with a fixed outcome after a fixed delay, tracking
/// whether it finished or observed its scope ending first.
pub struct ScriptedProvider<V> {
    id: ProviderId,
    delay: Duration,
    outcome: Outcome<V>,
    calls: AtomicUsize,
    completed: AtomicBool,
    cancelled: AtomicBool,
}

impl<V> ScriptedProvider<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn succeeding(id: &'static str, delay_ms: u64, value: V) -> Arc<Self> {
        Self::scripted(id, delay_ms, Ok(value))
    }

    pub fn failing(id: &'static str, delay_ms: u64, failure: Failure) -> Arc<Self> {
        Self::scripted(id, delay_ms, Err(failure))
    }

    /// Never answers before any realistic deadline.
    pub fn hanging(id: &'static str, value: V) -> Arc<Self> {
        Self::scripted(id, 3_600_000, Ok(value))
    }

    fn scripted(id: &'static str, delay_ms: u64, outcome: Outcome<V>) -> Arc<Self> {
        Arc::new(Self {
            id: ProviderId::new(id),
            delay: Duration::from_millis(delay_ms),
            outcome,
            calls: AtomicUsize::new(0),
            completed: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
        })
    }

    pub fn shared<K>(self: &Arc<Self>) -> Arc<dyn Provider<K, V>>
    where
        K: Send + Sync + 'static,
    {
        self.clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl<K, V> Provider<K, V> for ScriptedProvider<V>
where
    K: Send + Sync,
    V: Clone + Send + Sync,
{
    fn id(&self) -> ProviderId {
        self.id
    }

    fn fetch<'a>(&'a self, _key: &'a K, scope: &'a DeadlineScope) -> FetchFuture<'a, V> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match scope.run(tokio::time::sleep(self.delay)).await {
                Ok(()) => {
                    self.completed.store(true, Ordering::SeqCst);
                    self.outcome.clone()
                }
                Err(elapsed) => {
                    self.cancelled.store(true, Ordering::SeqCst);
                    Err(elapsed.into())
                }
            }
        })
    }
}
