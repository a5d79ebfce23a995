//! Concurrent race of interchangeable providers under one shared deadline.
//!
//! Every provider runs as an independent attempt on the tokio runtime. The
//! coordinator observes outcomes in arrival order and commits to the first
//! success. Attempts that are still running at that point are not waited for:
//! each attempt hands its outcome over through a channel sized to the number
//! of attempts and uses `try_send`, so a late result is dropped on the spot and
//! never stalls the losing task.
//!
//! Two successes that land in the same scheduling instant are resolved by
//! channel delivery order. That order is observably racy; position in the
//! provider list is never a priority.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, debug_span, info, warn, Instrument};

use crate::deadline::DeadlineScope;
use crate::error::ValidationError;
use crate::outcome::{Failure, Outcome};
use crate::provider::Provider;
use crate::source::ProviderId;

/// What happens to attempts still running once a winner is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoserPolicy {
    /// Losers run on until they finish or the shared scope expires; their
    /// results are discarded.
    #[default]
    Detach,
    /// Losers are aborted as soon as the race resolves.
    Abort,
}

/// Lifecycle of one attempt as seen by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
    /// No outcome had arrived when the race resolved.
    Pending,
    Succeeded,
    Failed(Failure),
}

/// One attempt of a race.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub provider: ProviderId,
    pub started_at: Instant,
    /// Time from race start to the attempt's outcome, if it arrived in time.
    pub elapsed: Option<Duration>,
    pub state: AttemptState,
}

/// Committed race.
#[derive(Debug, Clone)]
pub struct RaceWin<V> {
    pub value: V,
    pub winner: ProviderId,
    pub attempts: Vec<AttemptRecord>,
    pub latency_ms: u64,
}

/// Race that ended without a success.
#[derive(Debug, Clone)]
pub struct RaceLoss {
    pub failure: Failure,
    pub attempts: Vec<AttemptRecord>,
    pub latency_ms: u64,
}

pub type RaceResult<V> = Result<RaceWin<V>, RaceLoss>;

impl From<RaceLoss> for Failure {
    fn from(loss: RaceLoss) -> Self {
        loss.failure
    }
}

struct AttemptReport<V> {
    index: usize,
    finished_at: Instant,
    outcome: Outcome<V>,
}

/// Runs a fixed set of providers concurrently and keeps the first success.
pub struct RaceCoordinator<K, V> {
    providers: Vec<Arc<dyn Provider<K, V>>>,
    loser_policy: LoserPolicy,
}

impl<K, V> Clone for RaceCoordinator<K, V> {
    fn clone(&self) -> Self {
        Self {
            providers: self.providers.clone(),
            loser_policy: self.loser_policy,
        }
    }
}

impl<K, V> RaceCoordinator<K, V>
where
    K: Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    /// Conventional label for the scope a race runs in.
    pub const STAGE: &'static str = "race";

    pub fn new(providers: Vec<Arc<dyn Provider<K, V>>>) -> Result<Self, ValidationError> {
        if providers.is_empty() {
            return Err(ValidationError::EmptyProviderSet);
        }
        Ok(Self {
            providers,
            loser_policy: LoserPolicy::default(),
        })
    }

    pub fn with_loser_policy(mut self, loser_policy: LoserPolicy) -> Self {
        self.loser_policy = loser_policy;
        self
    }

    /// Keeps only the providers named in `ids`.
    pub fn restricted_to(self, ids: &[ProviderId]) -> Result<Self, ValidationError> {
        let providers = self
            .providers
            .into_iter()
            .filter(|provider| ids.contains(&provider.id()))
            .collect::<Vec<_>>();
        Ok(Self::new(providers)?.with_loser_policy(self.loser_policy))
    }

    pub fn provider_ids(&self) -> Vec<ProviderId> {
        self.providers.iter().map(|provider| provider.id()).collect()
    }

    pub const fn loser_policy(&self) -> LoserPolicy {
        self.loser_policy
    }

    /// Races every provider for `key` inside `scope`.
    ///
    /// Resolves with the first success, with `Failure::timeout(scope label)`
    /// when the scope expires first, or with the last reported failure when
    /// every attempt failed before the deadline.
    pub async fn race(&self, key: K, scope: &DeadlineScope) -> RaceResult<V> {
        let started = Instant::now();
        let mut attempts = self
            .providers
            .iter()
            .map(|provider| AttemptRecord {
                provider: provider.id(),
                started_at: started,
                elapsed: None,
                state: AttemptState::Pending,
            })
            .collect::<Vec<_>>();

        if scope.is_expired() {
            return Err(RaceLoss {
                failure: Failure::timeout(scope.label()),
                attempts,
                latency_ms: 0,
            });
        }

        let (sender, mut receiver) = mpsc::channel(self.providers.len());
        let mut handles = Vec::with_capacity(self.providers.len());

        for (index, provider) in self.providers.iter().enumerate() {
            let provider = Arc::clone(provider);
            let sender = sender.clone();
            let key = key.clone();
            let scope = scope.clone();
            let span = debug_span!("attempt", provider = %provider.id());

            handles.push(tokio::spawn(
                async move {
                    let outcome = provider.fetch(&key, &scope).await;
                    // Fails only once the race has resolved; the result is dropped.
                    let _ = sender.try_send(AttemptReport {
                        index,
                        finished_at: Instant::now(),
                        outcome,
                    });
                }
                .instrument(span),
            ));
        }
        drop(sender);

        let mut last_failure = None;
        let verdict = loop {
            tokio::select! {
                biased;
                report = receiver.recv() => {
                    let Some(report) = report else {
                        break Err(last_failure.take().unwrap_or_else(|| {
                            Failure::transfer("every attempt ended without reporting an outcome")
                        }));
                    };

                    let attempt = &mut attempts[report.index];
                    attempt.elapsed = Some(report.finished_at.saturating_duration_since(started));
                    match report.outcome {
                        Ok(value) => {
                            attempt.state = AttemptState::Succeeded;
                            break Ok((attempt.provider, value));
                        }
                        Err(failure) => {
                            debug!(provider = %attempt.provider, error = %failure, "attempt failed");
                            attempt.state = AttemptState::Failed(failure.clone());
                            last_failure = Some(failure);
                        }
                    }
                }
                () = scope.expired() => {
                    break Err(Failure::timeout(scope.label()));
                }
            }
        };
        drop(receiver);

        if self.loser_policy == LoserPolicy::Abort {
            for handle in &handles {
                handle.abort();
            }
        }

        let latency_ms = elapsed_ms(started);
        match verdict {
            Ok((winner, value)) => {
                info!(%winner, latency_ms, "race committed");
                Ok(RaceWin {
                    value,
                    winner,
                    attempts,
                    latency_ms,
                })
            }
            Err(failure) => {
                if failure.is_timeout() {
                    warn!(stage = scope.label(), latency_ms, "race deadline elapsed before any success");
                } else {
                    debug!(error = %failure, latency_ms, "every attempt failed");
                }
                Err(RaceLoss {
                    failure,
                    attempts,
                    latency_ms,
                })
            }
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}
