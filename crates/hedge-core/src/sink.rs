//! Persistence targets that run as the last stage of a chain.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hedge_warehouse::{Warehouse, WarehouseError};
use tracing::debug;

use crate::chain::{Step, StepFuture};
use crate::deadline::DeadlineScope;
use crate::domain::DollarQuote;
use crate::outcome::{Failure, Outcome};
use crate::source::ProviderId;

/// Boxed future returned by [`ResultSink::persist`].
pub type SinkFuture<'a> = Pin<Box<dyn Future<Output = Outcome<()>> + Send + 'a>>;

/// Writes a value somewhere durable within a scope.
///
/// A sink must leave no partial write behind when its scope expires.
pub trait ResultSink<V>: Send + Sync {
    fn persist<'a>(&'a self, value: &'a V, scope: DeadlineScope) -> SinkFuture<'a>;
}

/// Chain step that persists its input and passes it through unchanged.
pub struct SinkStep<S: ?Sized> {
    name: String,
    budget: Duration,
    sink: Arc<S>,
}

impl<S: ?Sized> SinkStep<S> {
    pub fn new(name: impl Into<String>, budget: Duration, sink: Arc<S>) -> Self {
        Self {
            name: name.into(),
            budget,
            sink,
        }
    }
}

impl<V, S> Step<V> for SinkStep<S>
where
    V: Send + Sync + 'static,
    S: ResultSink<V> + ?Sized,
{
    type Output = V;

    fn name(&self) -> &str {
        &self.name
    }

    fn budget(&self) -> Duration {
        self.budget
    }

    fn run<'a>(&'a self, input: V, scope: DeadlineScope) -> StepFuture<'a, V> {
        Box::pin(async move {
            self.sink.persist(&input, scope).await?;
            Ok(input)
        })
    }
}

/// In-process sink with optional simulated write latency.
#[derive(Debug)]
pub struct MemorySink<V> {
    stored: Mutex<Vec<V>>,
    latency: Duration,
}

impl<V> Default for MemorySink<V> {
    fn default() -> Self {
        Self {
            stored: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
        }
    }
}

impl<V: Clone> MemorySink<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn stored(&self) -> Vec<V> {
        self.stored
            .lock()
            .map(|stored| stored.clone())
            .unwrap_or_default()
    }
}

impl<V> ResultSink<V> for MemorySink<V>
where
    V: Clone + Send + Sync,
{
    fn persist<'a>(&'a self, value: &'a V, scope: DeadlineScope) -> SinkFuture<'a> {
        Box::pin(async move {
            scope
                .run(async {
                    if !self.latency.is_zero() {
                        tokio::time::sleep(self.latency).await;
                    }
                    let mut stored = self
                        .stored
                        .lock()
                        .map_err(|_| Failure::transfer("memory sink lock poisoned"))?;
                    stored.push(value.clone());
                    Ok::<(), Failure>(())
                })
                .await?
        })
    }
}

/// DuckDB-backed sink for exchange-rate quotes.
///
/// The insert runs on the blocking pool inside a transaction. When the scope
/// expires first the caller gets `Failure::timeout` right away, and the write
/// rolls back if it has not yet reached its pre-commit check.
///
/// That check is the last point where the write can be abandoned. A scope that
/// expires while DuckDB is already committing still reports
/// `Failure::timeout`, but the row is stored.
#[derive(Clone)]
pub struct WarehouseSink {
    warehouse: Warehouse,
    source: ProviderId,
}

impl WarehouseSink {
    pub fn new(warehouse: Warehouse) -> Self {
        Self {
            warehouse,
            source: ProviderId::AWESOMEAPI,
        }
    }

    /// Provider recorded alongside every stored quote.
    pub fn with_source(mut self, source: ProviderId) -> Self {
        self.source = source;
        self
    }

    pub fn warehouse(&self) -> &Warehouse {
        &self.warehouse
    }
}

impl ResultSink<DollarQuote> for WarehouseSink {
    fn persist<'a>(&'a self, value: &'a DollarQuote, scope: DeadlineScope) -> SinkFuture<'a> {
        Box::pin(async move {
            let record = value.to_record(self.source);
            let warehouse = self.warehouse.clone();
            let token = scope.cancellation_token();
            let hard_deadline = scope
                .remaining()
                .and_then(|remaining| std::time::Instant::now().checked_add(remaining));

            let write = tokio::task::spawn_blocking(move || {
                warehouse.insert_dollar_quote_unless(&record, || {
                    token.is_cancelled()
                        || hard_deadline.is_some_and(|deadline| std::time::Instant::now() >= deadline)
                })
            });

            match scope.run(write).await {
                Ok(Ok(Ok(()))) => {
                    debug!(stage = scope.label(), "quote persisted");
                    Ok(())
                }
                Ok(Ok(Err(WarehouseError::Abandoned(reason)))) => {
                    debug!(stage = scope.label(), %reason, "quote write rolled back");
                    Err(Failure::timeout(scope.label()))
                }
                Ok(Ok(Err(error))) => Err(Failure::transfer(format!("warehouse write failed: {error}"))),
                Ok(Err(join_error)) => Err(Failure::transfer(format!(
                    "warehouse write task failed: {join_error}"
                ))),
                Err(elapsed) => Err(elapsed.into()),
            }
        })
    }
}
