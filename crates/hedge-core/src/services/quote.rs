use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

use super::{elapsed_ms, ProviderStep, ServiceReport};
use crate::chain::BudgetedChain;
use crate::deadline::DeadlineScope;
use crate::domain::{CurrencyPair, DollarQuote};
use crate::outcome::Outcome;
use crate::provider::Provider;
use crate::sink::{ResultSink, SinkStep};

/// Fetches the latest exchange rate and persists it, each under its own budget.
///
/// Both steps also run inside a `request` scope that bounds the whole
/// operation, so the sum of the step budgets never outlives the caller.
pub struct QuoteService {
    provider: Arc<dyn Provider<CurrencyPair, DollarQuote>>,
    sink: Arc<dyn ResultSink<DollarQuote>>,
    pair: CurrencyPair,
    api_call_budget: Duration,
    persistence_budget: Duration,
    request_budget: Duration,
}

impl QuoteService {
    pub const OUTBOUND_CALL: &'static str = "outbound-call";
    pub const PERSISTENCE: &'static str = "persistence";
    pub const REQUEST: &'static str = "request";
    pub const DEFAULT_API_CALL_BUDGET: Duration = Duration::from_millis(200);
    pub const DEFAULT_PERSISTENCE_BUDGET: Duration = Duration::from_millis(10);
    pub const DEFAULT_REQUEST_BUDGET: Duration = Duration::from_millis(300);

    pub fn new(
        provider: Arc<dyn Provider<CurrencyPair, DollarQuote>>,
        sink: Arc<dyn ResultSink<DollarQuote>>,
    ) -> Self {
        Self {
            provider,
            sink,
            pair: CurrencyPair::default(),
            api_call_budget: Self::DEFAULT_API_CALL_BUDGET,
            persistence_budget: Self::DEFAULT_PERSISTENCE_BUDGET,
            request_budget: Self::DEFAULT_REQUEST_BUDGET,
        }
    }

    pub fn with_budgets(mut self, api_call_budget: Duration, persistence_budget: Duration) -> Self {
        self.api_call_budget = api_call_budget;
        self.persistence_budget = persistence_budget;
        self
    }

    /// Budget for the whole quote request, both steps included.
    pub fn with_request_budget(mut self, request_budget: Duration) -> Self {
        self.request_budget = request_budget;
        self
    }

    pub fn with_pair(mut self, pair: CurrencyPair) -> Self {
        self.pair = pair;
        self
    }

    /// Returns the quote once it has been stored.
    pub async fn latest(&self, parent: &DeadlineScope) -> Outcome<DollarQuote> {
        self.latest_traced(parent).await.into_outcome()
    }

    pub async fn latest_traced(&self, parent: &DeadlineScope) -> ServiceReport<DollarQuote> {
        let started = Instant::now();
        let call = ProviderStep::new(Self::OUTBOUND_CALL, self.api_call_budget, self.provider.clone());
        let persist = SinkStep::new(Self::PERSISTENCE, self.persistence_budget, self.sink.clone());

        let request = parent.child(Self::REQUEST, self.request_budget);
        let _release = request.release_on_drop();
        let mut chain = BudgetedChain::within(&request);
        let outcome = match chain.run(&call, self.pair.clone()).await {
            Ok(quote) => chain.run(&persist, quote).await,
            Err(failure) => Err(failure),
        };

        if let Ok(quote) = &outcome {
            info!(pair = %self.pair, bid = %quote.bid, "quote stored");
        }

        ServiceReport {
            outcome,
            stages: chain.stages().to_vec(),
            providers: vec![self.provider.id()],
            latency_ms: elapsed_ms(started),
        }
    }
}
