use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::{elapsed_ms, ProviderStep, ServiceReport};
use crate::chain::BudgetedChain;
use crate::deadline::DeadlineScope;
use crate::domain::{Cep, CityWeather};
use crate::provider::Provider;

/// Front hop of the two-service weather chain: hands a validated CEP to the
/// downstream weather service.
pub struct RelayService {
    downstream: Arc<dyn Provider<Cep, CityWeather>>,
    budget: Duration,
}

impl RelayService {
    pub const FORWARD: &'static str = "forward";
    pub const DEFAULT_BUDGET: Duration = Duration::from_millis(5_000);

    pub fn new(downstream: Arc<dyn Provider<Cep, CityWeather>>) -> Self {
        Self {
            downstream,
            budget: Self::DEFAULT_BUDGET,
        }
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub async fn forward(&self, cep: Cep, parent: &DeadlineScope) -> ServiceReport<CityWeather> {
        let started = Instant::now();
        let forward = ProviderStep::new(Self::FORWARD, self.budget, self.downstream.clone());

        let mut chain = BudgetedChain::within(parent);
        let outcome = chain.run(&forward, cep).await;

        ServiceReport {
            outcome,
            stages: chain.stages().to_vec(),
            providers: vec![self.downstream.id()],
            latency_ms: elapsed_ms(started),
        }
    }
}
