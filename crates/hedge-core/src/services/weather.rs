use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::{elapsed_ms, ProviderStep, RaceStep, ServiceReport};
use crate::chain::BudgetedChain;
use crate::deadline::DeadlineScope;
use crate::domain::{Address, Cep, CityWeather, Temperature};
use crate::provider::Provider;
use crate::race::RaceCoordinator;

/// CEP → city → current temperature.
///
/// The `locate` stage is itself a race of the address providers, so a slow
/// provider costs nothing as long as another one answers.
pub struct WeatherService {
    locate: RaceCoordinator<Cep, Address>,
    temperature: Arc<dyn Provider<String, Temperature>>,
    locate_budget: Duration,
    temperature_budget: Duration,
}

impl WeatherService {
    pub const LOCATE: &'static str = "locate";
    pub const TEMPERATURE: &'static str = "temperature";
    pub const DEFAULT_LOCATE_BUDGET: Duration = Duration::from_millis(5_000);
    pub const DEFAULT_TEMPERATURE_BUDGET: Duration = Duration::from_millis(5_000);

    pub fn new(
        locate: RaceCoordinator<Cep, Address>,
        temperature: Arc<dyn Provider<String, Temperature>>,
    ) -> Self {
        Self {
            locate,
            temperature,
            locate_budget: Self::DEFAULT_LOCATE_BUDGET,
            temperature_budget: Self::DEFAULT_TEMPERATURE_BUDGET,
        }
    }

    pub fn with_budgets(mut self, locate_budget: Duration, temperature_budget: Duration) -> Self {
        self.locate_budget = locate_budget;
        self.temperature_budget = temperature_budget;
        self
    }

    pub async fn current(&self, cep: Cep, parent: &DeadlineScope) -> ServiceReport<CityWeather> {
        let started = Instant::now();
        let locate = RaceStep::new(Self::LOCATE, self.locate_budget, self.locate.clone());
        let temperature =
            ProviderStep::new(Self::TEMPERATURE, self.temperature_budget, self.temperature.clone());

        let mut chain = BudgetedChain::within(parent);
        let mut providers = Vec::new();
        let outcome = match chain.run(&locate, cep).await {
            Ok(address) => {
                providers.push(address.provider);
                chain
                    .run(&temperature, address.city.clone())
                    .await
                    .map(|temperature| CityWeather {
                        city: address.city,
                        temperature,
                    })
            }
            Err(failure) => {
                providers.extend(self.locate.provider_ids());
                Err(failure)
            }
        };
        providers.push(self.temperature.id());

        ServiceReport {
            outcome,
            stages: chain.stages().to_vec(),
            providers,
            latency_ms: elapsed_ms(started),
        }
    }
}
