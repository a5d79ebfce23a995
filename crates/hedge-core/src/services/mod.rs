//! Composed lookups built from races, chains and sinks.
//!
//! | Service | Shape | Stages |
//! |---------|-------|--------|
//! | [`QuoteService`] | chain | `outbound-call` → `persistence` |
//! | [`CepLookupService`] | race | `race` |
//! | [`WeatherService`] | chain with a nested race | `locate` → `temperature` |
//! | [`RelayService`] | chain | `forward` |

mod cep;
mod quote;
mod relay;
mod steps;
mod weather;

pub use cep::CepLookupService;
pub use quote::QuoteService;
pub use relay::RelayService;
pub use steps::{ProviderStep, RaceStep};
pub use weather::WeatherService;

use tokio::time::Instant;

use crate::chain::StageRecord;
use crate::outcome::Outcome;
use crate::source::ProviderId;

/// Outcome of a composed lookup together with what it took to produce it.
#[derive(Debug, Clone)]
pub struct ServiceReport<T> {
    pub outcome: Outcome<T>,
    pub stages: Vec<StageRecord>,
    /// Providers that contributed, winners first.
    pub providers: Vec<ProviderId>,
    pub latency_ms: u64,
}

impl<T> ServiceReport<T> {
    pub fn into_outcome(self) -> Outcome<T> {
        self.outcome
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}
