use std::sync::Arc;
use std::time::Duration;

use crate::deadline::DeadlineScope;
use crate::domain::{Address, Cep};
use crate::error::ValidationError;
use crate::provider::Provider;
use crate::race::{RaceCoordinator, RaceResult};

/// Resolves a CEP by racing every configured address provider.
#[derive(Clone)]
pub struct CepLookupService {
    race: RaceCoordinator<Cep, Address>,
    budget: Duration,
}

impl CepLookupService {
    pub const DEFAULT_BUDGET: Duration = Duration::from_millis(1_000);

    pub fn new(providers: Vec<Arc<dyn Provider<Cep, Address>>>) -> Result<Self, ValidationError> {
        Ok(Self::from_race(RaceCoordinator::new(providers)?))
    }

    pub fn from_race(race: RaceCoordinator<Cep, Address>) -> Self {
        Self {
            race,
            budget: Self::DEFAULT_BUDGET,
        }
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub fn race(&self) -> &RaceCoordinator<Cep, Address> {
        &self.race
    }

    /// Races the providers inside a `race` scope nested in `parent`.
    ///
    /// The race scope is released on return, so detached losers are told to
    /// stop as soon as the lookup is decided.
    pub async fn lookup(&self, cep: Cep, parent: &DeadlineScope) -> RaceResult<Address> {
        let scope = parent.child(RaceCoordinator::<Cep, Address>::STAGE, self.budget);
        let _release = scope.release_on_drop();
        self.race.race(cep, &scope).await
    }
}
