use std::sync::Arc;
use std::time::Duration;

use crate::chain::{Step, StepFuture};
use crate::deadline::DeadlineScope;
use crate::outcome::Failure;
use crate::provider::Provider;
use crate::race::RaceCoordinator;

/// Chain step that asks a single provider for the value of its input key.
pub struct ProviderStep<K, V> {
    name: String,
    budget: Duration,
    provider: Arc<dyn Provider<K, V>>,
}

impl<K, V> ProviderStep<K, V> {
    pub fn new(name: impl Into<String>, budget: Duration, provider: Arc<dyn Provider<K, V>>) -> Self {
        Self {
            name: name.into(),
            budget,
            provider,
        }
    }
}

impl<K, V> Step<K> for ProviderStep<K, V>
where
    K: Send + Sync + 'static,
    V: Send + 'static,
{
    type Output = V;

    fn name(&self) -> &str {
        &self.name
    }

    fn budget(&self) -> Duration {
        self.budget
    }

    fn run<'a>(&'a self, input: K, scope: DeadlineScope) -> StepFuture<'a, V> {
        Box::pin(async move { self.provider.fetch(&input, &scope).await })
    }
}

/// Chain step whose action is a whole race; the race runs in the step scope.
pub struct RaceStep<K, V> {
    name: String,
    budget: Duration,
    race: RaceCoordinator<K, V>,
}

impl<K, V> RaceStep<K, V> {
    pub fn new(name: impl Into<String>, budget: Duration, race: RaceCoordinator<K, V>) -> Self {
        Self {
            name: name.into(),
            budget,
            race,
        }
    }
}

impl<K, V> Step<K> for RaceStep<K, V>
where
    K: Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    type Output = V;

    fn name(&self) -> &str {
        &self.name
    }

    fn budget(&self) -> Duration {
        self.budget
    }

    fn run<'a>(&'a self, input: K, scope: DeadlineScope) -> StepFuture<'a, V> {
        Box::pin(async move {
            self.race
                .race(input, &scope)
                .await
                .map(|win| win.value)
                .map_err(Failure::from)
        })
    }
}
