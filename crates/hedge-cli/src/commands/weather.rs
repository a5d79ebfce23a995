use std::sync::Arc;

use hedge_core::{
    Cep, DeadlineScope, HttpClient, RaceCoordinator, ValidationError, WeatherApiAdapter,
    WeatherService,
};

use crate::cli::WeatherArgs;
use crate::config::AppConfig;
use crate::error::CliError;

use super::{cep_providers, CommandResult};

pub async fn run(
    args: &WeatherArgs,
    config: &AppConfig,
    http_client: Arc<dyn HttpClient>,
) -> Result<CommandResult, CliError> {
    let cep = Cep::parse(&args.cep)?;
    let api_key = args
        .weather_api_key
        .clone()
        .or_else(|| config.weather_api_key.clone())
        .ok_or(ValidationError::InvalidConfig {
            key: "HEDGE_WEATHER_API_KEY",
            value: String::new(),
        })?;

    let locate = RaceCoordinator::new(cep_providers(http_client.clone()))?;
    let service = WeatherService::new(
        locate,
        Arc::new(WeatherApiAdapter::with_http_client(http_client, api_key)),
    )
    .with_budgets(config.locate_timeout, config.temperature_timeout);

    let report = service.current(cep, &DeadlineScope::root()).await;
    CommandResult::from_report(report)
}
