use std::sync::Arc;

use hedge_core::{Cep, DeadlineScope, HttpClient, RelayService, WeatherServiceAdapter};

use crate::cli::RelayArgs;
use crate::config::AppConfig;
use crate::error::CliError;
use crate::output::RequestId;

use super::CommandResult;

pub async fn run(
    args: &RelayArgs,
    config: &AppConfig,
    http_client: Arc<dyn HttpClient>,
    request_id: RequestId,
) -> Result<CommandResult, CliError> {
    let cep = Cep::parse(&args.cep)?;
    let service_url = args
        .service_url
        .clone()
        .unwrap_or_else(|| config.weather_service_url.clone());

    let downstream = WeatherServiceAdapter::with_http_client(http_client, service_url)
        .with_request_id(request_id.to_string());
    let service = RelayService::new(Arc::new(downstream)).with_budget(config.forward_timeout);

    let report = service.forward(cep, &DeadlineScope::root()).await;
    CommandResult::from_report(report)
}
