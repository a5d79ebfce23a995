use std::sync::Arc;

use hedge_core::{
    Address, Cep, CepLookupService, DeadlineScope, HttpClient, ProviderId, RaceCoordinator,
    StageRecord, StageStatus, ValidationError,
};
use serde::Serialize;

use crate::cli::CepArgs;
use crate::config::AppConfig;
use crate::error::CliError;

use super::{budget, cep_providers, CommandResult};

#[derive(Debug, Serialize)]
struct CepResponseData {
    address: Address,
    winner: ProviderId,
}

pub async fn run(
    args: &CepArgs,
    config: &AppConfig,
    http_client: Arc<dyn HttpClient>,
) -> Result<CommandResult, CliError> {
    let cep = Cep::parse(&args.cep)?;
    let sources = parse_sources(&args.sources)?;

    let mut race = RaceCoordinator::new(cep_providers(http_client))?;
    if !sources.is_empty() {
        race = race.restricted_to(&sources)?;
    }
    let providers = race.provider_ids();
    let service = CepLookupService::from_race(race)
        .with_budget(budget(args.race_timeout_ms, config.race_timeout));

    let result = match service.lookup(cep, &DeadlineScope::root()).await {
        Ok(win) => {
            let stage = race_stage(win.latency_ms, None);
            let latency_ms = win.latency_ms;
            let data = serde_json::to_value(CepResponseData {
                winner: win.winner,
                address: win.value,
            })?;
            CommandResult::ok(data)
                .with_providers(vec![win.winner])
                .with_stages(vec![stage])
                .with_latency(latency_ms)
        }
        Err(loss) => CommandResult::failed(loss.failure.clone())
            .with_providers(providers)
            .with_stages(vec![race_stage(loss.latency_ms, Some(&loss.failure))])
            .with_latency(loss.latency_ms),
    };

    Ok(result)
}

/// Only address providers may take part in a CEP race.
fn parse_sources(raw: &[String]) -> Result<Vec<ProviderId>, ValidationError> {
    raw.iter()
        .map(|value| {
            let id = value.parse::<ProviderId>()?;
            if id == ProviderId::VIACEP || id == ProviderId::BRASILAPI {
                Ok(id)
            } else {
                Err(ValidationError::InvalidProvider {
                    value: value.clone(),
                    expected: String::from("viacep, brasilapi"),
                })
            }
        })
        .collect()
}

fn race_stage(elapsed_ms: u64, failure: Option<&hedge_core::Failure>) -> StageRecord {
    StageRecord {
        name: String::from(RaceCoordinator::<Cep, Address>::STAGE),
        elapsed_ms,
        status: if failure.is_some() {
            StageStatus::Failed
        } else {
            StageStatus::Succeeded
        },
        failure: failure.map(|failure| failure.kind()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cep_sources_parse_case_insensitively() {
        let sources = parse_sources(&[String::from("ViaCEP"), String::from("brasilapi")])
            .expect("valid sources");

        assert_eq!(sources, vec![ProviderId::VIACEP, ProviderId::BRASILAPI]);
    }

    #[test]
    fn non_address_providers_are_rejected() {
        let error = parse_sources(&[String::from("awesomeapi")]).expect_err("not a cep api");

        assert!(matches!(
            error,
            ValidationError::InvalidProvider { ref value, .. } if value == "awesomeapi"
        ));
    }

    #[test]
    fn unknown_providers_are_rejected() {
        assert!(parse_sources(&[String::from("postmon")]).is_err());
    }
}
