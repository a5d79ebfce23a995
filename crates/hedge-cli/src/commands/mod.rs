mod cep;
mod history;
mod quote;
mod relay;
mod weather;

use std::sync::Arc;
use std::time::Duration;

use hedge_core::{
    Address, BrasilApiAdapter, Cep, Failure, HttpClient, Provider, ProviderId, ReqwestHttpClient,
    ServiceReport, StageRecord, ViaCepAdapter,
};
use serde::Serialize;
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::config::AppConfig;
use crate::error::CliError;
use crate::output::{now_rfc3339, Envelope, EnvelopeMeta, RequestId};

/// What a command produced, before it is wrapped in an envelope.
pub struct CommandResult {
    pub data: Value,
    pub providers: Vec<ProviderId>,
    pub stages: Vec<StageRecord>,
    pub latency_ms: u64,
    pub failure: Option<Failure>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            providers: Vec::new(),
            stages: Vec::new(),
            latency_ms: 0,
            failure: None,
        }
    }

    pub fn failed(failure: Failure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::ok(Value::Null)
        }
    }

    /// Success data, or a failed result, from a service report.
    pub fn from_report<T>(report: ServiceReport<T>) -> Result<Self, CliError>
    where
        T: Serialize,
    {
        let result = match report.outcome {
            Ok(value) => Self::ok(serde_json::to_value(value)?),
            Err(failure) => Self::failed(failure),
        };
        Ok(result
            .with_providers(report.providers)
            .with_stages(report.stages)
            .with_latency(report.latency_ms))
    }

    pub fn with_providers(mut self, providers: Vec<ProviderId>) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_stages(mut self, stages: Vec<StageRecord>) -> Self {
        self.stages = stages;
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }
}

pub async fn run(cli: &Cli, config: &AppConfig) -> Result<Envelope, CliError> {
    let request_id = RequestId::new_v4();
    let http_client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());

    let result = match &cli.command {
        Command::Quote(args) => quote::run(args, config, http_client).await?,
        Command::Cep(args) => cep::run(args, config, http_client).await?,
        Command::Weather(args) => weather::run(args, config, http_client).await?,
        Command::Relay(args) => relay::run(args, config, http_client, request_id).await?,
        Command::History(args) => history::run(args, config)?,
    };

    let CommandResult {
        data,
        providers,
        stages,
        latency_ms,
        failure,
    } = result;

    let meta = EnvelopeMeta {
        request_id,
        generated_at: now_rfc3339()?,
        latency_ms,
        providers,
        stages,
    };
    Ok(Envelope::new(meta, data, failure.as_ref()))
}

/// The address providers hedge races, in registration order.
fn cep_providers(http_client: Arc<dyn HttpClient>) -> Vec<Arc<dyn Provider<Cep, Address>>> {
    vec![
        Arc::new(ViaCepAdapter::with_http_client(http_client.clone())),
        Arc::new(BrasilApiAdapter::with_http_client(http_client)),
    ]
}

/// A flag wins over the configured value.
fn budget(flag_ms: Option<u64>, configured: Duration) -> Duration {
    flag_ms.map(Duration::from_millis).unwrap_or(configured)
}
