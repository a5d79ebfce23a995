use std::path::PathBuf;
use std::time::Duration;

use hedge_core::{CepLookupService, QuoteService, RelayService, ValidationError, WeatherService};
use hedge_warehouse::WarehouseConfig;

pub const DEFAULT_WEATHER_SERVICE_URL: &str = "http://localhost:8081";

/// Runtime settings read from `HEDGE_*` environment variables.
///
/// Unset variables fall back to the service defaults; set but unparsable
/// values are rejected rather than ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_call_timeout: Duration,
    pub db_operation_timeout: Duration,
    pub quote_timeout: Duration,
    pub race_timeout: Duration,
    pub locate_timeout: Duration,
    pub temperature_timeout: Duration,
    pub forward_timeout: Duration,
    pub weather_api_key: Option<String>,
    pub weather_service_url: String,
    pub hedge_home: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_call_timeout: QuoteService::DEFAULT_API_CALL_BUDGET,
            db_operation_timeout: QuoteService::DEFAULT_PERSISTENCE_BUDGET,
            quote_timeout: QuoteService::DEFAULT_REQUEST_BUDGET,
            race_timeout: CepLookupService::DEFAULT_BUDGET,
            locate_timeout: WeatherService::DEFAULT_LOCATE_BUDGET,
            temperature_timeout: WeatherService::DEFAULT_TEMPERATURE_BUDGET,
            forward_timeout: RelayService::DEFAULT_BUDGET,
            weather_api_key: None,
            weather_service_url: String::from(DEFAULT_WEATHER_SERVICE_URL),
            hedge_home: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let millis = |key: &'static str, default: Duration| -> Result<Duration, ValidationError> {
            match non_empty(lookup(key)) {
                Some(raw) => parse_millis(key, &raw),
                None => Ok(default),
            }
        };

        Ok(Self {
            api_call_timeout: millis("HEDGE_API_CALL_TIMEOUT_MS", defaults.api_call_timeout)?,
            db_operation_timeout: millis(
                "HEDGE_DB_OPERATION_TIMEOUT_MS",
                defaults.db_operation_timeout,
            )?,
            quote_timeout: millis("HEDGE_QUOTE_TIMEOUT_MS", defaults.quote_timeout)?,
            race_timeout: millis("HEDGE_RACE_TIMEOUT_MS", defaults.race_timeout)?,
            locate_timeout: millis("HEDGE_LOCATE_TIMEOUT_MS", defaults.locate_timeout)?,
            temperature_timeout: millis(
                "HEDGE_TEMPERATURE_TIMEOUT_MS",
                defaults.temperature_timeout,
            )?,
            forward_timeout: millis("HEDGE_FORWARD_TIMEOUT_MS", defaults.forward_timeout)?,
            weather_api_key: non_empty(lookup("HEDGE_WEATHER_API_KEY")),
            weather_service_url: non_empty(lookup("HEDGE_WEATHER_SERVICE_URL"))
                .unwrap_or(defaults.weather_service_url),
            hedge_home: non_empty(lookup("HEDGE_HOME")).map(PathBuf::from),
        })
    }

    pub fn warehouse_config(&self) -> WarehouseConfig {
        match &self.hedge_home {
            Some(home) => WarehouseConfig::under(home),
            None => WarehouseConfig::default(),
        }
    }
}

/// Parses a flag or variable given in milliseconds.
pub fn parse_millis(key: &'static str, raw: &str) -> Result<Duration, ValidationError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ValidationError::InvalidConfig {
            key,
            value: raw.to_owned(),
        })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
