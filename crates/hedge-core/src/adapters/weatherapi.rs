use std::sync::Arc;

use serde::Deserialize;

use super::{decode_json, require_success, send, trim_base_url};
use crate::deadline::DeadlineScope;
use crate::domain::Temperature;
use crate::http_client::{HttpClient, HttpRequest};
use crate::outcome::Failure;
use crate::provider::{FetchFuture, Provider};
use crate::source::ProviderId;

pub const WEATHERAPI_BASE_URL: &str = "https://api.weatherapi.com";

/// weatherapi.com error code for a query that matched no location.
const NO_MATCHING_LOCATION: u32 = 1006;

/// Current temperature for a city name.
#[derive(Clone)]
pub struct WeatherApiAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    base_url: String,
}

impl WeatherApiAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            base_url: String::from(WEATHERAPI_BASE_URL),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }
}

impl Provider<String, Temperature> for WeatherApiAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::WEATHERAPI
    }

    fn fetch<'a>(&'a self, key: &'a String, scope: &'a DeadlineScope) -> FetchFuture<'a, Temperature> {
        Box::pin(async move {
            let url = format!(
                "{}/v1/current.json?key={}&q={}&aqi=no",
                self.base_url,
                urlencoding::encode(&self.api_key),
                urlencoding::encode(key)
            );
            let request = HttpRequest::get(url).with_header("content-type", "application/json");
            let response = send(self.http_client.as_ref(), request, scope).await?;

            if response.status == 400 {
                let unmatched = serde_json::from_str::<WeatherApiErrorPayload>(&response.body)
                    .is_ok_and(|payload| payload.error.code == NO_MATCHING_LOCATION);
                if unmatched {
                    return Err(Failure::empty_result(format!(
                        "weatherapi found no location matching '{key}'"
                    )));
                }
            }

            let response = require_success(self.id(), response)?;
            let payload: WeatherApiPayload = decode_json(self.id(), &response.body)?;
            Ok(Temperature::from_celsius(payload.current.temp_c))
        })
    }
}

#[derive(Debug, Deserialize)]
struct WeatherApiPayload {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temp_c: f64,
}

#[derive(Debug, Deserialize)]
struct WeatherApiErrorPayload {
    error: WeatherApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct WeatherApiErrorBody {
    code: u32,
}
