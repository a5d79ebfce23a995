use std::sync::Arc;

use serde_json::json;

use super::{decode_json, require_success, send};
use crate::deadline::DeadlineScope;
use crate::domain::{Cep, CityWeather};
use crate::http_client::{HttpClient, HttpRequest};
use crate::outcome::Failure;
use crate::provider::{FetchFuture, Provider};
use crate::source::ProviderId;

/// Downstream hop of the two-service weather chain.
///
/// Posts `{"cep": ".."}` to a remote weather service and expects
/// `{"city", "temp_C", "temp_F", "temp_K"}` back.
#[derive(Clone)]
pub struct WeatherServiceAdapter {
    http_client: Arc<dyn HttpClient>,
    service_url: String,
    request_id: Option<String>,
}

impl WeatherServiceAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>, service_url: impl Into<String>) -> Self {
        Self {
            http_client,
            service_url: service_url.into(),
            request_id: None,
        }
    }

    /// Propagated downstream as `x-request-id`.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

impl Provider<Cep, CityWeather> for WeatherServiceAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::WEATHER_SERVICE
    }

    fn fetch<'a>(&'a self, key: &'a Cep, scope: &'a DeadlineScope) -> FetchFuture<'a, CityWeather> {
        Box::pin(async move {
            let mut request = HttpRequest::post(&self.service_url)
                .with_header("content-type", "application/json")
                .with_body(json!({ "cep": key.as_str() }).to_string());
            if let Some(request_id) = &self.request_id {
                request = request.with_header("x-request-id", request_id);
            }

            let response = send(self.http_client.as_ref(), request, scope).await?;
            if response.status == 404 {
                return Err(Failure::empty_result(format!(
                    "weather service can not find zipcode {key}"
                )));
            }
            let response = require_success(self.id(), response)?;
            decode_json(self.id(), &response.body)
        })
    }
}
