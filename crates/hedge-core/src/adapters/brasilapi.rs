use std::sync::Arc;

use serde::Deserialize;

use super::{decode_json, require_success, send, trim_base_url};
use crate::deadline::DeadlineScope;
use crate::domain::{Address, Cep};
use crate::http_client::{HttpClient, HttpRequest};
use crate::outcome::Failure;
use crate::provider::{FetchFuture, Provider};
use crate::source::ProviderId;

pub const BRASILAPI_BASE_URL: &str = "https://brasilapi.com.br";

/// BrasilAPI lookup: `GET {base}/api/cep/v1/{cep}`.
#[derive(Clone)]
pub struct BrasilApiAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
}

impl BrasilApiAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: String::from(BRASILAPI_BASE_URL),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }
}

impl Provider<Cep, Address> for BrasilApiAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::BRASILAPI
    }

    fn fetch<'a>(&'a self, key: &'a Cep, scope: &'a DeadlineScope) -> FetchFuture<'a, Address> {
        Box::pin(async move {
            let url = format!("{}/api/cep/v1/{}", self.base_url, key.as_str());
            let response = send(self.http_client.as_ref(), HttpRequest::get(url), scope).await?;
            if response.status == 404 {
                return Err(Failure::empty_result(format!("brasilapi has no address for {key}")));
            }
            let response = require_success(self.id(), response)?;
            let payload: BrasilApiPayload = decode_json(self.id(), &response.body)?;

            let city = payload.city.unwrap_or_default();
            if city.trim().is_empty() {
                return Err(Failure::empty_result(format!("brasilapi returned no city for {key}")));
            }

            Ok(Address {
                cep: key.clone(),
                street: payload.street.unwrap_or_default(),
                neighborhood: payload.neighborhood.unwrap_or_default(),
                city,
                state: payload.state.unwrap_or_default(),
                provider: self.id(),
            })
        })
    }
}

#[derive(Debug, Deserialize)]
struct BrasilApiPayload {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    neighborhood: Option<String>,
    #[serde(default)]
    street: Option<String>,
}
