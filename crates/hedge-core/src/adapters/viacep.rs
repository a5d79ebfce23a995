use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use super::{decode_json, require_success, send, trim_base_url};
use crate::deadline::DeadlineScope;
use crate::domain::{Address, Cep};
use crate::http_client::{HttpClient, HttpRequest};
use crate::outcome::Failure;
use crate::provider::{FetchFuture, Provider};
use crate::source::ProviderId;

pub const VIACEP_BASE_URL: &str = "https://viacep.com.br";

/// ViaCEP lookup: `GET {base}/ws/{cep}/json`.
#[derive(Clone)]
pub struct ViaCepAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
}

impl ViaCepAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: String::from(VIACEP_BASE_URL),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }
}

impl Provider<Cep, Address> for ViaCepAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::VIACEP
    }

    fn fetch<'a>(&'a self, key: &'a Cep, scope: &'a DeadlineScope) -> FetchFuture<'a, Address> {
        Box::pin(async move {
            let url = format!("{}/ws/{}/json", self.base_url, key.as_str());
            let response = send(self.http_client.as_ref(), HttpRequest::get(url), scope).await?;
            let response = require_success(self.id(), response)?;
            let payload: ViaCepPayload = decode_json(self.id(), &response.body)?;

            // Unknown CEPs come back as 200 with an `erro` marker, boolean or string.
            if payload.erro.as_ref().is_some_and(is_truthy) {
                return Err(Failure::empty_result(format!("viacep has no address for {key}")));
            }

            Ok(Address {
                cep: key.clone(),
                street: payload.logradouro,
                neighborhood: payload.bairro,
                city: payload.localidade,
                state: payload.uf,
                provider: self.id(),
            })
        })
    }
}

#[derive(Debug, Deserialize)]
struct ViaCepPayload {
    #[serde(default)]
    erro: Option<Value>,
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(text) => text.eq_ignore_ascii_case("true"),
        _ => false,
    }
}
