use std::sync::Arc;

use super::{decode_json, require_success, send, trim_base_url};
use crate::deadline::DeadlineScope;
use crate::domain::{CurrencyPair, DollarQuote};
use crate::http_client::{HttpClient, HttpRequest};
use crate::outcome::Failure;
use crate::provider::{FetchFuture, Provider};
use crate::source::ProviderId;

pub const AWESOMEAPI_BASE_URL: &str = "https://economia.awesomeapi.com.br";

/// Exchange-rate lookup: `GET {base}/json/{pair}`, answered with a JSON array
/// whose first element is the latest quote.
#[derive(Clone)]
pub struct AwesomeApiAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
}

impl AwesomeApiAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: String::from(AWESOMEAPI_BASE_URL),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }
}

impl Provider<CurrencyPair, DollarQuote> for AwesomeApiAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::AWESOMEAPI
    }

    fn fetch<'a>(
        &'a self,
        key: &'a CurrencyPair,
        scope: &'a DeadlineScope,
    ) -> FetchFuture<'a, DollarQuote> {
        Box::pin(async move {
            let url = format!("{}/json/{key}", self.base_url);
            let response = send(self.http_client.as_ref(), HttpRequest::get(url), scope).await?;
            let response = require_success(self.id(), response)?;
            let quotes: Vec<DollarQuote> = decode_json(self.id(), &response.body)?;

            quotes
                .into_iter()
                .next()
                .ok_or_else(|| Failure::empty_result(format!("no quotes found for {key}")))
        })
    }
}
