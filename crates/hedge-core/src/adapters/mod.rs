//! HTTP-backed providers for the public Brazilian APIs hedge queries.

mod awesomeapi;
mod brasilapi;
mod viacep;
mod weather_service;
mod weatherapi;

pub use awesomeapi::{AwesomeApiAdapter, AWESOMEAPI_BASE_URL};
pub use brasilapi::{BrasilApiAdapter, BRASILAPI_BASE_URL};
pub use viacep::{ViaCepAdapter, VIACEP_BASE_URL};
pub use weather_service::WeatherServiceAdapter;
pub use weatherapi::{WeatherApiAdapter, WEATHERAPI_BASE_URL};

use serde::de::DeserializeOwned;

use crate::deadline::DeadlineScope;
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::outcome::{Failure, Outcome};
use crate::source::ProviderId;

const BODY_SNIPPET_LEN: usize = 200;

/// Sends `request` inside `scope`, whatever status comes back.
///
/// A bounded scope replaces the request timeout with its remaining time,
/// rounded up to whole milliseconds so the scope itself fires first. The
/// request's own default only applies under an unbounded scope. Both a
/// transport timeout and scope expiry surface as `Failure::timeout` for the
/// scope's stage.
async fn send(
    client: &dyn HttpClient,
    request: HttpRequest,
    scope: &DeadlineScope,
) -> Outcome<HttpResponse> {
    let request = match scope.remaining() {
        Some(remaining) => request.with_timeout_ms(timeout_ms_for(remaining)),
        None => request,
    };

    match scope.run(client.execute(request)).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(error)) if error.is_timeout() => Err(Failure::timeout(scope.label())),
        Ok(Err(error)) => Err(Failure::transfer(error.message())),
        Err(elapsed) => Err(elapsed.into()),
    }
}

fn timeout_ms_for(remaining: std::time::Duration) -> u64 {
    let partial = u128::from(remaining.subsec_nanos() % 1_000_000 != 0);
    let millis = remaining.as_millis().saturating_add(partial);
    u64::try_from(millis).unwrap_or(u64::MAX).max(1)
}

/// Non-2xx responses become transfer failures carrying status and body.
fn require_success(provider: ProviderId, response: HttpResponse) -> Outcome<HttpResponse> {
    if response.is_success() {
        return Ok(response);
    }

    Err(Failure::transfer(format!(
        "{provider} returned HTTP {}: {}",
        response.status,
        snippet(&response.body)
    )))
}

fn decode_json<T>(provider: ProviderId, body: &str) -> Outcome<T>
where
    T: DeserializeOwned,
{
    serde_json::from_str(body)
        .map_err(|e| Failure::decode(format!("failed to parse {provider} payload: {e}")))
}

fn snippet(body: &str) -> &str {
    let body = body.trim();
    match body.char_indices().nth(BODY_SNIPPET_LEN) {
        Some((index, _)) => &body[..index],
        None => body,
    }
}

fn trim_base_url(base_url: impl Into<String>) -> String {
    let base_url = base_url.into();
    base_url.trim_end_matches('/').to_owned()
}
