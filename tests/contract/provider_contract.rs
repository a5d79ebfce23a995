use std::sync::Arc;
use std::time::Duration;

use hedge_core::{
    Address, AwesomeApiAdapter, BrasilApiAdapter, BudgetedChain, Cep, CityWeather, CurrencyPair,
    DeadlineScope, DollarQuote, FailureKind, HttpError, HttpMethod, Provider, ProviderId,
    ProviderStep, ScriptedHttpClient, Temperature, ViaCepAdapter, WeatherApiAdapter,
    WeatherServiceAdapter,
};

const VIACEP_BODY: &str = r#"{
    "cep": "01001-000",
    "logradouro": "Praça da Sé",
    "complemento": "lado ímpar",
    "bairro": "Sé",
    "localidade": "São Paulo",
    "uf": "SP",
    "ibge": "3550308"
}"#;

const BRASILAPI_BODY: &str = r#"{
    "cep": "01001000",
    "state": "SP",
    "city": "São Paulo",
    "neighborhood": "Sé",
    "street": "Praça da Sé",
    "service": "open-cep"
}"#;

const AWESOMEAPI_BODY: &str = r#"[{
    "code": "USD", "codein": "BRL", "name": "Dólar Americano/Real Brasileiro",
    "high": "5.0601", "low": "5.0245", "varBid": "0.0108", "pctChange": "0.21",
    "bid": "5.0503", "ask": "5.0513", "timestamp": "1715371195",
    "create_date": "2024-05-10 16:59:55"
}]"#;

struct CepCase {
    id: ProviderId,
    build: fn(Arc<ScriptedHttpClient>) -> Arc<dyn Provider<Cep, Address>>,
    found_body: &'static str,
    expected_path: &'static str,
}

fn cep_cases() -> Vec<CepCase> {
    vec![
        CepCase {
            id: ProviderId::VIACEP,
            build: |client| {
                Arc::new(ViaCepAdapter::with_http_client(client).with_base_url("http://viacep.test/"))
                    as Arc<dyn Provider<Cep, Address>>
            },
            found_body: VIACEP_BODY,
            expected_path: "http://viacep.test/ws/01001000/json",
        },
        CepCase {
            id: ProviderId::BRASILAPI,
            build: |client| {
                Arc::new(BrasilApiAdapter::with_http_client(client).with_base_url("http://brasilapi.test"))
                    as Arc<dyn Provider<Cep, Address>>
            },
            found_body: BRASILAPI_BODY,
            expected_path: "http://brasilapi.test/api/cep/v1/01001000",
        },
    ]
}

fn cep() -> Cep {
    Cep::parse("01001000").expect("valid cep")
}

fn scope() -> DeadlineScope {
    DeadlineScope::new("contract", Duration::from_secs(1))
}

// =============================================================================
// CEP providers
// =============================================================================

#[tokio::test]
async fn cep_providers_normalize_a_found_address() {
    for case in cep_cases() {
        let client = Arc::new(ScriptedHttpClient::ok_json(case.found_body));
        let provider = (case.build)(client.clone());

        let address = provider
            .fetch(&cep(), &scope())
            .await
            .unwrap_or_else(|failure| panic!("provider '{}' failed: {failure}", case.id));

        assert_eq!(provider.id(), case.id);
        assert_eq!(address.city, "São Paulo", "provider '{}': city", case.id);
        assert_eq!(address.state, "SP", "provider '{}': state", case.id);
        assert_eq!(address.street, "Praça da Sé", "provider '{}': street", case.id);
        assert_eq!(address.cep, cep(), "provider '{}': cep", case.id);
        assert_eq!(address.provider, case.id);
        assert_eq!(client.requests()[0].url, case.expected_path);
        assert_eq!(client.requests()[0].method, HttpMethod::Get);
    }
}

#[tokio::test]
async fn cep_providers_classify_malformed_bodies_as_decode_failures() {
    for case in cep_cases() {
        let provider = (case.build)(Arc::new(ScriptedHttpClient::ok_json("<html>oops</html>")));

        let failure = provider.fetch(&cep(), &scope()).await.expect_err("bad body");

        assert_eq!(failure.kind(), FailureKind::Decode, "provider '{}'", case.id);
    }
}

#[tokio::test]
async fn cep_providers_classify_server_errors_as_transfer_failures() {
    for case in cep_cases() {
        let provider = (case.build)(Arc::new(ScriptedHttpClient::responding(502, "bad gateway")));

        let failure = provider.fetch(&cep(), &scope()).await.expect_err("5xx");

        assert_eq!(failure.kind(), FailureKind::Transfer, "provider '{}'", case.id);
        assert!(failure.message().contains("502"), "provider '{}'", case.id);
    }
}

#[tokio::test]
async fn cep_providers_classify_transport_errors_as_transfer_failures() {
    for case in cep_cases() {
        let provider = (case.build)(Arc::new(ScriptedHttpClient::failing(HttpError::new(
            "connection refused",
        ))));

        let failure = provider.fetch(&cep(), &scope()).await.expect_err("refused");

        assert_eq!(failure.kind(), FailureKind::Transfer, "provider '{}'", case.id);
    }
}

#[tokio::test(start_paused = true)]
async fn cep_providers_time_out_with_the_scope_label() {
    for case in cep_cases() {
        let client = ScriptedHttpClient::ok_json(case.found_body).with_delay(Duration::from_secs(3));
        let provider = (case.build)(Arc::new(client));
        let scope = DeadlineScope::new("race", Duration::from_millis(100));

        let failure = provider.fetch(&cep(), &scope).await.expect_err("too slow");

        assert!(failure.is_timeout(), "provider '{}'", case.id);
        assert_eq!(failure.stage(), Some("race"), "provider '{}'", case.id);
    }
}

#[tokio::test]
async fn viacep_error_marker_is_an_empty_result() {
    for body in [r#"{"erro": true}"#, r#"{"erro": "true"}"#] {
        let adapter = ViaCepAdapter::with_http_client(Arc::new(ScriptedHttpClient::ok_json(body)));

        let failure = adapter.fetch(&cep(), &scope()).await.expect_err("unknown cep");

        assert_eq!(failure.kind(), FailureKind::EmptyResult, "{body}");
    }
}

#[tokio::test]
async fn brasilapi_not_found_and_blank_city_are_empty_results() {
    let not_found = BrasilApiAdapter::with_http_client(Arc::new(ScriptedHttpClient::responding(
        404,
        r#"{"message":"Todos os serviços de CEP retornaram erro.","type":"service_error"}"#,
    )));
    let blank_city = BrasilApiAdapter::with_http_client(Arc::new(ScriptedHttpClient::ok_json(
        r#"{"cep":"01001000","state":"SP","city":"","neighborhood":null,"street":null}"#,
    )));

    for adapter in [not_found, blank_city] {
        let failure = adapter.fetch(&cep(), &scope()).await.expect_err("no city");
        assert_eq!(failure.kind(), FailureKind::EmptyResult);
    }
}

// =============================================================================
// Exchange-rate provider
// =============================================================================

#[tokio::test]
async fn awesomeapi_returns_the_first_quote_of_the_array() {
    let client = Arc::new(ScriptedHttpClient::ok_json(AWESOMEAPI_BODY));
    let adapter = AwesomeApiAdapter::with_http_client(client.clone()).with_base_url("http://fx.test");

    let quote: DollarQuote = adapter
        .fetch(&CurrencyPair::default(), &scope())
        .await
        .expect("quote");

    assert_eq!(quote.bid, "5.0503");
    assert_eq!(quote.var_bid, "0.0108");
    assert_eq!(client.requests()[0].url, "http://fx.test/json/USD-BRL");
}

#[tokio::test]
async fn awesomeapi_empty_array_is_an_empty_result() {
    let adapter = AwesomeApiAdapter::with_http_client(Arc::new(ScriptedHttpClient::ok_json("[]")));

    let failure = adapter
        .fetch(&CurrencyPair::default(), &scope())
        .await
        .expect_err("no quotes");

    assert_eq!(failure.kind(), FailureKind::EmptyResult);
}

#[tokio::test]
async fn request_timeout_never_exceeds_the_remaining_budget() {
    let client = Arc::new(ScriptedHttpClient::ok_json(AWESOMEAPI_BODY));
    let adapter = AwesomeApiAdapter::with_http_client(client.clone());
    let scope = DeadlineScope::new("outbound-call", Duration::from_millis(200));

    adapter
        .fetch(&CurrencyPair::default(), &scope)
        .await
        .expect("quote");

    assert!(client.requests()[0].timeout_ms <= 200);
}

#[tokio::test(start_paused = true)]
async fn a_slow_upstream_succeeds_when_the_step_budget_outlasts_the_default_timeout() {
    let client = Arc::new(
        ScriptedHttpClient::ok_json(VIACEP_BODY).with_delay(Duration::from_secs(6)),
    );
    let adapter = Arc::new(ViaCepAdapter::with_http_client(client.clone()))
        as Arc<dyn Provider<Cep, Address>>;
    let step = ProviderStep::new("outbound-call", Duration::from_secs(10), adapter);
    let mut chain = BudgetedChain::new();

    let address = chain.run(&step, cep()).await.expect("6s upstream inside a 10s budget");

    assert_eq!(address.city, "São Paulo");
    assert!(client.requests()[0].timeout_ms > 5_000);
    assert!(client.requests()[0].timeout_ms <= 10_000);
}

// =============================================================================
// Weather providers
// =============================================================================

#[tokio::test]
async fn weatherapi_converts_celsius_and_encodes_the_city() {
    let client = Arc::new(ScriptedHttpClient::ok_json(
        r#"{"location":{"name":"São Paulo"},"current":{"temp_c":25.0,"temp_f":77.0}}"#,
    ));
    let adapter =
        WeatherApiAdapter::with_http_client(client.clone(), "secret").with_base_url("http://wx.test");

    let temperature: Temperature = adapter
        .fetch(&String::from("São Paulo"), &scope())
        .await
        .expect("temperature");

    assert_eq!(temperature, Temperature::from_celsius(25.0));
    assert_eq!(
        client.requests()[0].url,
        "http://wx.test/v1/current.json?key=secret&q=S%C3%A3o%20Paulo&aqi=no"
    );
}

#[tokio::test]
async fn weatherapi_unknown_location_is_an_empty_result() {
    let adapter = WeatherApiAdapter::with_http_client(
        Arc::new(ScriptedHttpClient::responding(
            400,
            r#"{"error":{"code":1006,"message":"No matching location found."}}"#,
        )),
        "secret",
    );

    let failure = adapter
        .fetch(&String::from("Atlantis"), &scope())
        .await
        .expect_err("unknown city");

    assert_eq!(failure.kind(), FailureKind::EmptyResult);
}

#[tokio::test]
async fn weatherapi_rejected_key_is_a_transfer_failure() {
    let adapter = WeatherApiAdapter::with_http_client(
        Arc::new(ScriptedHttpClient::responding(
            401,
            r#"{"error":{"code":2006,"message":"API key is invalid."}}"#,
        )),
        "wrong",
    );

    let failure = adapter
        .fetch(&String::from("Recife"), &scope())
        .await
        .expect_err("bad key");

    assert_eq!(failure.kind(), FailureKind::Transfer);
}

#[tokio::test]
async fn weather_service_posts_the_cep_with_a_request_id() {
    let client = Arc::new(ScriptedHttpClient::ok_json(
        r#"{"city":"São Paulo","temp_C":25.0,"temp_F":77.0,"temp_K":298.0}"#,
    ));
    let adapter = WeatherServiceAdapter::with_http_client(client.clone(), "http://service-b.test/weather")
        .with_request_id("req-123");

    let weather: CityWeather = adapter.fetch(&cep(), &scope()).await.expect("weather");

    let request = &client.requests()[0];
    assert_eq!(weather.city, "São Paulo");
    assert_eq!(weather.temperature.kelvin, 298.0);
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.url, "http://service-b.test/weather");
    assert_eq!(request.body.as_deref(), Some(r#"{"cep":"01001000"}"#));
    assert_eq!(request.headers.get("x-request-id").map(String::as_str), Some("req-123"));
}

#[tokio::test]
async fn weather_service_not_found_is_an_empty_result() {
    let adapter = WeatherServiceAdapter::with_http_client(
        Arc::new(ScriptedHttpClient::responding(404, "can not find zipcode")),
        "http://service-b.test/weather",
    );

    let failure = adapter.fetch(&cep(), &scope()).await.expect_err("not found");

    assert_eq!(failure.kind(), FailureKind::EmptyResult);
}
