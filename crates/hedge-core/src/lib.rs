//! # Hedge Core
//!
//! Bounded-latency lookups: concurrent provider races and sequential chains of
//! independently budgeted steps, with a failure taxonomy that names the stage
//! that ran out of time.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`deadline`] | Nested, cancellable deadline scopes |
//! | [`outcome`] | `Outcome` and the closed `FailureKind` set |
//! | [`provider`] | Provider capability shared by races and chains |
//! | [`race`] | First-success race coordinator |
//! | [`chain`] | Budgeted chain of named steps |
//! | [`sink`] | Result sinks (memory, DuckDB warehouse) |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`adapters`] | ViaCEP, BrasilAPI, AwesomeAPI, WeatherAPI and weather-service providers |
//! | [`domain`] | CEP, address, quote and temperature types |
//! | [`services`] | Composed quote, CEP, weather and relay lookups |
//! | [`source`] | Provider identifiers |
//! | [`error`] | Validation and crate-level errors |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ Services         │  quote / cep / weather / relay
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │ Budgeted Chain   │────▶│ Result Sink      │
//! └────────┬─────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │ Race Coordinator │
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │ Provider         │────▶│ HTTP Client      │
//! │ (Adapter Trait)  │     │ (reqwest/script) │
//! └────────┬─────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │ Deadline Scope   │
//! └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Lookups resolve to an [`Outcome`]. A failure's kind and stage tell a slow
//! upstream apart from a slow database:
//!
//! ```rust
//! use hedge_core::{Failure, FailureKind};
//!
//! fn describe(failure: &Failure) -> String {
//!     match (failure.kind(), failure.stage()) {
//!         (FailureKind::Timeout, Some("persistence")) => String::from("database too slow"),
//!         (FailureKind::Timeout, Some(stage)) => format!("{stage} too slow"),
//!         (FailureKind::EmptyResult, _) => String::from("nothing found"),
//!         _ => failure.to_string(),
//!     }
//! }
//! ```

pub mod adapters;
pub mod chain;
pub mod deadline;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod outcome;
pub mod provider;
pub mod race;
pub mod services;
pub mod sink;
pub mod source;

pub use adapters::{
    AwesomeApiAdapter, BrasilApiAdapter, ViaCepAdapter, WeatherApiAdapter, WeatherServiceAdapter,
};
pub use chain::{step_fn, BudgetedChain, FnStep, StageRecord, StageStatus, Step, StepFuture};
pub use deadline::{DeadlineScope, Elapsed};
pub use domain::{Address, Cep, CityWeather, CurrencyPair, DollarQuote, Temperature};
pub use error::{CoreError, ValidationError};
pub use hedge_warehouse::{StoredDollarQuote, Warehouse, WarehouseConfig, WarehouseError};
pub use http_client::{
    HttpClient, HttpError, HttpFuture, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
    ScriptedHttpClient,
};
pub use outcome::{Failure, FailureKind, Outcome};
pub use provider::{FetchFuture, Provider};
pub use race::{
    AttemptRecord, AttemptState, LoserPolicy, RaceCoordinator, RaceLoss, RaceResult, RaceWin,
};
pub use services::{
    CepLookupService, ProviderStep, QuoteService, RaceStep, RelayService, ServiceReport,
    WeatherService,
};
pub use sink::{MemorySink, ResultSink, SinkFuture, SinkStep, WarehouseSink};
pub use source::ProviderId;
