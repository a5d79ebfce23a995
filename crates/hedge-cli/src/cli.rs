//! CLI argument definitions for hedge.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `quote` | Fetch the USD-BRL rate and store it under per-stage budgets |
//! | `cep` | Race the CEP APIs and return the first address |
//! | `weather` | Locate a CEP and report its current temperature |
//! | `relay` | Forward a CEP to a downstream weather service |
//! | `history` | List recently stored quotes |
//!
//! Every timeout flag overrides the matching `HEDGE_*` environment variable.
//!
//! # Examples
//!
//! ```bash
//! hedge quote --append-to cotacao.txt
//! hedge cep 01001000 --source viacep --pretty
//! HEDGE_WEATHER_API_KEY=... hedge weather 22461000
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// hedge - bounded-latency lookups against Brazilian public APIs
#[derive(Debug, Parser)]
#[command(
    name = "hedge",
    author,
    version,
    about = "Bounded-latency lookups against Brazilian public APIs",
    long_about = "hedge races redundant providers and chains budgeted steps so every \
lookup ends by its deadline. Failures name the stage that ran out of time.\n\
\n\
Output is a single JSON envelope on stdout; logs go to stderr (RUST_LOG)."
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the latest dollar quote and persist it.
    Quote(QuoteArgs),
    /// Look up the address for a CEP.
    Cep(CepArgs),
    /// Current temperature for the city of a CEP.
    Weather(WeatherArgs),
    /// Forward a CEP to the downstream weather service.
    Relay(RelayArgs),
    /// Show recently stored quotes.
    History(HistoryArgs),
}

#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// Budget for the whole quote request, call and write included.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Budget for the outbound API call.
    #[arg(long)]
    pub api_timeout_ms: Option<u64>,

    /// Budget for the database write.
    #[arg(long)]
    pub db_timeout_ms: Option<u64>,

    /// Append `Dólar: {bid}` to this file after a successful lookup.
    #[arg(long, value_name = "FILE")]
    pub append_to: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CepArgs {
    /// Eight-digit CEP.
    pub cep: String,

    /// Deadline for the whole race.
    #[arg(long)]
    pub race_timeout_ms: Option<u64>,

    /// Restrict the race to these providers (repeatable).
    #[arg(long = "source", value_name = "PROVIDER")]
    pub sources: Vec<String>,
}

#[derive(Debug, Args)]
pub struct WeatherArgs {
    /// Eight-digit CEP.
    pub cep: String,

    /// weatherapi.com key; falls back to HEDGE_WEATHER_API_KEY.
    #[arg(long)]
    pub weather_api_key: Option<String>,
}

#[derive(Debug, Args)]
pub struct RelayArgs {
    /// Eight-digit CEP.
    pub cep: String,

    /// Downstream weather service; falls back to HEDGE_WEATHER_SERVICE_URL.
    #[arg(long)]
    pub service_url: Option<String>,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}
