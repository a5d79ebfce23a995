use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use hedge_core::{
    AwesomeApiAdapter, DeadlineScope, DollarQuote, HttpClient, QuoteService, WarehouseSink,
};
use hedge_warehouse::Warehouse;
use tracing::info;

use crate::cli::QuoteArgs;
use crate::config::AppConfig;
use crate::error::CliError;

use super::{budget, CommandResult};

pub async fn run(
    args: &QuoteArgs,
    config: &AppConfig,
    http_client: Arc<dyn HttpClient>,
) -> Result<CommandResult, CliError> {
    let warehouse = Warehouse::open(config.warehouse_config())?;
    let service = QuoteService::new(
        Arc::new(AwesomeApiAdapter::with_http_client(http_client)),
        Arc::new(WarehouseSink::new(warehouse)),
    )
    .with_budgets(
        budget(args.api_timeout_ms, config.api_call_timeout),
        budget(args.db_timeout_ms, config.db_operation_timeout),
    )
    .with_request_budget(budget(args.timeout_ms, config.quote_timeout));

    let report = service.latest_traced(&DeadlineScope::root()).await;
    if let (Ok(quote), Some(path)) = (&report.outcome, &args.append_to) {
        append_bid(path, quote)?;
        info!(path = %path.display(), bid = %quote.bid, "bid appended");
    }

    CommandResult::from_report(report)
}

fn append_bid(path: &Path, quote: &DollarQuote) -> Result<(), CliError> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "Dólar: {}", quote.bid)?;
    Ok(())
}
