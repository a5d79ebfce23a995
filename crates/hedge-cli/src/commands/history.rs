use hedge_core::StoredDollarQuote;
use hedge_warehouse::Warehouse;
use serde::Serialize;

use crate::cli::HistoryArgs;
use crate::config::AppConfig;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct HistoryResponseData {
    db_path: Option<String>,
    quotes: Vec<StoredDollarQuote>,
}

pub fn run(args: &HistoryArgs, config: &AppConfig) -> Result<CommandResult, CliError> {
    let warehouse = Warehouse::open(config.warehouse_config())?;
    let data = history_data(&warehouse, args.limit)?;
    Ok(CommandResult::ok(serde_json::to_value(data)?))
}

fn history_data(warehouse: &Warehouse, limit: usize) -> Result<HistoryResponseData, CliError> {
    Ok(HistoryResponseData {
        db_path: warehouse
            .db_path()
            .map(|path| path.to_string_lossy().into_owned()),
        quotes: warehouse.recent_dollar_quotes(limit)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hedge_warehouse::{DollarQuoteRecord, WarehouseConfig};
    use tempfile::tempdir;

    fn record(bid: &str) -> DollarQuoteRecord {
        DollarQuoteRecord {
            code: String::from("USD"),
            codein: String::from("BRL"),
            name: String::from("Dólar Americano/Real Brasileiro"),
            high: String::from("5.0712"),
            low: String::from("5.0123"),
            var_bid: String::from("0.0121"),
            pct_change: String::from("0.24"),
            bid: bid.to_owned(),
            ask: String::from("5.0519"),
            upstream_timestamp: String::from("1718822398"),
            create_date: String::from("2024-06-19 15:39:58"),
            source: String::from("awesomeapi"),
        }
    }

    #[test]
    fn history_respects_the_limit() {
        let temp = tempdir().expect("tempdir");
        let warehouse = Warehouse::open(WarehouseConfig::under(temp.path())).expect("open");
        for bid in ["5.01", "5.02", "5.03"] {
            warehouse.insert_dollar_quote(&record(bid)).expect("insert");
        }

        let data = history_data(&warehouse, 2).expect("history");

        assert_eq!(data.quotes.len(), 2);
        assert!(data
            .db_path
            .as_deref()
            .is_some_and(|path| path.ends_with("warehouse.duckdb")));
    }

    #[test]
    fn an_empty_warehouse_has_no_history() {
        let warehouse = Warehouse::open_in_memory().expect("open");

        let data = history_data(&warehouse, 10).expect("history");

        assert!(data.quotes.is_empty());
        assert_eq!(data.db_path, None);
    }
}
