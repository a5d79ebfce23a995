//! # Hedge Warehouse
//!
//! DuckDB-backed storage for exchange-rate snapshots fetched by `hedge`.
//!
//! The warehouse is deliberately synchronous: async callers move writes onto
//! a blocking thread and pass an `abandoned` check so a write whose deadline
//! has already passed is rolled back instead of committed.
//!
//! ```rust,no_run
//! use hedge_warehouse::{DollarQuoteRecord, Warehouse};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warehouse = Warehouse::open_default()?;
//!     let stored = warehouse.recent_dollar_quotes(5)?;
//!     println!("{} recent quotes", stored.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod migrations;
pub mod models;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use ::duckdb::{params, Connection};

pub use error::WarehouseError;
pub use models::{DollarQuoteRecord, StoredDollarQuote};

#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    pub hedge_home: PathBuf,
    pub db_path: PathBuf,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self::under(resolve_hedge_home())
    }
}

impl WarehouseConfig {
    /// Places the database file at `<hedge_home>/warehouse.duckdb`.
    pub fn under(hedge_home: impl Into<PathBuf>) -> Self {
        let hedge_home = hedge_home.into();
        let db_path = hedge_home.join("warehouse.duckdb");
        Self {
            hedge_home,
            db_path,
        }
    }
}

#[derive(Clone)]
pub struct Warehouse {
    db_path: Option<PathBuf>,
    connection: Arc<Mutex<Connection>>,
}

impl Warehouse {
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let connection = Connection::open(config.db_path.as_path())?;
        Self::initialize(connection, Some(config.db_path))
    }

    pub fn open_in_memory() -> Result<Self, WarehouseError> {
        Self::initialize(Connection::open_in_memory()?, None)
    }

    fn initialize(connection: Connection, db_path: Option<PathBuf>) -> Result<Self, WarehouseError> {
        migrations::apply_migrations(&connection)?;
        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Path of the backing file, `None` for an in-memory warehouse.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn insert_dollar_quote(&self, record: &DollarQuoteRecord) -> Result<(), WarehouseError> {
        self.insert_dollar_quote_unless(record, || false)
    }

    /// Inserts `record` in a transaction that is rolled back when `abandoned`
    /// reports true right before commit.
    pub fn insert_dollar_quote_unless<F>(
        &self,
        record: &DollarQuoteRecord,
        abandoned: F,
    ) -> Result<(), WarehouseError>
    where
        F: Fn() -> bool,
    {
        if abandoned() {
            return Err(WarehouseError::Abandoned(String::from(
                "deadline passed before the write started",
            )));
        }

        let mut connection = self.lock()?;
        let transaction = connection.transaction()?;
        transaction.execute(
            r#"
INSERT INTO dollar_quote (
    code, codein, name, high, low, var_bid, pct_change, bid, ask,
    upstream_timestamp, create_date, source
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#,
            params![
                record.code,
                record.codein,
                record.name,
                record.high,
                record.low,
                record.var_bid,
                record.pct_change,
                record.bid,
                record.ask,
                record.upstream_timestamp,
                record.create_date,
                record.source,
            ],
        )?;

        if abandoned() {
            transaction.rollback()?;
            return Err(WarehouseError::Abandoned(String::from(
                "deadline passed before commit",
            )));
        }

        transaction.commit()?;
        Ok(())
    }

    /// Most recent snapshots first.
    pub fn recent_dollar_quotes(&self, limit: usize) -> Result<Vec<StoredDollarQuote>, WarehouseError> {
        let connection = self.lock()?;
        let sql = format!(
            r#"
SELECT code, codein, name, high, low, var_bid, pct_change, bid, ask,
       upstream_timestamp, create_date, source, CAST(stored_at AS VARCHAR)
FROM dollar_quote
ORDER BY stored_at DESC
LIMIT {limit}
"#,
            limit = limit.max(1),
        );

        let mut statement = connection.prepare(sql.as_str())?;
        let rows = statement.query_map([], |row| {
            Ok(StoredDollarQuote {
                record: DollarQuoteRecord {
                    code: row.get(0)?,
                    codein: row.get(1)?,
                    name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    high: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    low: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                    var_bid: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                    pct_change: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                    bid: row.get(7)?,
                    ask: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
                    upstream_timestamp: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
                    create_date: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
                    source: row.get(11)?,
                },
                stored_at: row.get(12)?,
            })
        })?;

        let mut stored = Vec::new();
        for row in rows {
            stored.push(row?);
        }
        Ok(stored)
    }

    pub fn count_dollar_quotes(&self) -> Result<u64, WarehouseError> {
        let connection = self.lock()?;
        let count: i64 =
            connection.query_row("SELECT COUNT(*) FROM dollar_quote", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    pub fn applied_migrations(&self) -> Result<Vec<String>, WarehouseError> {
        let connection = self.lock()?;
        Ok(migrations::applied_versions(&connection)?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, WarehouseError> {
        self.connection.lock().map_err(|_| WarehouseError::Poisoned)
    }
}

fn resolve_hedge_home() -> PathBuf {
    if let Some(path) = env::var_os("HEDGE_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".hedge");
    }

    PathBuf::from(".hedge")
}
