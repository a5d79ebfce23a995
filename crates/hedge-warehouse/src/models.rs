use serde::Serialize;

/// One persisted exchange-rate snapshot.
///
/// Upstream numeric fields are stored verbatim as text so the stored row is
/// byte-for-byte what the quote provider returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DollarQuoteRecord {
    pub code: String,
    pub codein: String,
    pub name: String,
    pub high: String,
    pub low: String,
    pub var_bid: String,
    pub pct_change: String,
    pub bid: String,
    pub ask: String,
    pub upstream_timestamp: String,
    pub create_date: String,
    pub source: String,
}

/// A record read back from the warehouse, with its storage time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredDollarQuote {
    #[serde(flatten)]
    pub record: DollarQuoteRecord,
    pub stored_at: String,
}
