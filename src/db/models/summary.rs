use clickhouse::Row;
use serde::{Deserialize, Serialize};

use crate::query::Dimension;

/// One aggregated row per distinct dimension value (ClickHouse).
///
/// Field order matches the SELECT list of the summary statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Row)]
pub struct SummaryRow {
    pub dimension_value: String,
    pub transfers: u64,
    pub users: u64,
    pub volume_usd: Option<f64>,
    pub avg_volume_usd: Option<f64>,
    pub fees_usd: Option<f64>,
    pub avg_fee_usd: Option<f64>,
    /// Dimension-specific: distinct counterpart chains, or transfers per user for paths
    pub secondary: Option<f64>,
    pub tokens: u64,
}

/// Materialized summary rows for one dimension, sorted by transfers descending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub dimension: Dimension,
    pub rows: Vec<SummaryRow>,
}

impl QueryResult {
    pub fn new(dimension: Dimension, rows: Vec<SummaryRow>) -> Self {
        Self { dimension, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether adjacent rows never increase in transfer count.
    pub fn is_sorted_by_transfers(&self) -> bool {
        self.rows
            .windows(2)
            .all(|pair| pair[0].transfers >= pair[1].transfers)
    }
}
