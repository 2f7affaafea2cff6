use chrono::NaiveDate;
use clickhouse::Row;
use serde::{Deserialize, Serialize};

use crate::query::{Dimension, QueryKind};

/// Activity of one dimension value within one period bucket (ClickHouse).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Row)]
pub struct TrendRow {
    /// First day of the bucket
    #[serde(with = "clickhouse::serde::chrono::date")]
    pub period: NaiveDate,
    pub dimension_value: String,
    pub transfers: u64,
    pub volume_usd: Option<f64>,
}

/// Trend rows ordered by period, then transfers descending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendResult {
    pub dimension: Dimension,
    pub kind: QueryKind,
    pub rows: Vec<TrendRow>,
}
