//! Aggregate statement construction.
//!
//! One template serves every grouping dimension; the per-dimension pieces
//! come from [`DimensionSpec`]. Building is pure: identical inputs always
//! produce byte-identical SQL.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    error::ReportError,
    params::{Granularity, ReportParams},
};

use super::{dimension::Dimension, sql_literal, symbols::symbol_expression};

pub const DEFAULT_TRANSFERS_TABLE: &str = "axelscan.fact_transfers";
pub const DEFAULT_GMP_TABLE: &str = "axelscan.fact_gmp";

/// Which statement shape a cache entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// One row per dimension value over the whole range
    Summary,
    /// One row per (period, dimension value)
    Trend(Granularity),
}

/// Identity of a statement. Granularity only participates for trends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct QueryKey {
    pub kind: QueryKind,
    pub dimension: Dimension,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl QueryKey {
    pub fn summary(dimension: Dimension, params: &ReportParams) -> Self {
        Self {
            kind: QueryKind::Summary,
            dimension,
            start_date: params.start_date,
            end_date: params.end_date,
        }
    }

    pub fn trend(dimension: Dimension, params: &ReportParams) -> Self {
        Self {
            kind: QueryKind::Trend(params.granularity),
            dimension,
            start_date: params.start_date,
            end_date: params.end_date,
        }
    }
}

/// A ready-to-run statement and the key it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub key: QueryKey,
    pub sql: String,
}

/// Builds statements over the canonical event view.
///
/// The view unions the token-transfer and GMP tables into
/// `(created_at, event_key, sender, source_chain, destination_chain,
/// amount_usd, fee_usd, raw_asset, token_symbol)`.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    event_view: String,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self {
            event_view: event_view(DEFAULT_TRANSFERS_TABLE, DEFAULT_GMP_TABLE),
        }
    }
}

impl QueryBuilder {
    pub fn new(transfers_table: &str, gmp_table: &str) -> Result<Self, ReportError> {
        validate_identifier(transfers_table)?;
        validate_identifier(gmp_table)?;
        Ok(Self {
            event_view: event_view(transfers_table, gmp_table),
        })
    }

    /// Build the statement answering `key`.
    pub fn statement(&self, key: &QueryKey) -> Statement {
        let sql = match key.kind {
            QueryKind::Summary => self.summary_sql(key),
            QueryKind::Trend(granularity) => self.trend_sql(key, granularity),
        };
        Statement { key: *key, sql }
    }

    pub fn summary(&self, dimension: Dimension, params: &ReportParams) -> Statement {
        self.statement(&QueryKey::summary(dimension, params))
    }

    pub fn trend(&self, dimension: Dimension, params: &ReportParams) -> Statement {
        self.statement(&QueryKey::trend(dimension, params))
    }

    fn summary_sql(&self, key: &QueryKey) -> String {
        let spec = key.dimension.spec();
        format!(
            "SELECT
    {group} AS dimension_value,
    uniqExact(event_key) AS transfers,
    uniqExact(sender) AS users,
    round(sum(amount_usd), 1) AS volume_usd,
    round(avg(amount_usd), 1) AS avg_volume_usd,
    round(sum(fee_usd), 1) AS fees_usd,
    round(avg(fee_usd), 5) AS avg_fee_usd,
    {secondary} AS secondary,
    uniqExact(token_symbol) AS tokens
FROM (
{view}
)
WHERE {range}
  AND {guard}
GROUP BY dimension_value
ORDER BY transfers DESC, dimension_value ASC",
            group = spec.group_expr,
            secondary = spec.secondary_expr,
            view = self.event_view,
            range = range_filter(key),
            guard = spec.null_guard,
        )
    }

    fn trend_sql(&self, key: &QueryKey, granularity: Granularity) -> String {
        let spec = key.dimension.spec();
        format!(
            "SELECT
    {bucket} AS period,
    {group} AS dimension_value,
    uniqExact(event_key) AS transfers,
    round(sum(amount_usd), 1) AS volume_usd
FROM (
{view}
)
WHERE {range}
  AND {guard}
GROUP BY period, dimension_value
ORDER BY period ASC, transfers DESC, dimension_value ASC",
            bucket = bucket_expr(granularity),
            group = spec.group_expr,
            view = self.event_view,
            range = range_filter(key),
            guard = spec.null_guard,
        )
    }
}

fn range_filter(key: &QueryKey) -> String {
    format!(
        "toDate(created_at) >= toDate({}) AND toDate(created_at) <= toDate({})",
        sql_literal(&key.start_date.format("%Y-%m-%d").to_string()),
        sql_literal(&key.end_date.format("%Y-%m-%d").to_string()),
    )
}

fn bucket_expr(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Day => "toDate(created_at)",
        Granularity::Week => "toMonday(created_at)",
        Granularity::Month => "toStartOfMonth(created_at)",
    }
}

/// Path of keys into the JSON `data` column, as SQL arguments.
fn json_path(path: &[&str]) -> String {
    path.iter()
        .map(|key| sql_literal(key))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Nullable(String) at `path`; missing or empty values are NULL.
fn json_string(path: &[&str]) -> String {
    format!("nullIf(JSONExtractString(data, {}), '')", json_path(path))
}

/// Lower-cased chain identifier at `path`.
fn json_chain(path: &[&str]) -> String {
    format!("nullIf(lower(JSONExtractString(data, {})), '')", json_path(path))
}

/// Nullable(Float64) at `path`.
///
/// Accepts JSON numbers and numeric strings. Arrays, objects, missing keys
/// and unparsable strings all yield NULL.
fn json_number(path: &[&str]) -> String {
    let path = json_path(path);
    format!(
        "coalesce(toFloat64OrNull(JSONExtractRaw(data, {path})), toFloat64OrNull(JSONExtractString(data, {path})))",
        path = path
    )
}

fn event_view(transfers_table: &str, gmp_table: &str) -> String {
    let transfers = format!(
        "    SELECT
        created_at,
        concat('token_transfer:', toString(id)) AS event_key,
        nullIf(toString(sender_address), '') AS sender,
        {source} AS source_chain,
        {destination} AS destination_chain,
        {amount} * {price} AS amount_usd,
        {fee} AS fee_usd,
        JSONExtractString(data, 'link', 'asset') AS raw_asset
    FROM {table}
    WHERE status = 'executed' AND simplified_status = 'received'",
        source = json_chain(&["send", "original_source_chain"]),
        destination = json_chain(&["send", "original_destination_chain"]),
        amount = json_number(&["send", "amount"]),
        price = json_number(&["link", "price"]),
        fee = json_number(&["send", "fee_value"]),
        table = transfers_table,
    );

    let gmp = format!(
        "    SELECT
        created_at,
        concat('gmp:', toString(id)) AS event_key,
        {sender} AS sender,
        {source} AS source_chain,
        {destination} AS destination_chain,
        {value} AS amount_usd,
        coalesce({gas_used} * {gas_price}, {express_fee}) AS fee_usd,
        JSONExtractString(data, 'symbol') AS raw_asset
    FROM {table}
    WHERE status = 'executed' AND simplified_status = 'received'",
        sender = json_string(&["call", "transaction", "from"]),
        source = json_chain(&["call", "chain"]),
        destination = json_chain(&["call", "returnValues", "destinationChain"]),
        value = json_number(&["value"]),
        gas_used = json_number(&["gas", "gas_used_amount"]),
        gas_price = json_number(&["gas_price_rate", "source_token", "token_price", "usd"]),
        express_fee = json_number(&["fees", "express_fee_usd"]),
        table = gmp_table,
    );

    format!(
        "SELECT *, {symbol} AS token_symbol
FROM (
{transfers}
    UNION ALL
{gmp}
)",
        symbol = symbol_expression("raw_asset"),
        transfers = transfers,
        gmp = gmp,
    )
}

/// Table names are interpolated verbatim, so only plain `db.table` style
/// identifiers are allowed.
fn validate_identifier(name: &str) -> Result<(), ReportError> {
    let valid = !name.is_empty()
        && name.split('.').count() <= 2
        && name.split('.').all(|part| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if valid {
        Ok(())
    } else {
        Err(ReportError::InvalidIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(granularity: Granularity) -> ReportParams {
        ReportParams::parse(granularity.as_str(), "2025-01-01", "2025-08-31").unwrap()
    }

    #[test]
    fn test_same_inputs_produce_identical_sql() {
        let builder = QueryBuilder::default();
        for dimension in Dimension::ALL {
            let a = builder.summary(dimension, &params(Granularity::Month));
            let b = QueryBuilder::default().summary(dimension, &params(Granularity::Month));
            assert_eq!(a.sql, b.sql);
        }
    }

    #[test]
    fn test_summary_ignores_granularity() {
        let builder = QueryBuilder::default();
        let day = builder.summary(Dimension::Token, &params(Granularity::Day));
        let month = builder.summary(Dimension::Token, &params(Granularity::Month));
        assert_eq!(day.sql, month.sql);
        assert_eq!(day.key, month.key);
    }

    #[test]
    fn test_range_is_inclusive_on_both_ends() {
        let sql = QueryBuilder::default()
            .summary(Dimension::SourceChain, &params(Granularity::Day))
            .sql;
        assert!(sql.contains("toDate(created_at) >= toDate('2025-01-01')"));
        assert!(sql.contains("toDate(created_at) <= toDate('2025-08-31')"));
    }

    #[test]
    fn test_each_dimension_groups_and_guards_its_own_columns() {
        let builder = QueryBuilder::default();
        let p = params(Granularity::Day);

        let path = builder.summary(Dimension::Path, &p).sql;
        assert!(path.contains("concat(assumeNotNull(source_chain), '→', assumeNotNull(destination_chain)) AS dimension_value"));
        assert!(path.contains("AND source_chain IS NOT NULL AND destination_chain IS NOT NULL"));

        let token = builder.summary(Dimension::Token, &p).sql;
        assert!(token.contains("assumeNotNull(token_symbol) AS dimension_value"));
        assert!(token.contains("AND token_symbol IS NOT NULL"));

        let destination = builder.summary(Dimension::DestinationChain, &p).sql;
        assert!(destination.contains("toNullable(toFloat64(uniqExact(source_chain))) AS secondary"));
    }

    #[test]
    fn test_summary_orders_by_transfers_descending() {
        let sql = QueryBuilder::default()
            .summary(Dimension::SourceChain, &params(Granularity::Day))
            .sql;
        assert!(sql.ends_with("ORDER BY transfers DESC, dimension_value ASC"));
        assert!(sql.contains("round(avg(fee_usd), 5) AS avg_fee_usd"));
    }

    #[test]
    fn test_event_keys_are_prefixed_by_service() {
        let sql = QueryBuilder::default()
            .summary(Dimension::SourceChain, &params(Granularity::Day))
            .sql;
        assert!(sql.contains("concat('token_transfer:', toString(id)) AS event_key"));
        assert!(sql.contains("concat('gmp:', toString(id)) AS event_key"));
    }

    #[test]
    fn test_trend_buckets_follow_granularity() {
        let builder = QueryBuilder::default();
        let week = builder.trend(Dimension::Path, &params(Granularity::Week));
        assert!(week.sql.starts_with("SELECT\n    toMonday(created_at) AS period"));
        assert_eq!(week.key.kind, QueryKind::Trend(Granularity::Week));

        let month = builder.trend(Dimension::Path, &params(Granularity::Month));
        assert!(month.sql.contains("toStartOfMonth(created_at) AS period"));
        assert_ne!(week.key, month.key);
    }

    #[test]
    fn test_table_names_are_validated() {
        assert!(QueryBuilder::new("axelscan.fact_transfers", "fact_gmp").is_ok());
        assert!(QueryBuilder::new("axelscan.fact_transfers; DROP TABLE x", "fact_gmp").is_err());
        assert!(QueryBuilder::new("a.b.c", "fact_gmp").is_err());
        assert!(QueryBuilder::new("", "fact_gmp").is_err());

        let sql = QueryBuilder::new("warehouse.transfers", "warehouse.gmp")
            .unwrap()
            .summary(Dimension::Token, &params(Granularity::Day))
            .sql;
        assert!(sql.contains("FROM warehouse.transfers"));
        assert!(sql.contains("FROM warehouse.gmp"));
    }
}
