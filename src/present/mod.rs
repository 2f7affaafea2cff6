//! Presentation of query results: formatted tables and headline metrics.
//!
//! Everything here reads results and produces view models; nothing mutates
//! the rows it is given. The view models serialize to JSON for an external
//! UI layer, and [`text`] renders them for terminals.

pub mod format;
pub mod text;

use serde::Serialize;

use crate::{
    db::{QueryResult, SummaryRow, TrendResult},
    error::ReportError,
    query::{Dimension, DimensionSpec, SecondaryKind},
};

use format::{cell, group_int, scaled, MetricCategory};

#[derive(Debug, Clone, Copy)]
pub struct PresentOptions {
    /// Maximum number of rows in a section table
    pub table_rows: usize,
}

impl Default for PresentOptions {
    fn default() -> Self {
        Self { table_rows: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    /// 1-based display position
    pub index: usize,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    pub caption: String,
    /// `None` when no row has a value for the column
    pub value: Option<String>,
}

/// Everything needed to draw one page section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub dimension: Dimension,
    pub title: String,
    /// Rows in the full result, before truncation to the table size
    pub total_rows: usize,
    pub table: Option<TableView>,
    pub headlines: Vec<Headline>,
    pub trend: Option<TableView>,
    pub error: Option<String>,
}

impl SectionView {
    /// Section replaced by an error message; other sections are unaffected.
    pub fn failed(dimension: Dimension, error: &ReportError) -> Self {
        Self {
            dimension,
            title: dimension.spec().title.to_string(),
            total_rows: 0,
            table: None,
            headlines: Vec::new(),
            trend: None,
            error: Some(error.to_string()),
        }
    }
}

/// Summary columns that get a headline metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Transfers,
    Users,
    Volume,
    Fees,
    Secondary,
    Tokens,
}

impl Metric {
    pub const HEADLINES: [Metric; 6] = [
        Metric::Transfers,
        Metric::Users,
        Metric::Volume,
        Metric::Fees,
        Metric::Secondary,
        Metric::Tokens,
    ];

    pub fn value(&self, row: &SummaryRow) -> Option<f64> {
        match self {
            Metric::Transfers => Some(row.transfers as f64),
            Metric::Users => Some(row.users as f64),
            Metric::Volume => row.volume_usd,
            Metric::Fees => row.fees_usd,
            Metric::Secondary => row.secondary,
            Metric::Tokens => Some(row.tokens as f64),
        }
    }

    pub fn category(&self, spec: &DimensionSpec) -> MetricCategory {
        match self {
            Metric::Transfers | Metric::Users => MetricCategory::Count,
            Metric::Volume | Metric::Fees => MetricCategory::Currency,
            Metric::Tokens => MetricCategory::Cardinality,
            Metric::Secondary => match spec.secondary_kind {
                SecondaryKind::Cardinality => MetricCategory::Cardinality,
                SecondaryKind::Ratio => MetricCategory::Ratio,
            },
        }
    }

    pub fn caption(&self, spec: &DimensionSpec) -> String {
        let by = match self {
            Metric::Transfers => "Transfers Count",
            Metric::Users => "Users Count",
            Metric::Volume => "Transfers Volume (USD)",
            Metric::Fees => "Transfer Fees (USD)",
            Metric::Secondary => spec.secondary_caption,
            Metric::Tokens => "Number of Tokens Transferred",
        };
        format!("Top {} by {}", spec.noun, by)
    }
}

/// First row holding the largest value of `metric`. Rows without a value
/// are skipped; `None` when no row has one.
pub fn top_row(rows: &[SummaryRow], metric: Metric) -> Option<&SummaryRow> {
    let mut best: Option<(&SummaryRow, f64)> = None;
    for row in rows {
        let value = match metric.value(row) {
            Some(v) if !v.is_nan() => v,
            _ => continue,
        };
        match best {
            Some((_, current)) if value <= current => {},
            _ => best = Some((row, value)),
        }
    }
    best.map(|(row, _)| row)
}

pub fn headlines(result: &QueryResult) -> Vec<Headline> {
    let spec = result.dimension.spec();
    Metric::HEADLINES
        .iter()
        .map(|metric| Headline {
            caption: metric.caption(spec),
            value: top_row(&result.rows, *metric).and_then(|row| {
                metric.value(row).map(|v| {
                    format!("{} ({})", row.dimension_value, scaled(v, metric.category(spec)))
                })
            }),
        })
        .collect()
}

pub fn table(result: &QueryResult, options: &PresentOptions) -> TableView {
    let spec = result.dimension.spec();
    let headers = [
        spec.label,
        "🚀Transfers",
        "👥Users",
        "💸Volume($)",
        "📊Avg Volume($)",
        "⛽Fees($)",
        "💨Avg Fee($)",
        spec.secondary_label,
        "💎#Tokens",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();

    let rows = result
        .rows
        .iter()
        .take(options.table_rows)
        .enumerate()
        .map(|(i, row)| TableRow {
            index: i + 1,
            cells: vec![
                row.dimension_value.clone(),
                group_int(row.transfers),
                group_int(row.users),
                cell(row.volume_usd, 0),
                cell(row.avg_volume_usd, 0),
                cell(row.fees_usd, 0),
                cell(row.avg_fee_usd, 3),
                cell(row.secondary, 0),
                group_int(row.tokens),
            ],
        })
        .collect();

    TableView { headers, rows }
}

/// Table and headline metrics for one summary result.
pub fn render(result: &QueryResult, options: &PresentOptions) -> SectionView {
    SectionView {
        dimension: result.dimension,
        title: result.dimension.spec().title.to_string(),
        total_rows: result.len(),
        table: Some(table(result, options)),
        headlines: headlines(result),
        trend: None,
        error: None,
    }
}

/// Per-period breakdown table. Not truncated.
pub fn render_trend(result: &TrendResult) -> TableView {
    let spec = result.dimension.spec();
    let headers = vec![
        "📅Period".to_string(),
        spec.label.to_string(),
        "🚀Transfers".to_string(),
        "💸Volume($)".to_string(),
    ];

    let rows = result
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| TableRow {
            index: i + 1,
            cells: vec![
                row.period.format("%Y-%m-%d").to_string(),
                row.dimension_value.clone(),
                group_int(row.transfers),
                cell(row.volume_usd, 0),
            ],
        })
        .collect();

    TableView { headers, rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: &str, transfers: u64, volume: Option<f64>) -> SummaryRow {
        SummaryRow {
            dimension_value: value.to_string(),
            transfers,
            users: transfers / 2,
            volume_usd: volume,
            avg_volume_usd: volume.map(|v| v / transfers as f64),
            fees_usd: Some(12.5),
            avg_fee_usd: Some(0.01234),
            secondary: Some(7.0),
            tokens: 3,
        }
    }

    #[test]
    fn test_null_volume_renders_placeholder() {
        let result = QueryResult::new(Dimension::SourceChain, vec![row("ethereum", 10, None)]);
        let view = table(&result, &PresentOptions::default());

        assert_eq!(view.rows[0].cells[3], "-");
        assert_eq!(view.rows[0].cells[4], "-");
        assert_eq!(view.rows[0].cells[6], "0.012");
    }

    #[test]
    fn test_rows_are_indexed_from_one_and_truncated() {
        let rows = (0..15)
            .map(|i| row(&format!("chain-{}", i), 100 - i, Some(1_000.0)))
            .collect();
        let result = QueryResult::new(Dimension::DestinationChain, rows);
        let view = render(&result, &PresentOptions::default());

        let table = view.table.unwrap();
        assert_eq!(table.rows.len(), 10);
        assert_eq!(table.rows[0].index, 1);
        assert_eq!(table.rows[9].index, 10);
        assert_eq!(view.total_rows, 15);
        assert_eq!(table.headers[0], "📥Destination Chain");
        assert_eq!(table.headers[7], "📤#Source Chains");
    }

    #[test]
    fn test_top_row_keeps_first_of_ties_and_skips_nulls() {
        let rows = vec![
            row("ethereum", 5, None),
            row("polygon", 5, Some(20.0)),
            row("avalanche", 3, Some(20.0)),
        ];
        assert_eq!(top_row(&rows, Metric::Transfers).unwrap().dimension_value, "ethereum");
        assert_eq!(top_row(&rows, Metric::Volume).unwrap().dimension_value, "polygon");
        assert!(top_row(&[], Metric::Transfers).is_none());
    }

    #[test]
    fn test_headline_scaling_per_category() {
        let mut top = row("ethereum", 4_321, Some(2_345_678.0));
        top.tokens = 7;
        let result = QueryResult::new(Dimension::SourceChain, vec![top, row("polygon", 10, Some(5.0))]);
        let headlines = headlines(&result);

        assert_eq!(headlines[0].caption, "Top Source Chain by Transfers Count");
        assert_eq!(headlines[0].value.as_deref(), Some("ethereum (4.3k)"));
        assert_eq!(headlines[2].value.as_deref(), Some("ethereum ($2.35m)"));
        assert_eq!(headlines[4].caption, "Top Source Chain by Number of Destination Chains");
        assert_eq!(headlines[5].value.as_deref(), Some("ethereum (7)"));
    }

    #[test]
    fn test_path_secondary_is_a_ratio() {
        let mut r = row("ethereum→polygon", 9, Some(1.0));
        r.secondary = Some(1.5);
        let result = QueryResult::new(Dimension::Path, vec![r]);
        let headlines = headlines(&result);
        assert_eq!(headlines[4].caption, "Top Path by Transfers per User");
        assert_eq!(headlines[4].value.as_deref(), Some("ethereum→polygon (1.50)"));
    }

    #[test]
    fn test_empty_result_blanks_headlines() {
        let result = QueryResult::new(Dimension::Token, vec![]);
        let view = render(&result, &PresentOptions::default());

        assert!(view.table.unwrap().rows.is_empty());
        assert_eq!(view.headlines.len(), 6);
        assert!(view.headlines.iter().all(|h| h.value.is_none()));
    }

    #[test]
    fn test_render_does_not_modify_input() {
        let result = QueryResult::new(Dimension::Token, vec![row("USDC", 3, Some(1.0))]);
        let before = result.clone();
        render(&result, &PresentOptions { table_rows: 1 });
        assert_eq!(result, before);
    }
}
