//! In-process warehouse evaluating statements over a fixed event set.
//!
//! Mirrors the aggregation semantics of the ClickHouse statements (distinct
//! counts, null-skipping sums and averages, rounding, ordering) so the rest
//! of the pipeline can run without a database. Used by `--demo` runs and by
//! tests, which also rely on its call counters.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate};
use log::debug;
use rustc_hash::FxHashSet;

use crate::{
    error::ReportError,
    params::Granularity,
    query::{Dimension, QueryKey, QueryKind, Statement},
};

use super::{
    models::{Event, ServiceKind, SummaryRow, TrendRow},
    Warehouse,
};

pub struct MemoryWarehouse {
    events: Vec<Event>,
    summary_calls: AtomicUsize,
    trend_calls: AtomicUsize,
    fail_next: Mutex<Option<ReportError>>,
}

impl MemoryWarehouse {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            summary_calls: AtomicUsize::new(0),
            trend_calls: AtomicUsize::new(0),
            fail_next: Mutex::new(None),
        }
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    pub fn trend_calls(&self) -> usize {
        self.trend_calls.load(Ordering::SeqCst)
    }

    /// Make the next statement (of either kind) fail with `error`.
    pub fn fail_next(&self, error: ReportError) {
        if let Ok(mut slot) = self.fail_next.lock() {
            *slot = Some(error);
        }
    }

    fn take_failure(&self) -> Option<ReportError> {
        self.fail_next.lock().ok().and_then(|mut slot| slot.take())
    }

    fn in_range<'a>(
        &'a self,
        key: &'a QueryKey,
    ) -> impl Iterator<Item = (&'a Event, String)> + 'a {
        self.events
            .iter()
            .filter(move |event| event.date() >= key.start_date && event.date() <= key.end_date)
            .filter_map(move |event| {
                event
                    .dimension_value(key.dimension)
                    .map(|value| (event, value))
            })
    }

    fn summarize(&self, key: &QueryKey) -> Vec<SummaryRow> {
        let mut groups: BTreeMap<String, Group> = BTreeMap::new();
        for (event, value) in self.in_range(key) {
            groups.entry(value).or_default().add(event, key.dimension);
        }

        // BTreeMap iteration gives the ascending tie-break; the sort is stable
        let mut rows: Vec<SummaryRow> = groups
            .into_iter()
            .map(|(value, group)| group.into_row(value, key.dimension))
            .collect();
        rows.sort_by(|a, b| b.transfers.cmp(&a.transfers));
        rows
    }

    fn bucket(&self, key: &QueryKey, granularity: Granularity) -> Vec<TrendRow> {
        let mut buckets: BTreeMap<(NaiveDate, String), (FxHashSet<String>, Vec<f64>)> =
            BTreeMap::new();
        for (event, value) in self.in_range(key) {
            let entry = buckets
                .entry((period_start(event.date(), granularity), value))
                .or_default();
            entry.0.insert(event.event_key());
            entry.1.extend(event.amount_usd);
        }

        let mut rows: Vec<TrendRow> = buckets
            .into_iter()
            .map(|((period, dimension_value), (keys, amounts))| TrendRow {
                period,
                dimension_value,
                transfers: keys.len() as u64,
                volume_usd: sum(&amounts).map(|v| round_to(v, 1)),
            })
            .collect();
        rows.sort_by(|a, b| {
            a.period
                .cmp(&b.period)
                .then_with(|| b.transfers.cmp(&a.transfers))
        });
        rows
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn fetch_summary(&self, statement: &Statement) -> Result<Vec<SummaryRow>, ReportError> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        if statement.key.kind != QueryKind::Summary {
            return Err(ReportError::Query {
                dimension: statement.key.dimension,
                message: "not a summary statement".to_string(),
            });
        }
        let rows = self.summarize(&statement.key);
        debug!(
            "[MEMORY] {} summary produced {} rows",
            statement.key.dimension,
            rows.len()
        );
        Ok(rows)
    }

    async fn fetch_trend(&self, statement: &Statement) -> Result<Vec<TrendRow>, ReportError> {
        self.trend_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        match statement.key.kind {
            QueryKind::Trend(granularity) => Ok(self.bucket(&statement.key, granularity)),
            QueryKind::Summary => Err(ReportError::Query {
                dimension: statement.key.dimension,
                message: "not a trend statement".to_string(),
            }),
        }
    }

    async fn health_check(&self) -> Result<(), ReportError> {
        Ok(())
    }
}

#[derive(Default)]
struct Group {
    keys: FxHashSet<String>,
    senders: FxHashSet<String>,
    amounts: Vec<f64>,
    fees: Vec<f64>,
    chains: FxHashSet<String>,
    tokens: FxHashSet<String>,
}

impl Group {
    fn add(&mut self, event: &Event, dimension: Dimension) {
        self.keys.insert(event.event_key());
        if let Some(sender) = &event.sender {
            self.senders.insert(sender.clone());
        }
        self.amounts.extend(event.amount_usd);
        self.fees.extend(event.fee_usd);
        if let Some(symbol) = event.token_symbol() {
            self.tokens.insert(symbol.into_owned());
        }

        let counterparts = match dimension {
            Dimension::SourceChain => vec![&event.destination_chain],
            Dimension::DestinationChain => vec![&event.source_chain],
            Dimension::Token => vec![&event.source_chain, &event.destination_chain],
            Dimension::Path => vec![],
        };
        for chain in counterparts.into_iter().flatten() {
            self.chains.insert(chain.clone());
        }
    }

    fn into_row(self, dimension_value: String, dimension: Dimension) -> SummaryRow {
        let transfers = self.keys.len() as u64;
        let users = self.senders.len() as u64;
        let secondary = match dimension {
            Dimension::Path if users == 0 => None,
            Dimension::Path => Some(round_to(transfers as f64 / users as f64, 2)),
            _ => Some(self.chains.len() as f64),
        };

        SummaryRow {
            dimension_value,
            transfers,
            users,
            volume_usd: sum(&self.amounts).map(|v| round_to(v, 1)),
            avg_volume_usd: average(&self.amounts).map(|v| round_to(v, 1)),
            fees_usd: sum(&self.fees).map(|v| round_to(v, 1)),
            avg_fee_usd: average(&self.fees).map(|v| round_to(v, 5)),
            secondary,
            tokens: self.tokens.len() as u64,
        }
    }
}

/// Deterministic sample activity for demo runs: `count` events spread over
/// 2025, cycling through a handful of routes, senders and assets.
pub fn sample_events(count: usize) -> Vec<Event> {
    const ROUTES: &[(&str, &str)] = &[
        ("ethereum", "osmosis"),
        ("osmosis", "ethereum"),
        ("ethereum", "polygon"),
        ("arbitrum", "base"),
        ("avalanche", "ethereum"),
        ("binance", "arbitrum"),
        ("polygon", "avalanche"),
    ];
    const ASSETS: &[&str] = &[
        "uusdc",
        "weth-wei",
        "uaxl",
        "wbtc-satoshi",
        "ibc/C4CFF46FD6DE35CA4CF4CE031E643C8FDC9BA4B99AE598E9B0ED98FE3A2319F9",
        "foobar-wei",
    ];

    let origin = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default();
    (0..count)
        .map(|i| {
            let (source, destination) = ROUTES[(i * 5 + i / 3) % ROUTES.len()];
            let service = if i % 4 == 0 {
                ServiceKind::Gmp
            } else {
                ServiceKind::TokenTransfer
            };
            let created_at = (origin + Duration::days(((i * 37) % 243) as i64))
                .and_hms_opt((i % 24) as u32, ((i * 7) % 60) as u32, 0)
                .unwrap_or_default();
            let amount = ((i * 7919) % 50_000) as f64 + 0.25;
            // every ninth event carries no priced amount
            let amount = if i % 9 == 0 { None } else { Some(amount) };

            Event::new(service, i.to_string(), created_at)
                .with_route(source, destination)
                .with_sender(&format!("0x{:040x}", i % 23))
                .with_amounts(amount, Some(((i * 31) % 400) as f64 / 100.0))
                .with_asset(ASSETS[i % ASSETS.len()])
        })
        .collect()
}

/// First day of the bucket containing `date`. Weeks start on Monday.
pub fn period_start(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Day => date,
        Granularity::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
        Granularity::Month => date.with_day(1).unwrap_or(date),
    }
}

/// SQL `sum`: NULL over an empty set.
fn sum(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum())
    }
}

fn average(values: &[f64]) -> Option<f64> {
    sum(values).map(|total| total / values.len() as f64)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
