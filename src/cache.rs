//! Memoized statement execution.
//!
//! Results are keyed by [`QueryKey`] and kept for the lifetime of the
//! [`ReportCache`] value: no eviction, no expiry. Entries are never
//! revalidated against the warehouse, so a long-lived cache can serve stale
//! rows until [`ReportCache::invalidate_all`] is called. Failed loads are not
//! stored.

use std::sync::Arc;

use log::info;
use moka::future::Cache;
use tokio::sync::Mutex;

use crate::{
    db::{QueryResult, TrendResult, Warehouse},
    error::ReportError,
    params::ReportParams,
    query::{Dimension, QueryBuilder, QueryKey},
};

pub struct ReportCache {
    warehouse: Arc<dyn Warehouse>,
    builder: QueryBuilder,
    summaries: Cache<QueryKey, Arc<QueryResult>>,
    trends: Cache<QueryKey, Arc<TrendResult>>,
    /// One statement on the connection at a time
    gate: Mutex<()>,
}

impl ReportCache {
    pub fn new(warehouse: Arc<dyn Warehouse>, builder: QueryBuilder) -> Self {
        Self {
            warehouse,
            builder,
            summaries: Cache::builder().build(),
            trends: Cache::builder().build(),
            gate: Mutex::new(()),
        }
    }

    /// Summary rows for `dimension` over the range in `params`.
    ///
    /// Concurrent calls for the same key share a single execution.
    pub async fn get(
        &self,
        dimension: Dimension,
        params: &ReportParams,
    ) -> Result<Arc<QueryResult>, ReportError> {
        params.validate()?;
        let key = QueryKey::summary(dimension, params);
        self.summaries
            .try_get_with(key, self.load_summary(key))
            .await
            .map_err(|e| (*e).clone())
    }

    /// Per-period rows for `dimension`, bucketed by the granularity in `params`.
    pub async fn trend(
        &self,
        dimension: Dimension,
        params: &ReportParams,
    ) -> Result<Arc<TrendResult>, ReportError> {
        params.validate()?;
        let key = QueryKey::trend(dimension, params);
        self.trends
            .try_get_with(key, self.load_trend(key))
            .await
            .map_err(|e| (*e).clone())
    }

    /// Whether a summary for this key is currently cached.
    pub fn contains(&self, dimension: Dimension, params: &ReportParams) -> bool {
        self.summaries
            .contains_key(&QueryKey::summary(dimension, params))
    }

    /// Drop every cached result.
    pub fn invalidate_all(&self) {
        self.summaries.invalidate_all();
        self.trends.invalidate_all();
    }

    async fn load_summary(&self, key: QueryKey) -> Result<Arc<QueryResult>, ReportError> {
        let statement = self.builder.statement(&key);

        let _connection = self.gate.lock().await;
        info!(
            "[{}] Loading summary for {}..{}",
            key.dimension, key.start_date, key.end_date
        );
        let rows = self.warehouse.fetch_summary(&statement).await?;

        Ok(Arc::new(QueryResult::new(key.dimension, rows)))
    }

    async fn load_trend(&self, key: QueryKey) -> Result<Arc<TrendResult>, ReportError> {
        let statement = self.builder.statement(&key);

        let _connection = self.gate.lock().await;
        info!(
            "[{}] Loading trend for {}..{}",
            key.dimension, key.start_date, key.end_date
        );
        let rows = self.warehouse.fetch_trend(&statement).await?;

        Ok(Arc::new(TrendResult {
            dimension: key.dimension,
            kind: key.kind,
            rows,
        }))
    }
}
