use async_trait::async_trait;

use crate::{error::ReportError, query::Statement};

pub mod clickhouse;
pub mod memory;
pub mod models;

pub use self::clickhouse::ClickhouseWarehouse;
pub use memory::MemoryWarehouse;
pub use models::{Event, QueryResult, ServiceKind, SummaryRow, TrendResult, TrendRow};

/// Read-only access to the transfer warehouse.
///
/// Implementations run one statement at a time and materialize every
/// returned row. Ordering of the rows is whatever the statement asks for.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Run a summary statement built by [`QueryBuilder`](crate::query::QueryBuilder).
    async fn fetch_summary(&self, statement: &Statement) -> Result<Vec<SummaryRow>, ReportError>;

    /// Run a trend statement built by [`QueryBuilder`](crate::query::QueryBuilder).
    async fn fetch_trend(&self, statement: &Statement) -> Result<Vec<TrendRow>, ReportError>;

    /// Verify the warehouse is reachable.
    async fn health_check(&self) -> Result<(), ReportError>;
}
