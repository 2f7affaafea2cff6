use std::time::{Duration, Instant};

use async_trait::async_trait;
use clickhouse::{error::Error as ClickhouseError, Client, RowOwned, RowRead};
use log::{debug, error, info, warn};

use crate::{
    config::WarehouseSettings,
    db::{
        models::{SummaryRow, TrendRow},
        Warehouse,
    },
    error::ReportError,
    query::{Dimension, Statement},
};

/// Read-only ClickHouse executor for report statements.
#[derive(Clone)]
pub struct ClickhouseWarehouse {
    pub client: Client,
}

impl ClickhouseWarehouse {
    /// Build the client and verify the connection, retrying with
    /// exponential backoff before giving up.
    pub async fn connect(settings: &WarehouseSettings) -> Result<Self, ReportError> {
        info!("Connecting to ClickHouse at {}", settings.url);

        let client = Client::default()
            .with_url(settings.url.clone())
            .with_user(settings.user.clone())
            .with_password(settings.password.clone())
            .with_database(settings.database.clone())
            .with_validation(false);

        let warehouse = Self { client };

        let max_retries = settings.connect_retries.max(1);
        let mut retries = 0;

        loop {
            match warehouse.health_check().await {
                Ok(()) => {
                    info!("Successfully connected to ClickHouse");
                    return Ok(warehouse);
                },
                Err(e) => {
                    retries += 1;

                    if retries >= max_retries {
                        return Err(ReportError::Connectivity(format!(
                            "failed to connect to ClickHouse after {} attempts: {}",
                            max_retries, e
                        )));
                    }

                    let delay = Duration::from_millis(100 * 2_u64.pow(retries));
                    warn!(
                        "Failed to connect to ClickHouse (attempt {}/{}), retrying in {:?}... Error: {}",
                        retries, max_retries, delay, e
                    );
                    tokio::time::sleep(delay).await;
                },
            }
        }
    }

    async fn execute<R>(&self, dimension: Dimension, sql: &str) -> Result<Vec<R>, ReportError>
    where
        R: RowOwned + RowRead,
    {
        let start = Instant::now();
        let result = self.client.query(sql).fetch_all::<R>().await;
        let elapsed = start.elapsed();

        match result {
            Ok(rows) => {
                debug!(
                    "[{}] Statement returned {} rows in {:?}",
                    dimension,
                    rows.len(),
                    elapsed
                );
                Ok(rows)
            },
            Err(e) => {
                error!("[{}] Statement failed after {:?}: {}", dimension, elapsed, e);
                Err(classify(dimension, e))
            },
        }
    }
}

/// Network-level failures are connectivity problems; everything else is
/// attributed to the statement.
fn classify(dimension: Dimension, e: ClickhouseError) -> ReportError {
    match e {
        ClickhouseError::Network(_) | ClickhouseError::TimedOut => {
            ReportError::Connectivity(e.to_string())
        },
        other => ReportError::Query {
            dimension,
            message: other.to_string(),
        },
    }
}

#[async_trait]
impl Warehouse for ClickhouseWarehouse {
    async fn fetch_summary(&self, statement: &Statement) -> Result<Vec<SummaryRow>, ReportError> {
        self.execute::<SummaryRow>(statement.key.dimension, &statement.sql)
            .await
    }

    async fn fetch_trend(&self, statement: &Statement) -> Result<Vec<TrendRow>, ReportError> {
        self.execute::<TrendRow>(statement.key.dimension, &statement.sql)
            .await
    }

    async fn health_check(&self) -> Result<(), ReportError> {
        self.client
            .query("SELECT 1")
            .fetch_one::<u8>()
            .await
            .map(|_| ())
            .map_err(|e| ReportError::Connectivity(format!("ClickHouse health check failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeouts_are_connectivity_failures() {
        let err = classify(Dimension::Path, ClickhouseError::TimedOut);
        assert!(matches!(err, ReportError::Connectivity(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_other_client_errors_stay_with_the_section() {
        let err = classify(Dimension::Path, ClickhouseError::RowNotFound);
        assert!(matches!(
            err,
            ReportError::Query {
                dimension: Dimension::Path,
                ..
            }
        ));
        assert!(!err.is_fatal());
    }
}
