//! Section pipeline: parameters → statement → cached execution → presentation.

use std::sync::Arc;

use futures::future::join_all;
use log::{error, info};
use serde::Serialize;

use crate::{
    cache::ReportCache,
    error::ReportError,
    params::ReportParams,
    present::{self, PresentOptions, SectionView},
    query::Dimension,
};

/// A rendered page: one section per grouping dimension.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub params: ReportParams,
    pub sections: Vec<SectionView>,
}

#[derive(Clone)]
pub struct Pipeline {
    cache: Arc<ReportCache>,
    options: PresentOptions,
    with_trend: bool,
}

impl Pipeline {
    pub fn new(cache: Arc<ReportCache>, options: PresentOptions) -> Self {
        Self {
            cache,
            options,
            with_trend: false,
        }
    }

    /// Also load the per-period breakdown for each section.
    pub fn with_trend(mut self, enabled: bool) -> Self {
        self.with_trend = enabled;
        self
    }

    pub fn cache(&self) -> &Arc<ReportCache> {
        &self.cache
    }

    /// Load and render one section.
    pub async fn section(
        &self,
        dimension: Dimension,
        params: &ReportParams,
    ) -> Result<SectionView, ReportError> {
        let result = self.cache.get(dimension, params).await?;
        let mut view = present::render(&result, &self.options);

        if self.with_trend {
            let trend = self.cache.trend(dimension, params).await?;
            view.trend = Some(present::render_trend(&trend));
        }

        Ok(view)
    }

    /// Load every section concurrently.
    ///
    /// Validation and connectivity failures fail the whole page. Any other
    /// failure replaces only its own section with an error block.
    pub async fn page(&self, params: &ReportParams) -> Result<PageView, ReportError> {
        params.validate()?;

        let outcomes = join_all(
            Dimension::ALL
                .iter()
                .map(|dimension| self.section(*dimension, params)),
        )
        .await;

        let mut sections = Vec::with_capacity(outcomes.len());
        for (dimension, outcome) in Dimension::ALL.iter().zip(outcomes) {
            match outcome {
                Ok(view) => {
                    info!("[{}] Rendered {} rows", dimension, view.total_rows);
                    sections.push(view);
                },
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!("[{}] Section failed: {}", dimension, e);
                    sections.push(SectionView::failed(*dimension, &e));
                },
            }
        }

        Ok(PageView {
            params: *params,
            sections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{Event, MemoryWarehouse, ServiceKind},
        query::QueryBuilder,
    };
    use chrono::NaiveDate;

    fn at(day: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, day)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn scenario() -> Vec<Event> {
        vec![
            Event::new(ServiceKind::TokenTransfer, "1", at(1))
                .with_route("ethereum", "polygon")
                .with_sender("0x01")
                .with_amounts(Some(100.0), Some(1.0))
                .with_asset("uusdc"),
            Event::new(ServiceKind::TokenTransfer, "2", at(2))
                .with_route("ethereum", "avalanche")
                .with_sender("0x02")
                .with_amounts(Some(50.0), Some(0.5))
                .with_asset("weth-wei"),
            Event::new(ServiceKind::Gmp, "3", at(3))
                .with_route("polygon", "ethereum")
                .with_sender("0x03")
                .with_amounts(Some(200.0), Some(2.0))
                .with_asset("uusdc"),
        ]
    }

    fn setup(events: Vec<Event>) -> (Arc<MemoryWarehouse>, Pipeline) {
        let warehouse = Arc::new(MemoryWarehouse::new(events));
        let cache = Arc::new(ReportCache::new(warehouse.clone(), QueryBuilder::default()));
        (warehouse, Pipeline::new(cache, PresentOptions::default()))
    }

    fn april() -> ReportParams {
        ReportParams::parse("week", "2025-04-01", "2025-04-30").unwrap()
    }

    #[tokio::test]
    async fn test_source_chain_scenario() {
        let (_, pipeline) = setup(scenario());
        let result = pipeline
            .cache()
            .get(Dimension::SourceChain, &april())
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result.rows[0].dimension_value, "ethereum");
        assert_eq!(result.rows[0].transfers, 2);
        assert_eq!(result.rows[0].volume_usd, Some(150.0));
        assert_eq!(result.rows[0].secondary, Some(2.0));
        assert_eq!(result.rows[1].dimension_value, "polygon");
        assert_eq!(result.rows[1].transfers, 1);
        assert_eq!(result.rows[1].volume_usd, Some(200.0));
        assert!(result.is_sorted_by_transfers());

        let view = pipeline.section(Dimension::SourceChain, &april()).await.unwrap();
        // volume leader differs from the transfer-count leader
        assert_eq!(view.headlines[0].value.as_deref(), Some("ethereum (2)"));
        assert_eq!(view.headlines[2].value.as_deref(), Some("polygon ($200.0)"));
    }

    #[tokio::test]
    async fn test_every_dimension_is_sorted_by_transfers() {
        let (_, pipeline) = setup(scenario());
        for dimension in Dimension::ALL {
            let result = pipeline.cache().get(dimension, &april()).await.unwrap();
            assert!(result.is_sorted_by_transfers(), "{} not sorted", dimension);
        }

        let tokens = pipeline.cache().get(Dimension::Token, &april()).await.unwrap();
        assert_eq!(tokens.rows[0].dimension_value, "USDC");
        assert_eq!(tokens.rows[0].transfers, 2);
        assert_eq!(tokens.rows[1].dimension_value, "WETH");
    }

    #[tokio::test]
    async fn test_page_renders_all_sections_in_order() {
        let (warehouse, pipeline) = setup(scenario());
        let pipeline = pipeline.with_trend(true);
        let page = pipeline.page(&april()).await.unwrap();

        let dimensions: Vec<Dimension> = page.sections.iter().map(|s| s.dimension).collect();
        assert_eq!(dimensions, Dimension::ALL.to_vec());
        assert!(page.sections.iter().all(|s| s.error.is_none() && s.trend.is_some()));
        assert_eq!(warehouse.summary_calls(), 4);
        assert_eq!(warehouse.trend_calls(), 4);

        // Second render is served from the cache
        pipeline.page(&april()).await.unwrap();
        assert_eq!(warehouse.summary_calls(), 4);
    }

    #[tokio::test]
    async fn test_query_failure_only_fails_its_section() {
        let (warehouse, pipeline) = setup(scenario());
        warehouse.fail_next(ReportError::Query {
            dimension: Dimension::SourceChain,
            message: "Code: 43. Illegal type".to_string(),
        });

        let page = pipeline.page(&april()).await.unwrap();
        let failed: Vec<&SectionView> = page.sections.iter().filter(|s| s.error.is_some()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(page.sections.len(), 4);
    }

    #[tokio::test]
    async fn test_connectivity_failure_fails_the_page() {
        let (warehouse, pipeline) = setup(scenario());
        warehouse.fail_next(ReportError::Connectivity("connection refused".to_string()));

        let err = pipeline.page(&april()).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_empty_range_renders_empty_sections() {
        let (_, pipeline) = setup(scenario());
        let params = ReportParams::parse("day", "2030-01-01", "2030-01-31").unwrap();
        let page = pipeline.page(&params).await.unwrap();

        for section in &page.sections {
            assert_eq!(section.total_rows, 0);
            assert!(section.headlines.iter().all(|h| h.value.is_none()));
        }
    }
}
