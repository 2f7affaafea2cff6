use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::{error, info, warn, LevelFilter};
use simple_logger::SimpleLogger;

use axelscope::{
    db::memory::sample_events,
    present::{text, SectionView},
    ClickhouseWarehouse, Dimension, MemoryWarehouse, PageView, Pipeline, PresentOptions,
    QueryBuilder, ReportCache, ReportError, ReportParams, Settings, Warehouse,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Cross-chain transfer reports over the Axelscan warehouse.
#[derive(Debug, Parser)]
#[command(name = "axelscope", version)]
struct Args {
    /// Config file name (without extension), resolved like `config.yaml`
    #[arg(long, default_value = "config")]
    config: String,

    /// First day of the range (YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// Last day of the range, inclusive (YYYY-MM-DD)
    #[arg(long)]
    end: Option<String>,

    /// Trend bucket size: day, week or month
    #[arg(long)]
    granularity: Option<String>,

    /// Render a single section: source_chain, destination_chain, path or token
    #[arg(long)]
    dimension: Option<String>,

    /// Include the per-period breakdown in every section
    #[arg(long)]
    trend: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Use built-in sample events instead of ClickHouse
    #[arg(long)]
    demo: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    SimpleLogger::new()
        .with_level(if args.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init()
        .context("Failed to initialize logger")?;

    let settings = Settings::from_file(&args.config)
        .with_context(|| format!("Failed to load {}.yaml", args.config))?;

    let report = &settings.report;
    let params = match ReportParams::parse(
        args.granularity.as_deref().unwrap_or(&report.granularity),
        args.start.as_deref().unwrap_or(&report.start_date),
        args.end.as_deref().unwrap_or(&report.end_date),
    ) {
        Ok(params) => params,
        Err(e) => {
            // Shown to the user; nothing is loaded
            warn!("{}", e);
            println!("{}", e);
            return Ok(());
        },
    };

    let dimension = args
        .dimension
        .as_deref()
        .map(str::parse::<Dimension>)
        .transpose()?;

    let (warehouse, builder): (Arc<dyn Warehouse>, QueryBuilder) = if args.demo {
        info!("Running against built-in sample events");
        let warehouse: Arc<dyn Warehouse> = Arc::new(MemoryWarehouse::new(sample_events(2_000)));
        (warehouse, QueryBuilder::default())
    } else {
        let warehouse_settings = settings
            .warehouse
            .as_ref()
            .context("Missing `warehouse` section in configuration")?;
        let builder = QueryBuilder::new(
            &warehouse_settings.transfers_table,
            &warehouse_settings.gmp_table,
        )?;
        let warehouse = ClickhouseWarehouse::connect(warehouse_settings)
            .await
            .context("Failed to initialize warehouse connection")?;
        let warehouse: Arc<dyn Warehouse> = Arc::new(warehouse);
        (warehouse, builder)
    };

    let cache = Arc::new(ReportCache::new(warehouse, builder));
    let pipeline = Pipeline::new(
        cache,
        PresentOptions {
            table_rows: report.table_rows,
        },
    )
    .with_trend(args.trend);

    info!(
        "Building report for {}..{} ({})",
        params.start_date, params.end_date, params.granularity
    );

    let page = match dimension {
        Some(dimension) => single_section(&pipeline, dimension, &params).await?,
        None => pipeline.page(&params).await?,
    };

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&page).context("Failed to encode page")?;
            println!("{}", json);
        },
        OutputFormat::Text => {
            println!(
                "# Cross-chain Transfers {} to {}\n",
                page.params.start_date, page.params.end_date
            );
            for section in &page.sections {
                println!("{}", text::section(section));
            }
        },
    }

    Ok(())
}

async fn single_section(
    pipeline: &Pipeline,
    dimension: Dimension,
    params: &ReportParams,
) -> Result<PageView, ReportError> {
    let section = match pipeline.section(dimension, params).await {
        Ok(view) => view,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            error!("[{}] Section failed: {}", dimension, e);
            SectionView::failed(dimension, &e)
        },
    };

    Ok(PageView {
        params: *params,
        sections: vec![section],
    })
}
