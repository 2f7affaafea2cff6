pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod params;
pub mod pipeline;
pub mod present;
pub mod query;

pub use cache::ReportCache;
pub use config::Settings;
pub use db::{ClickhouseWarehouse, MemoryWarehouse, QueryResult, SummaryRow, Warehouse};
pub use error::ReportError;
pub use params::{Granularity, ReportParams};
pub use pipeline::{PageView, Pipeline};
pub use present::{PresentOptions, SectionView};
pub use query::{Dimension, QueryBuilder};
