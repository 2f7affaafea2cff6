mod event;
mod summary;
mod trend;

pub use event::{Event, ServiceKind};
pub use summary::{QueryResult, SummaryRow};
pub use trend::{TrendResult, TrendRow};
