mod settings;

pub use settings::{ReportSettings, Settings, WarehouseSettings};
