use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::query::builder::{DEFAULT_GMP_TABLE, DEFAULT_TRANSFERS_TABLE};

/// ClickHouse connection and source table configuration.
///
/// Credentials normally come from the environment
/// (`AXELSCOPE__WAREHOUSE__PASSWORD`) rather than the config file.
#[derive(Debug, Deserialize, Clone)]
pub struct WarehouseSettings {
    pub url: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_database")]
    pub database: String,
    /// Raw token-transfer table
    #[serde(default = "default_transfers_table")]
    pub transfers_table: String,
    /// Raw general message passing table
    #[serde(default = "default_gmp_table")]
    pub gmp_table: String,
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,
}

fn default_user() -> String {
    "default".to_string()
}

fn default_database() -> String {
    "axelscan".to_string()
}

fn default_transfers_table() -> String {
    DEFAULT_TRANSFERS_TABLE.to_string()
}

fn default_gmp_table() -> String {
    DEFAULT_GMP_TABLE.to_string()
}

fn default_connect_retries() -> u32 {
    3
}

/// Default report parameters and presentation options.
///
/// Dates stay as strings here; they are validated by
/// [`ReportParams::parse`](crate::params::ReportParams::parse) so a bad
/// range surfaces as a validation message instead of a config error.
#[derive(Debug, Deserialize, Clone)]
pub struct ReportSettings {
    #[serde(default = "default_granularity")]
    pub granularity: String,
    #[serde(default = "default_start_date")]
    pub start_date: String,
    #[serde(default = "default_end_date")]
    pub end_date: String,
    /// Rows shown per section table
    #[serde(default = "default_table_rows")]
    pub table_rows: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            granularity: default_granularity(),
            start_date: default_start_date(),
            end_date: default_end_date(),
            table_rows: default_table_rows(),
        }
    }
}

fn default_granularity() -> String {
    "month".to_string()
}

fn default_start_date() -> String {
    "2025-01-01".to_string()
}

fn default_end_date() -> String {
    "2025-08-31".to_string()
}

fn default_table_rows() -> usize {
    10
}

/// Root application configuration.
///
/// Loaded from `config.yaml` (optional) with `AXELSCOPE__*` environment
/// overrides.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub warehouse: Option<WarehouseSettings>,
    #[serde(default)]
    pub report: ReportSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_file("config")
    }

    pub fn from_file(name: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(name).required(false))
            .add_source(Environment::with_prefix("AXELSCOPE").separator("__"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(yaml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let settings = parse("warehouse:\n  url: http://localhost:8123\n");
        let warehouse = settings.warehouse.unwrap();
        assert_eq!(warehouse.database, "axelscan");
        assert_eq!(warehouse.transfers_table, DEFAULT_TRANSFERS_TABLE);
        assert_eq!(warehouse.connect_retries, 3);
        assert_eq!(settings.report.start_date, "2025-01-01");
        assert_eq!(settings.report.table_rows, 10);
    }

    #[test]
    fn test_report_section_overrides() {
        let settings = parse("report:\n  granularity: week\n  table_rows: 25\n");
        assert!(settings.warehouse.is_none());
        assert_eq!(settings.report.granularity, "week");
        assert_eq!(settings.report.table_rows, 25);
        assert_eq!(settings.report.end_date, "2025-08-31");
    }
}
