//! User-selected report parameters: time range and granularity.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// Bucket size for the per-period trend breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            other => Err(ReportError::Validation(format!(
                "granularity must be day, week or month, got '{}'",
                other
            ))),
        }
    }
}

/// Validated `(granularity, start_date, end_date)` triple.
///
/// Both dates are inclusive. Future-dated ranges are accepted and simply
/// produce empty results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ReportParams {
    pub granularity: Granularity,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ReportParams {
    pub fn new(
        granularity: Granularity,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, ReportError> {
        let params = Self {
            granularity,
            start_date,
            end_date,
        };
        params.validate()?;
        Ok(params)
    }

    /// Parse dates in `YYYY-MM-DD` form and validate the range.
    pub fn parse(granularity: &str, start_date: &str, end_date: &str) -> Result<Self, ReportError> {
        let granularity = granularity.parse()?;
        let start_date = parse_date("start date", start_date)?;
        let end_date = parse_date("end date", end_date)?;
        Self::new(granularity, start_date, end_date)
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        if self.end_date < self.start_date {
            return Err(ReportError::Validation(format!(
                "end date {} is before start date {}",
                self.end_date, self.start_date
            )));
        }
        Ok(())
    }
}

fn parse_date(label: &str, value: &str) -> Result<NaiveDate, ReportError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        ReportError::Validation(format!("{} '{}' is not a YYYY-MM-DD date: {}", label, value, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        let err = ReportParams::new(Granularity::Day, date("2025-02-01"), date("2025-01-31"))
            .unwrap_err();
        assert!(matches!(err, ReportError::Validation(_)));
    }

    #[test]
    fn test_single_day_and_future_ranges_are_accepted() {
        assert!(ReportParams::new(Granularity::Day, date("2025-03-01"), date("2025-03-01")).is_ok());
        assert!(ReportParams::new(Granularity::Month, date("2099-01-01"), date("2099-12-31")).is_ok());
    }

    #[test]
    fn test_parse_accepts_mixed_case_granularity() {
        let params = ReportParams::parse("Week", "2025-01-01", "2025-08-31").unwrap();
        assert_eq!(params.granularity, Granularity::Week);
        assert_eq!(params.end_date, date("2025-08-31"));
    }

    #[test]
    fn test_parse_rejects_bad_inputs() {
        assert!(ReportParams::parse("year", "2025-01-01", "2025-08-31").is_err());
        assert!(ReportParams::parse("day", "01/01/2025", "2025-08-31").is_err());
    }
}
