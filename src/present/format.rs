//! Number formatting for tables and headline metrics.

use num_format::{Locale, ToFormattedString};

/// Placeholder for NULL cells.
pub const NULL_PLACEHOLDER: &str = "-";

/// How a headline value is scaled for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricCategory {
    /// Event and user counts: `k` suffix from one thousand
    Count,
    /// USD amounts: `$` prefix, `k` from one thousand, `m` from one million
    Currency,
    /// Small distinct counts: plain grouped integer
    Cardinality,
    /// Per-user ratios: two decimals
    Ratio,
}

/// Thousands-grouped integer.
pub fn group_int(value: u64) -> String {
    value.to_formatted_string(&Locale::en)
}

/// Thousands-grouped decimal with exactly `decimals` fractional digits.
pub fn group_fixed(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return NULL_PLACEHOLDER.to_string();
    }

    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (fixed.as_str(), None),
    };

    let grouped = match int_part.parse::<u128>() {
        Ok(n) => n.to_formatted_string(&Locale::en),
        Err(_) => int_part.to_string(),
    };

    let is_zero = fixed.bytes().all(|b| b == b'0' || b == b'.');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// Table cell for a nullable numeric column.
pub fn cell(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => group_fixed(v, decimals),
        _ => NULL_PLACEHOLDER.to_string(),
    }
}

/// Headline value scaled according to its column category.
pub fn scaled(value: f64, category: MetricCategory) -> String {
    let magnitude = value.abs();
    match category {
        MetricCategory::Count if magnitude >= 999.5 => {
            format!("{}k", group_fixed(value / 1_000.0, 1))
        },
        MetricCategory::Count | MetricCategory::Cardinality => group_fixed(value.round(), 0),
        // Thresholds sit where the smaller unit would round up to 1,000
        MetricCategory::Currency if magnitude >= 999_950.0 => {
            format!("${}m", group_fixed(value / 1_000_000.0, 2))
        },
        MetricCategory::Currency if magnitude >= 999.95 => {
            format!("${}k", group_fixed(value / 1_000.0, 1))
        },
        MetricCategory::Currency => format!("${}", group_fixed(value, 1)),
        MetricCategory::Ratio => group_fixed(value, 2),
    }
}
