use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// Categorical column events are aggregated by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    SourceChain,
    DestinationChain,
    Path,
    Token,
}

impl Dimension {
    /// Page order of the sections.
    pub const ALL: [Dimension; 4] = [
        Dimension::SourceChain,
        Dimension::DestinationChain,
        Dimension::Path,
        Dimension::Token,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::SourceChain => "source_chain",
            Dimension::DestinationChain => "destination_chain",
            Dimension::Path => "path",
            Dimension::Token => "token",
        }
    }

    pub fn spec(&self) -> &'static DimensionSpec {
        match self {
            Dimension::SourceChain => &SOURCE_CHAIN,
            Dimension::DestinationChain => &DESTINATION_CHAIN,
            Dimension::Path => &PATH,
            Dimension::Token => &TOKEN,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source_chain" => Ok(Dimension::SourceChain),
            "destination_chain" => Ok(Dimension::DestinationChain),
            "path" => Ok(Dimension::Path),
            "token" => Ok(Dimension::Token),
            other => Err(ReportError::UnknownDimension(other.to_string())),
        }
    }
}

/// How the dimension-specific secondary column is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryKind {
    /// Distinct count of some other column
    Cardinality,
    /// Transfers per user
    Ratio,
}

/// Everything that differs between the four report sections.
///
/// Column references are to the canonical event view built by
/// [`QueryBuilder`](super::QueryBuilder).
#[derive(Debug)]
pub struct DimensionSpec {
    pub dimension: Dimension,
    /// Non-null String expression producing the group value
    pub group_expr: &'static str,
    /// Predicate excluding rows whose grouping columns are null
    pub null_guard: &'static str,
    /// Nullable(Float64) expression for the secondary column
    pub secondary_expr: &'static str,
    pub secondary_kind: SecondaryKind,
    /// Section heading
    pub title: &'static str,
    /// Table header for the group value column
    pub label: &'static str,
    /// Table header for the secondary column
    pub secondary_label: &'static str,
    /// Noun used in headline captions ("Top Source Chain by ...")
    pub noun: &'static str,
    /// Headline caption suffix for the secondary column
    pub secondary_caption: &'static str,
}

pub static SOURCE_CHAIN: DimensionSpec = DimensionSpec {
    dimension: Dimension::SourceChain,
    group_expr: "assumeNotNull(source_chain)",
    null_guard: "source_chain IS NOT NULL",
    secondary_expr: "toNullable(toFloat64(uniqExact(destination_chain)))",
    secondary_kind: SecondaryKind::Cardinality,
    title: "Monitoring Source Chains",
    label: "📤Source Chain",
    secondary_label: "📥#Dest Chains",
    noun: "Source Chain",
    secondary_caption: "Number of Destination Chains",
};

pub static DESTINATION_CHAIN: DimensionSpec = DimensionSpec {
    dimension: Dimension::DestinationChain,
    group_expr: "assumeNotNull(destination_chain)",
    null_guard: "destination_chain IS NOT NULL",
    secondary_expr: "toNullable(toFloat64(uniqExact(source_chain)))",
    secondary_kind: SecondaryKind::Cardinality,
    title: "Monitoring Destination Chains",
    label: "📥Destination Chain",
    secondary_label: "📤#Source Chains",
    noun: "Destination Chain",
    secondary_caption: "Number of Source Chains",
};

pub static PATH: DimensionSpec = DimensionSpec {
    dimension: Dimension::Path,
    group_expr: "concat(assumeNotNull(source_chain), '→', assumeNotNull(destination_chain))",
    null_guard: "source_chain IS NOT NULL AND destination_chain IS NOT NULL",
    secondary_expr: "round(uniqExact(event_key) / nullIf(uniqExact(sender), 0), 2)",
    secondary_kind: SecondaryKind::Ratio,
    title: "Monitoring Paths",
    label: "🛣️Path",
    secondary_label: "🔁Transfers/User",
    noun: "Path",
    secondary_caption: "Transfers per User",
};

pub static TOKEN: DimensionSpec = DimensionSpec {
    dimension: Dimension::Token,
    group_expr: "assumeNotNull(token_symbol)",
    null_guard: "token_symbol IS NOT NULL",
    secondary_expr: "toNullable(toFloat64(length(arrayDistinct(arrayConcat(groupUniqArray(source_chain), groupUniqArray(destination_chain))))))",
    secondary_kind: SecondaryKind::Cardinality,
    title: "Monitoring Tokens",
    label: "💎Token",
    secondary_label: "🔗#Chains",
    noun: "Token",
    secondary_caption: "Number of Chains",
};

/// Path value for a source/destination pair, as produced by the SQL grouping.
pub fn path_key(source_chain: &str, destination_chain: &str) -> String {
    format!("{}→{}", source_chain, destination_chain)
}
