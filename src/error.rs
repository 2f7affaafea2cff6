use thiserror::Error;

use crate::query::Dimension;

/// Failures surfaced by the reporting pipeline.
///
/// Variants map onto how the page reacts:
/// - `Validation` is shown inline and nothing is loaded
/// - `Connectivity` aborts the whole page
/// - `Query` fails only the section that issued it
#[derive(Debug, Clone, Error)]
pub enum ReportError {
    #[error("invalid report parameters: {0}")]
    Validation(String),

    #[error("unknown grouping dimension '{0}' (expected source_chain, destination_chain, path or token)")]
    UnknownDimension(String),

    #[error("'{0}' is not a valid table identifier")]
    InvalidIdentifier(String),

    #[error("warehouse unreachable: {0}")]
    Connectivity(String),

    #[error("query for {dimension} failed: {message}")]
    Query { dimension: Dimension, message: String },
}

impl ReportError {
    /// Whether the error should stop the whole page rather than one section.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ReportError::Connectivity(_))
    }
}
