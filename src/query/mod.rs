pub mod builder;
pub mod dimension;
pub mod symbols;

pub use builder::{QueryBuilder, QueryKey, QueryKind, Statement};
pub use dimension::{path_key, Dimension, DimensionSpec, SecondaryKind};
pub use symbols::canonical_symbol;

/// Quote a string as a ClickHouse single-quoted literal.
pub(crate) fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use super::sql_literal;

    #[test]
    fn test_sql_literal_escapes_quotes_and_backslashes() {
        assert_eq!(sql_literal("uusdc"), "'uusdc'");
        assert_eq!(sql_literal("it's"), "'it\\'s'");
        assert_eq!(sql_literal("a\\b"), "'a\\\\b'");
    }
}
