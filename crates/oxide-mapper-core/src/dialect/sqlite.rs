//! SQLite adapter.

use super::{AdapterKind, SqlAdapter};
use crate::error::{MapperError, Result};
use crate::retrieval::RetrievalStrategy;

/// SQLite adapter.
///
/// Generated values come back through `RETURNING` (SQLite 3.35.0+). SQLite
/// has no sequences; identity keys use `INTEGER PRIMARY KEY` rowids.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteAdapter;

impl SqliteAdapter {
    /// Creates a new SQLite adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SqlAdapter for SqliteAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Sqlite
    }

    fn retrieval_strategy(&self) -> RetrievalStrategy {
        RetrievalStrategy::ReturningRow
    }

    fn next_value_expression(&self, sequence: &str) -> Result<String> {
        Err(MapperError::UnsupportedShape(format!(
            "SQLite has no sequences (column uses `{sequence}`)"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_adapter() {
        let adapter = SqliteAdapter::new();
        assert_eq!(adapter.kind(), AdapterKind::Sqlite);
        assert_eq!(adapter.escape_identifier("Name"), "\"Name\"");
        assert!(adapter.next_value_expression("s").is_err());
    }
}
