//! PostgreSQL adapter.

use super::{quote_identifier, AdapterKind, SqlAdapter};
use crate::error::Result;
use crate::retrieval::RetrievalStrategy;

/// PostgreSQL adapter.
///
/// Writes append `RETURNING col as "Prop"` and read the generated values
/// from the returned row. Pages use bound `LIMIT` and `OFFSET`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresAdapter;

impl PostgresAdapter {
    /// Creates a new PostgreSQL adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SqlAdapter for PostgresAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Postgres
    }

    fn retrieval_strategy(&self) -> RetrievalStrategy {
        RetrievalStrategy::ReturningRow
    }

    fn next_value_expression(&self, sequence: &str) -> Result<String> {
        Ok(format!("nextval({})", quote_identifier(sequence, '\'', '\'')))
    }
}
