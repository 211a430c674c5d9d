//! Oracle adapter.

use super::{
    page_parameters, quote_identifier, AdapterKind, SqlAdapter, Statement, PAGE_SIZE_PARAM,
    PAGE_SKIP_PARAM,
};
use crate::error::Result;
use crate::retrieval::RetrievalStrategy;
use crate::schema::{ColumnInfo, TableInfo};
use crate::splitter::SqlClauses;

/// Oracle adapter.
///
/// Identifiers are upper-cased and double quoted; parameters use `:name`.
/// Writes append `RETURNING ... INTO` and read the generated values from
/// output parameters, or from a single result row when built with
/// [`OracleAdapter::returning_rows`]. Pages use `OFFSET ... FETCH NEXT`
/// with bound offsets.
#[derive(Debug, Clone, Copy)]
pub struct OracleAdapter {
    retrieval: RetrievalStrategy,
}

impl OracleAdapter {
    /// Creates an adapter that reads generated values from output
    /// parameters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            retrieval: RetrievalStrategy::OutputParameters,
        }
    }

    /// Creates an adapter for drivers that surface `RETURNING ... INTO`
    /// values as a result row.
    #[must_use]
    pub const fn returning_rows() -> Self {
        Self {
            retrieval: RetrievalStrategy::ReturningRow,
        }
    }
}

impl Default for OracleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlAdapter for OracleAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Oracle
    }

    fn retrieval_strategy(&self) -> RetrievalStrategy {
        self.retrieval
    }

    fn escape_identifier(&self, name: &str) -> String {
        quote_identifier(&name.to_uppercase(), '"', '"')
    }

    fn escape_parameter(&self, name: &str) -> String {
        format!(":{name}")
    }

    fn next_value_expression(&self, sequence: &str) -> Result<String> {
        Ok(format!("{}.NEXTVAL", self.escape_identifier(sequence)))
    }

    fn wrap_exists(&self, inner: &str) -> String {
        format!("select 1 from dual where exists ({inner})")
    }

    fn returning_clause(&self, generated: &[&ColumnInfo]) -> String {
        let targets = generated
            .iter()
            .map(|c| self.escape_parameter(&c.property_name))
            .collect::<Vec<_>>()
            .join(", ");
        format!("returning {} into {targets}", self.column_list(generated))
    }

    fn page(&self, table: &TableInfo, base: &str, skip: i64, size: i64) -> Result<Statement> {
        let clauses = SqlClauses::parse(base);
        let order_by = self.default_order_by(table, &clauses)?.unwrap_or_default();
        let mut sql = String::from(clauses.sql());
        if !order_by.is_empty() {
            sql.push(' ');
            sql.push_str(&order_by);
        }
        sql.push_str(&format!(
            " offset {} rows fetch next {} rows only",
            self.escape_parameter(PAGE_SKIP_PARAM),
            self.escape_parameter(PAGE_SIZE_PARAM)
        ));
        Ok(Statement::query(sql).with_parameters(page_parameters(skip, size)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracle_escaping() {
        let adapter = OracleAdapter::new();
        assert_eq!(adapter.escape_identifier("Name"), "\"NAME\"");
        assert_eq!(adapter.escape_parameter("Name"), ":Name");
        assert_eq!(
            adapter.next_value_expression("person_seq").unwrap(),
            "\"PERSON_SEQ\".NEXTVAL"
        );
    }

    #[test]
    fn test_retrieval_modes() {
        assert_eq!(
            OracleAdapter::new().retrieval_strategy(),
            RetrievalStrategy::OutputParameters
        );
        assert_eq!(
            OracleAdapter::returning_rows().retrieval_strategy(),
            RetrievalStrategy::ReturningRow
        );
    }
}
