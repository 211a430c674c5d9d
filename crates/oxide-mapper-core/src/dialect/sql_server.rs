//! SQL Server adapter.

use super::{
    page_bounds, page_parameters, quote_identifier, AdapterKind, SqlAdapter, Statement,
    WriteKind, PAGE_SIZE_PARAM, PAGE_SKIP_PARAM,
};
use crate::error::{MapperError, Result};
use crate::retrieval::RetrievalStrategy;
use crate::schema::TableInfo;
use crate::splitter::SqlClauses;

/// SQL Server (and Azure SQL) adapter.
///
/// Generated values are re-read by a second statement in the same batch:
/// by `SCOPE_IDENTITY()` after inserting a row with an identity key, and by
/// the key predicate otherwise. Pages are cut with `row_number()` over a
/// derived table.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlServerAdapter;

impl SqlServerAdapter {
    /// Creates a new SQL Server adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SqlAdapter for SqlServerAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::SqlServer
    }

    fn retrieval_strategy(&self) -> RetrievalStrategy {
        RetrievalStrategy::SelectAfter
    }

    fn escape_identifier(&self, name: &str) -> String {
        quote_identifier(name, '[', ']')
    }

    fn select_after(&self, table: &TableInfo, kind: WriteKind) -> String {
        let target = self.escape_table_name(table);
        let columns = self.select_list(&table.generated_columns(), Some(&target));
        let keys = table.key_columns();

        let predicate = match (kind, keys.iter().find(|k| k.is_identity)) {
            (WriteKind::Insert, Some(identity)) => format!(
                "{} = SCOPE_IDENTITY()",
                self.escape_identifier(&identity.column_name)
            ),
            (WriteKind::Insert, None) => self.where_list(&keys),
            // Nothing is selected back when the update matched no row.
            (WriteKind::Update, _) => format!("{} and @@ROWCOUNT > 0", self.where_list(&keys)),
        };
        format!("select {columns} from {target} where {predicate}")
    }

    fn page(&self, table: &TableInfo, base: &str, skip: i64, size: i64) -> Result<Statement> {
        self.window_page(table, base, skip, size, false)
    }

    fn compose_page_list(
        &self,
        table: &TableInfo,
        page: i64,
        page_size: i64,
        fragment: &str,
    ) -> Result<Statement> {
        let (skip, size) = page_bounds(page, page_size)?;
        let base = self.compose_list(table, fragment)?;
        let clauses = SqlClauses::parse(fragment);
        let caller_sql = clauses.is_select() || clauses.passthrough().is_some();
        self.window_page(table, &base.sql, skip, size, caller_sql)
    }
}

impl SqlServerAdapter {
    /// Wraps `base` in a `row_number()` window.
    ///
    /// Without a top-level ORDER BY the window orders by the first key. An
    /// adapter-composed list aliases its columns to property names; a
    /// caller's own SELECT (`caller_sql`) exposes column names.
    fn window_page(
        self,
        table: &TableInfo,
        base: &str,
        skip: i64,
        size: i64,
        caller_sql: bool,
    ) -> Result<Statement> {
        let clauses = SqlClauses::parse(base);
        let (order_by, inner) = match clauses.order_by_clause() {
            Some(order_by) => (String::from(order_by), clauses.without_order_by()),
            None => {
                let key = table.key_columns().first().copied().ok_or_else(|| {
                    MapperError::UnsupportedShape(format!(
                        "paging {} requires an order by clause or a key column",
                        table.entity_name()
                    ))
                })?;
                let name = if caller_sql {
                    &key.column_name
                } else {
                    &key.property_name
                };
                (
                    format!("order by {}", self.escape_identifier(name)),
                    String::from(clauses.sql()),
                )
            }
        };

        let skip_param = self.escape_parameter(PAGE_SKIP_PARAM);
        let size_param = self.escape_parameter(PAGE_SIZE_PARAM);
        let sql = format!(
            "select * from (select row_number() over ({order_by}) page_rn, page_inner.* \
             from ({inner}) page_inner) page_outer \
             where page_rn > {skip_param} and page_rn <= {skip_param} + {size_param}"
        );
        Ok(Statement::query(sql).with_parameters(page_parameters(skip, size)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_server_quoting() {
        let adapter = SqlServerAdapter::new();
        assert_eq!(adapter.escape_identifier("Order Details"), "[Order Details]");
        assert_eq!(adapter.escape_identifier("a]b"), "[a]]b]");
        assert_eq!(adapter.escape_parameter("Id"), "@Id");
        assert_eq!(adapter.retrieval_strategy(), RetrievalStrategy::SelectAfter);
    }
}
