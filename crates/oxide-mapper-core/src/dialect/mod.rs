//! Dialect adapters.
//!
//! Every engine family gets one adapter implementing [`SqlAdapter`]. The
//! trait's default methods are the shared ANSI base; adapters override only
//! the pieces where their engine differs (identifier quoting, parameter
//! markers, paging, generated-value retrieval).
//!
//! Composition is pure: an adapter turns [`TableInfo`] plus a caller
//! fragment into a [`Statement`] holding the SQL text, the parameters the
//! adapter itself injects, and how the statement must be executed. Entity
//! values are never interpolated; identifiers always go through
//! [`SqlAdapter::escape_identifier`].
//!
//! # Example
//!
//! ```
//! use oxide_mapper_core::dialect::{SqlAdapter, SqlServerAdapter};
//! use oxide_mapper_core::schema::{EntityDescriptor, FieldDescriptor, TableInfo};
//!
//! static FIELDS: [FieldDescriptor; 2] = [FieldDescriptor::new("Id"), FieldDescriptor::new("Name")];
//! static PERSON: EntityDescriptor = EntityDescriptor::new("Person", &FIELDS);
//!
//! let table = TableInfo::from_descriptor(&PERSON, None).unwrap();
//! let stmt = SqlServerAdapter::new().compose_exists(&table, "").unwrap();
//! assert_eq!(
//!     stmt.sql,
//!     "select 1 where exists (select 1 from [Persons] where [Id] = @Id)"
//! );
//! ```

mod generic;
mod oracle;
mod postgres;
mod sql_server;
mod sqlite;

use std::fmt::Debug;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use generic::GenericAdapter;
pub use oracle::OracleAdapter;
pub use postgres::PostgresAdapter;
pub use sql_server::SqlServerAdapter;
pub use sqlite::SqliteAdapter;

use crate::error::{MapperError, Result};
use crate::params::Parameters;
use crate::retrieval::{ExecutionMode, RetrievalStrategy};
use crate::schema::{ColumnInfo, TableInfo};
use crate::splitter::SqlClauses;
use crate::value::SqlValue;
use crate::version::VersionStrategy;

/// Bound parameter holding the number of rows skipped by a page query.
pub const PAGE_SKIP_PARAM: &str = "PAGE_SKIP__";
/// Bound parameter holding the page size of a page query.
pub const PAGE_SIZE_PARAM: &str = "PAGE_SIZE__";
/// Suffix of the injected parameter holding a version column's next value.
pub const NEXT_VERSION_SUFFIX: &str = "__next";

/// Which write a statement performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Insert,
    Update,
}

/// Composed SQL ready for an execution provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// The SQL text.
    pub sql: String,
    /// Parameters injected by the adapter, to be merged over the caller's.
    pub parameters: Parameters,
    /// How the statement must be run.
    pub mode: ExecutionMode,
    /// How generated values are read back; `None` for plain statements.
    pub retrieval: RetrievalStrategy,
}

impl Statement {
    /// A statement run as a command.
    #[must_use]
    pub fn execute(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            parameters: Parameters::new(),
            mode: ExecutionMode::Execute,
            retrieval: RetrievalStrategy::None,
        }
    }

    /// A statement run as a query.
    #[must_use]
    pub fn query(sql: impl Into<String>) -> Self {
        Self {
            mode: ExecutionMode::Query,
            ..Self::execute(sql)
        }
    }

    /// Replaces the injected parameters.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Quotes `name` between `open` and `close`, doubling any embedded `close`.
#[must_use]
pub fn quote_identifier(name: &str, open: char, close: char) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push(open);
    for c in name.chars() {
        if c == close {
            quoted.push(close);
        }
        quoted.push(c);
    }
    quoted.push(close);
    quoted
}

/// Validates a 1-based page request and returns `(skip, size)`.
///
/// # Errors
///
/// Returns [`MapperError::UnsupportedShape`] if `page` or `page_size` is
/// below 1 or the offset overflows.
pub fn page_bounds(page: i64, page_size: i64) -> Result<(i64, i64)> {
    if page < 1 || page_size < 1 {
        return Err(MapperError::UnsupportedShape(format!(
            "page {page} of size {page_size}: both must be at least 1"
        )));
    }
    (page - 1)
        .checked_mul(page_size)
        .map(|skip| (skip, page_size))
        .ok_or_else(|| {
            MapperError::UnsupportedShape(format!("page {page} of size {page_size} overflows"))
        })
}

fn join_clauses(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (_, true) => String::from(head),
        (true, false) => String::from(tail),
        (false, false) => format!("{head} {tail}"),
    }
}

/// SQL composition for one database engine family.
pub trait SqlAdapter: Debug + Send + Sync {
    /// The engine family.
    fn kind(&self) -> AdapterKind;

    /// How writes read generated values back.
    fn retrieval_strategy(&self) -> RetrievalStrategy {
        RetrievalStrategy::None
    }

    /// Quotes a table, schema, column or sequence name.
    fn escape_identifier(&self, name: &str) -> String {
        quote_identifier(name, '"', '"')
    }

    /// Renders a bound parameter reference.
    fn escape_parameter(&self, name: &str) -> String {
        format!("@{name}")
    }

    /// The schema-qualified, quoted table name.
    fn escape_table_name(&self, table: &TableInfo) -> String {
        let name = self.escape_identifier(table.table_name());
        match table.schema_name() {
            Some(schema) => format!("{}.{name}", self.escape_identifier(schema)),
            None => name,
        }
    }

    /// The expression that draws the next value of a sequence.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::UnsupportedShape`] on engines without
    /// sequences.
    fn next_value_expression(&self, sequence: &str) -> Result<String> {
        Ok(format!("NEXT VALUE FOR {}", self.escape_identifier(sequence)))
    }

    /// Comma-separated quoted column names.
    fn column_list(&self, columns: &[&ColumnInfo]) -> String {
        columns
            .iter()
            .map(|c| self.escape_identifier(&c.column_name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Comma-separated select items, aliased to the property name where it
    /// differs from the column name.
    fn select_list(&self, columns: &[&ColumnInfo], qualifier: Option<&str>) -> String {
        columns
            .iter()
            .map(|c| {
                let column = self.escape_identifier(&c.column_name);
                let column = match qualifier {
                    Some(q) => format!("{q}.{column}"),
                    None => column,
                };
                if c.is_aliased() {
                    format!("{column} as {}", self.escape_identifier(&c.property_name))
                } else {
                    column
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `col = @Prop and ...` over the given columns.
    fn where_list(&self, columns: &[&ColumnInfo]) -> String {
        columns
            .iter()
            .map(|c| {
                format!(
                    "{} = {}",
                    self.escape_identifier(&c.column_name),
                    self.escape_parameter(&c.property_name)
                )
            })
            .collect::<Vec<_>>()
            .join(" and ")
    }

    /// The key-equality predicate.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Configuration`] if the entity has no key.
    fn key_predicate(&self, table: &TableInfo) -> Result<String> {
        Ok(self.where_list(&table.get_composite_keys()?))
    }

    /// The optimistic-concurrency predicate for the current version value.
    fn version_predicate(&self, column: &ColumnInfo, current: Option<&SqlValue>) -> String {
        let name = self.escape_identifier(&column.column_name);
        match current {
            None | Some(SqlValue::Null) => format!("{name} is null"),
            Some(_) => format!("{name} = {}", self.escape_parameter(&column.property_name)),
        }
    }

    /// Wraps a subquery in a one-row existence check.
    fn wrap_exists(&self, inner: &str) -> String {
        format!("select 1 where exists ({inner})")
    }

    /// The `RETURNING` clause for generated columns.
    fn returning_clause(&self, generated: &[&ColumnInfo]) -> String {
        format!("returning {}", self.select_list(generated, None))
    }

    /// The statement that re-reads generated columns after a write.
    fn select_after(&self, table: &TableInfo, _kind: WriteKind) -> String {
        let target = self.escape_table_name(table);
        format!(
            "select {} from {target} where {}",
            self.select_list(&table.generated_columns(), Some(&target)),
            self.where_list(&table.key_columns())
        )
    }

    /// Attaches generated-value retrieval to a write.
    ///
    /// Entities without generated or key columns get a plain write.
    fn finish_write(
        &self,
        table: &TableInfo,
        sql: String,
        kind: WriteKind,
        mut parameters: Parameters,
    ) -> Statement {
        let generated = table.generated_columns();
        let strategy = if generated.is_empty() || table.key_columns().is_empty() {
            RetrievalStrategy::None
        } else {
            self.retrieval_strategy()
        };

        let sql = match strategy {
            RetrievalStrategy::None => sql,
            RetrievalStrategy::OutputParameters => {
                for column in &generated {
                    parameters.add_output(&column.property_name);
                }
                format!("{sql} {}", self.returning_clause(&generated))
            }
            RetrievalStrategy::ReturningRow => {
                format!("{sql} {}", self.returning_clause(&generated))
            }
            RetrievalStrategy::SelectAfter => {
                format!("{sql}; {}", self.select_after(table, kind))
            }
        };

        Statement {
            sql,
            parameters,
            mode: strategy.execution_mode(),
            retrieval: strategy,
        }
    }

    /// `select <columns> ...` for a bare predicate or FROM-carrying
    /// fragment.
    fn select_from(&self, table: &TableInfo, clauses: &SqlClauses<'_>, predicate: &str) -> String {
        let columns = table.select_columns();
        if clauses.from_clause().is_some() {
            join_clauses(&format!("select {}", self.select_list(&columns, None)), predicate)
        } else {
            let target = self.escape_table_name(table);
            join_clauses(
                &format!(
                    "select {} from {target}",
                    self.select_list(&columns, Some(&target))
                ),
                predicate,
            )
        }
    }

    /// Composes an insert of every insertable column.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::UnsupportedShape`] if a sequence column is
    /// used on an engine without sequences.
    fn compose_insert(&self, table: &TableInfo) -> Result<Statement> {
        let columns = table.insert_columns();
        let target = self.escape_table_name(table);
        let sql = if columns.is_empty() {
            format!("insert into {target} default values")
        } else {
            let values = columns
                .iter()
                .map(|c| match &c.sequence_name {
                    Some(sequence) => self.next_value_expression(sequence),
                    None => Ok(self.escape_parameter(&c.property_name)),
                })
                .collect::<Result<Vec<_>>>()?;
            format!(
                "insert into {target} ({}) values ({})",
                self.column_list(&columns),
                values.join(", ")
            )
        };
        Ok(self.finish_write(table, sql, WriteKind::Insert, Parameters::new()))
    }

    /// Composes an update by key.
    ///
    /// `columns_to_update` narrows the SET list to the named properties.
    /// `current` holds the entity's values; the version column's value in it
    /// guards the WHERE clause and feeds `versions` for the SET clause.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Configuration`] if the entity has no key,
    /// `columns_to_update` names a property that is not updatable, or
    /// nothing is left to set; [`MapperError::Conversion`] if the version
    /// strategy rejects the current version.
    fn compose_update(
        &self,
        table: &TableInfo,
        columns_to_update: Option<&[&str]>,
        current: &Parameters,
        versions: &dyn VersionStrategy,
    ) -> Result<Statement> {
        let mut predicate = self.key_predicate(table)?;
        let mut columns = table.update_columns();

        if let Some(names) = columns_to_update {
            if let Some(unknown) = names.iter().find(|name| {
                !columns
                    .iter()
                    .any(|c| c.property_name.eq_ignore_ascii_case(name))
            }) {
                return Err(MapperError::Configuration(format!(
                    "{} has no updatable property `{unknown}`",
                    table.entity_name()
                )));
            }
            columns.retain(|c| {
                names
                    .iter()
                    .any(|name| name.eq_ignore_ascii_case(&c.property_name))
            });
        }

        let mut assignments: Vec<String> = columns
            .iter()
            .map(|c| {
                format!(
                    "{} = {}",
                    self.escape_identifier(&c.column_name),
                    self.escape_parameter(&c.property_name)
                )
            })
            .collect();

        let mut injected = Parameters::new();
        if let Some(version) = table.version_column() {
            let value = current.get(&version.property_name);
            let next = versions
                .next_version(value.unwrap_or(&SqlValue::Null))
                .map_err(|source| MapperError::Conversion {
                    entity: table.entity_name(),
                    property: version.property_name.clone(),
                    source,
                })?;
            let next_name = format!("{}{NEXT_VERSION_SUFFIX}", version.property_name);
            assignments.push(format!(
                "{} = {}",
                self.escape_identifier(&version.column_name),
                self.escape_parameter(&next_name)
            ));
            injected.add(&next_name, next);
            predicate = format!("{predicate} and {}", self.version_predicate(version, value));
        }

        if assignments.is_empty() {
            return Err(MapperError::Configuration(format!(
                "{} has no columns to update",
                table.entity_name()
            )));
        }

        let sql = format!(
            "update {} set {} where {predicate}",
            self.escape_table_name(table),
            assignments.join(", ")
        );
        Ok(self.finish_write(table, sql, WriteKind::Update, injected))
    }

    /// Composes a delete.
    ///
    /// An empty fragment deletes by key, guarded by the version column when
    /// there is one; `current` supplies the version value.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Configuration`] when deleting by key on an
    /// entity without one, and [`MapperError::UnsupportedShape`] for a full
    /// SELECT fragment.
    fn compose_delete(
        &self,
        table: &TableInfo,
        fragment: &str,
        current: &Parameters,
    ) -> Result<Statement> {
        let clauses = SqlClauses::parse(fragment);
        if let Some(sql) = clauses.passthrough() {
            return Ok(Statement::execute(sql));
        }
        if clauses.is_select() {
            return Err(MapperError::UnsupportedShape(String::from(
                "a delete cannot be driven by a select statement",
            )));
        }

        let target = self.escape_table_name(table);
        let sql = if clauses.is_empty() {
            let mut predicate = self.key_predicate(table)?;
            if let Some(version) = table.version_column() {
                let value = current.get(&version.property_name);
                predicate = format!("{predicate} and {}", self.version_predicate(version, value));
            }
            format!("delete from {target} where {predicate}")
        } else {
            format!("delete from {target} {}", clauses.sql())
        };
        Ok(Statement::execute(sql))
    }

    /// Composes a one-row existence check.
    ///
    /// An empty fragment checks the key; a bare predicate is checked against
    /// the table, or against the fragment's own FROM; a full SELECT is
    /// wrapped unmodified; a `;`-prefixed fragment is used verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Configuration`] for an empty fragment on an
    /// entity without a key.
    fn compose_exists(&self, table: &TableInfo, fragment: &str) -> Result<Statement> {
        let clauses = SqlClauses::parse(fragment);
        if let Some(sql) = clauses.passthrough() {
            return Ok(Statement::query(sql));
        }
        if clauses.is_select() {
            return Ok(Statement::query(self.wrap_exists(clauses.sql())));
        }

        let predicate = if clauses.is_empty() {
            format!("where {}", self.key_predicate(table)?)
        } else {
            String::from(clauses.sql())
        };
        let inner = if clauses.from_clause().is_some() {
            format!("select 1 {predicate}")
        } else {
            format!("select 1 from {} {predicate}", self.escape_table_name(table))
        };
        Ok(Statement::query(self.wrap_exists(&inner)))
    }

    /// Composes a single-row select; an empty fragment selects by key.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Configuration`] for an empty fragment on an
    /// entity without a key.
    fn compose_get(&self, table: &TableInfo, fragment: &str) -> Result<Statement> {
        let clauses = SqlClauses::parse(fragment);
        if let Some(sql) = clauses.passthrough() {
            return Ok(Statement::query(sql));
        }
        if clauses.is_select() {
            return Ok(Statement::query(clauses.sql()));
        }
        let predicate = if clauses.is_empty() {
            format!("where {}", self.key_predicate(table)?)
        } else {
            String::from(clauses.sql())
        };
        Ok(Statement::query(self.select_from(table, &clauses, &predicate)))
    }

    /// Composes the list query; an empty fragment selects every row.
    ///
    /// # Errors
    ///
    /// Never fails in the shared implementation.
    fn compose_list(&self, table: &TableInfo, fragment: &str) -> Result<Statement> {
        let clauses = SqlClauses::parse(fragment);
        if let Some(sql) = clauses.passthrough() {
            return Ok(Statement::query(sql));
        }
        if clauses.is_select() {
            return Ok(Statement::query(clauses.sql()));
        }
        Ok(Statement::query(self.select_from(table, &clauses, clauses.sql())))
    }

    /// Composes a `count(*)` over the list the fragment describes.
    ///
    /// # Errors
    ///
    /// Never fails in the shared implementation.
    fn compose_count(&self, table: &TableInfo, fragment: &str) -> Result<Statement> {
        let clauses = SqlClauses::parse(fragment);
        if let Some(sql) = clauses.passthrough() {
            return Ok(Statement::query(sql));
        }
        let body = clauses.without_order_by();
        let sql = if clauses.is_select() {
            format!("select count(*) from ({body}) count_inner")
        } else if clauses.from_clause().is_some() {
            join_clauses("select count(*)", &body)
        } else {
            join_clauses(
                &format!("select count(*) from {}", self.escape_table_name(table)),
                &body,
            )
        };
        Ok(Statement::query(sql))
    }

    /// The ORDER BY to append when `clauses` has none.
    ///
    /// Returns `None` if the query already orders its rows.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::UnsupportedShape`] if there is no ORDER BY and
    /// no key column to order by.
    fn default_order_by(&self, table: &TableInfo, clauses: &SqlClauses<'_>) -> Result<Option<String>> {
        if clauses.order_by_clause().is_some() {
            return Ok(None);
        }
        let key = table.key_columns().first().copied().ok_or_else(|| {
            MapperError::UnsupportedShape(format!(
                "paging {} requires an order by clause or a key column",
                table.entity_name()
            ))
        })?;
        Ok(Some(format!(
            "order by {}",
            self.escape_identifier(&key.column_name)
        )))
    }

    /// Restricts an ordered base query to rows `skip + 1 ..= skip + size`.
    ///
    /// The shared implementation binds `LIMIT` and `OFFSET`.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::UnsupportedShape`] if the rows cannot be
    /// ordered deterministically.
    fn page(&self, table: &TableInfo, base: &str, skip: i64, size: i64) -> Result<Statement> {
        let clauses = SqlClauses::parse(base);
        let ordered = match self.default_order_by(table, &clauses)? {
            Some(order) => join_clauses(clauses.sql(), &order),
            None => String::from(clauses.sql()),
        };
        let sql = format!(
            "{ordered} limit {} offset {}",
            self.escape_parameter(PAGE_SIZE_PARAM),
            self.escape_parameter(PAGE_SKIP_PARAM)
        );
        Ok(Statement::query(sql).with_parameters(page_parameters(skip, size)))
    }

    /// Composes one page of the list query.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::UnsupportedShape`] for a page or page size
    /// below 1, or when rows cannot be ordered deterministically.
    fn compose_page_list(
        &self,
        table: &TableInfo,
        page: i64,
        page_size: i64,
        fragment: &str,
    ) -> Result<Statement> {
        let (skip, size) = page_bounds(page, page_size)?;
        let base = self.compose_list(table, fragment)?;
        self.page(table, &base.sql, skip, size)
    }
}

/// The bound skip and size parameters of a page query.
#[must_use]
pub fn page_parameters(skip: i64, size: i64) -> Parameters {
    Parameters::new()
        .with(PAGE_SKIP_PARAM, skip)
        .with(PAGE_SIZE_PARAM, size)
}

/// Supported engine families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    #[default]
    #[serde(alias = "ansi")]
    Generic,
    #[serde(alias = "mssql")]
    SqlServer,
    Oracle,
    #[serde(alias = "postgresql")]
    Postgres,
    Sqlite,
}

impl AdapterKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::SqlServer => "sqlserver",
            Self::Oracle => "oracle",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Picks the engine from a connection URL's scheme.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Configuration`] for a URL without a known
    /// scheme.
    pub fn from_url(url: &str) -> Result<Self> {
        let scheme = url
            .split_once(':')
            .map(|(scheme, _)| scheme)
            .ok_or_else(|| MapperError::Configuration(format!("`{url}` has no scheme")))?;
        if scheme.eq_ignore_ascii_case("tds") {
            return Ok(Self::SqlServer);
        }
        scheme.parse()
    }

    /// Builds the adapter with its default retrieval strategy.
    #[must_use]
    pub fn build(self) -> Box<dyn SqlAdapter> {
        match self {
            Self::Generic => Box::new(GenericAdapter::new()),
            Self::SqlServer => Box::new(SqlServerAdapter::new()),
            Self::Oracle => Box::new(OracleAdapter::new()),
            Self::Postgres => Box::new(PostgresAdapter::new()),
            Self::Sqlite => Box::new(SqliteAdapter::new()),
        }
    }
}

impl FromStr for AdapterKind {
    type Err = MapperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "generic" | "ansi" => Ok(Self::Generic),
            "sqlserver" | "mssql" => Ok(Self::SqlServer),
            "oracle" => Ok(Self::Oracle),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(MapperError::Configuration(format!(
                "unknown database engine `{other}`"
            ))),
        }
    }
}
