//! SQLite execution provider over a sqlx pool.
//!
//! Composed SQL uses named markers (`@Name`, `:Name`). SQLite would accept
//! those, but sqlx binds by position, so every marker is rewritten to a
//! numbered `?N` placeholder first; repeated names share a number.

use oxide_mapper_core::lexer::{Lexer, TokenKind};
use oxide_mapper_core::splitter::split_statements;
use oxide_mapper_core::{Parameters, ResultSet, Row, SqlValue};
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, TypeInfo, ValueRef};
use thiserror::Error;
use tracing::trace;

use crate::executor::AsyncSqlExecutor;

/// Errors raised by [`SqliteExecutor`].
#[derive(Debug, Error)]
pub enum SqliteExecutorError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The SQL references a parameter that was never bound.
    #[error("no value bound for parameter `{0}`")]
    MissingParameter(String),

    /// A result column holds a storage class with no [`SqlValue`] form.
    #[error("column `{column}` has unsupported type {type_name}")]
    UnsupportedType {
        /// The result column.
        column: String,
        /// The SQLite type name.
        type_name: String,
    },
}

type Result<T> = std::result::Result<T, SqliteExecutorError>;

/// Runs mapper statements against SQLite.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    /// Wraps an existing pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a pool for `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub async fn connect(url: &str) -> Result<Self> {
        Ok(Self::new(SqlitePool::connect(url).await?))
    }

    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// A statement with positional placeholders and its values in order.
#[derive(Debug, PartialEq)]
struct Positional {
    sql: String,
    values: Vec<SqlValue>,
}

/// Rewrites named parameter markers to `?N`.
fn to_positional(sql: &str, parameters: &Parameters) -> Result<Positional> {
    let mut rewritten = String::with_capacity(sql.len());
    let mut names: Vec<String> = Vec::new();
    let mut values = Vec::new();
    let mut last = 0;

    for token in Lexer::new(sql).tokenize() {
        let TokenKind::Parameter { name, .. } = &token.kind else {
            continue;
        };
        let index = match names.iter().position(|n| n.eq_ignore_ascii_case(name)) {
            Some(i) => i,
            None => {
                let value = parameters
                    .get(name)
                    .ok_or_else(|| SqliteExecutorError::MissingParameter(name.clone()))?;
                names.push(name.clone());
                values.push(value.clone());
                names.len() - 1
            }
        };
        rewritten.push_str(&sql[last..token.span.start]);
        rewritten.push_str(&format!("?{}", index + 1));
        last = token.span.end;
    }
    rewritten.push_str(&sql[last..]);

    Ok(Positional {
        sql: rewritten,
        values,
    })
}

/// Binds a SqlValue parameter to a query.
fn bind_value<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

fn build_query(statement: &Positional) -> sqlx::query::Query<'_, Sqlite, SqliteArguments<'_>> {
    trace!(sql = %statement.sql, values = ?statement.values, "Binding SQLite statement");
    statement
        .values
        .iter()
        .cloned()
        .fold(sqlx::query(&statement.sql), bind_value)
}

fn convert_row(row: &SqliteRow) -> Result<Row> {
    let mut converted = Row::new();
    for column in row.columns() {
        let i = column.ordinal();
        let type_name = {
            let raw = row.try_get_raw(i)?;
            if raw.is_null() {
                None
            } else {
                Some(raw.type_info().name().to_owned())
            }
        };
        let value = match type_name.as_deref() {
            None => SqlValue::Null,
            Some("INTEGER") => SqlValue::Int(row.try_get_unchecked::<i64, _>(i)?),
            Some("REAL") => SqlValue::Float(row.try_get_unchecked::<f64, _>(i)?),
            Some("TEXT") => SqlValue::Text(row.try_get_unchecked::<String, _>(i)?),
            Some("BLOB") => SqlValue::Blob(row.try_get_unchecked::<Vec<u8>, _>(i)?),
            Some(other) => {
                return Err(SqliteExecutorError::UnsupportedType {
                    column: column.name().to_owned(),
                    type_name: other.to_owned(),
                })
            }
        };
        converted.push(column.name(), value);
    }
    Ok(converted)
}

impl AsyncSqlExecutor for SqliteExecutor {
    type Error = SqliteExecutorError;

    async fn execute(&self, sql: &str, parameters: &mut Parameters) -> Result<u64> {
        let statement = to_positional(sql, parameters)?;
        let result = build_query(&statement).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn query(&self, sql: &str, parameters: &Parameters) -> Result<Vec<Row>> {
        let statement = to_positional(sql, parameters)?;
        let rows = build_query(&statement).fetch_all(&self.pool).await?;
        rows.iter().map(convert_row).collect()
    }

    async fn query_multiple(&self, sql: &str, parameters: &Parameters) -> Result<Vec<ResultSet>> {
        let statements = split_statements(sql)
            .into_iter()
            .map(|part| to_positional(part, parameters))
            .collect::<Result<Vec<_>>>()?;

        // Later statements may read connection state (last_insert_rowid,
        // changes) left by earlier ones.
        let mut conn = self.pool.acquire().await?;
        let mut sets = Vec::with_capacity(statements.len());
        for statement in &statements {
            let rows = build_query(statement).fetch_all(&mut *conn).await?;
            sets.push(rows.iter().map(convert_row).collect::<Result<ResultSet>>()?);
        }
        Ok(sets)
    }
}
