//! SQL execution providers.
//!
//! The mapper never talks to a database itself. It hands composed SQL and
//! bound parameters to an executor, in one of three shapes: a command, a
//! single query, or a batch whose every statement yields a result set.

use oxide_mapper_core::{
    ExecutionMode, ExecutionOutcome, MapperError, Parameters, ResultSet, Result, Row,
};

/// A blocking execution provider.
pub trait SqlExecutor {
    /// Provider error, passed through unchanged inside
    /// [`MapperError::Execution`].
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs a command and returns the number of affected rows.
    ///
    /// Output parameters are written back into `parameters`.
    fn execute(&self, sql: &str, parameters: &mut Parameters) -> std::result::Result<u64, Self::Error>;

    /// Runs a query and returns its rows.
    fn query(&self, sql: &str, parameters: &Parameters) -> std::result::Result<Vec<Row>, Self::Error>;

    /// Runs a batch and returns one result set per statement.
    fn query_multiple(
        &self,
        sql: &str,
        parameters: &Parameters,
    ) -> std::result::Result<Vec<ResultSet>, Self::Error>;
}

/// An async execution provider with the same contract as [`SqlExecutor`].
#[allow(async_fn_in_trait)]
pub trait AsyncSqlExecutor {
    /// Provider error, passed through unchanged inside
    /// [`MapperError::Execution`].
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs a command and returns the number of affected rows.
    ///
    /// Output parameters are written back into `parameters`.
    async fn execute(
        &self,
        sql: &str,
        parameters: &mut Parameters,
    ) -> std::result::Result<u64, Self::Error>;

    /// Runs a query and returns its rows.
    async fn query(
        &self,
        sql: &str,
        parameters: &Parameters,
    ) -> std::result::Result<Vec<Row>, Self::Error>;

    /// Runs a batch and returns one result set per statement.
    async fn query_multiple(
        &self,
        sql: &str,
        parameters: &Parameters,
    ) -> std::result::Result<Vec<ResultSet>, Self::Error>;
}

/// Runs `sql` in the given mode.
pub(crate) fn run<X: SqlExecutor>(
    executor: &X,
    mode: ExecutionMode,
    sql: &str,
    mut parameters: Parameters,
) -> Result<ExecutionOutcome> {
    let outcome = match mode {
        ExecutionMode::Execute => {
            let rows_affected = executor
                .execute(sql, &mut parameters)
                .map_err(MapperError::execution)?;
            ExecutionOutcome::Executed {
                rows_affected,
                parameters,
            }
        }
        ExecutionMode::Query => ExecutionOutcome::Rows(
            executor
                .query(sql, &parameters)
                .map_err(MapperError::execution)?,
        ),
        ExecutionMode::QueryMultiple => ExecutionOutcome::ResultSets(
            executor
                .query_multiple(sql, &parameters)
                .map_err(MapperError::execution)?,
        ),
    };
    Ok(outcome)
}

/// Runs `sql` in the given mode.
pub(crate) async fn run_async<X: AsyncSqlExecutor>(
    executor: &X,
    mode: ExecutionMode,
    sql: &str,
    mut parameters: Parameters,
) -> Result<ExecutionOutcome> {
    let outcome = match mode {
        ExecutionMode::Execute => {
            let rows_affected = executor
                .execute(sql, &mut parameters)
                .await
                .map_err(MapperError::execution)?;
            ExecutionOutcome::Executed {
                rows_affected,
                parameters,
            }
        }
        ExecutionMode::Query => ExecutionOutcome::Rows(
            executor
                .query(sql, &parameters)
                .await
                .map_err(MapperError::execution)?,
        ),
        ExecutionMode::QueryMultiple => ExecutionOutcome::ResultSets(
            executor
                .query_multiple(sql, &parameters)
                .await
                .map_err(MapperError::execution)?,
        ),
    };
    Ok(outcome)
}
