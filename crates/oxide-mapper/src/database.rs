//! The entity-level facade.
//!
//! [`Database`] resolves an entity's table metadata, asks the adapter for
//! SQL, binds the entity's values, runs the statement through the executor
//! and writes generated values back. The blocking and async operations
//! share every step except the executor call.

use std::sync::Arc;

use oxide_mapper_core::dialect::NEXT_VERSION_SUFFIX;
use oxide_mapper_core::{
    CounterVersion, Entity, ExecutionOutcome, FromSqlValue, MapperConfig, MapperError,
    Parameters, Result, ResultSet, Row, SqlAdapter, SqlValue, Statement, TableInfo, TableRegistry,
    ToSqlValue, VersionStrategy,
};
use tracing::{debug, trace};

use crate::executor::{run, run_async, AsyncSqlExecutor, SqlExecutor};
use crate::materialize::{materialize, materialize_all, MultipleResults};

/// Entity CRUD and paging over an executor.
///
/// # Example
///
/// ```ignore
/// use oxide_mapper::{Database, MapperConfig, AdapterKind, SqliteExecutor};
///
/// let executor = SqliteExecutor::connect("sqlite::memory:").await?;
/// let db = Database::new(executor, &MapperConfig::new(AdapterKind::Sqlite));
///
/// let mut person = Person { id: 0, first_name: "Ada".into(), last_name: "Lovelace".into() };
/// assert!(db.insert_async(&mut person).await?);
/// assert!(person.id > 0);
///
/// let page = db
///     .get_page_list_async::<Person>(1, 20, "where last_name = @last_name", &params)
///     .await?;
/// ```
#[derive(Debug)]
pub struct Database<X> {
    executor: X,
    adapter: Box<dyn SqlAdapter>,
    registry: &'static TableRegistry,
    versions: Box<dyn VersionStrategy>,
}

/// A composed write and what is needed to finish it.
struct PlannedWrite {
    table: Arc<TableInfo>,
    statement: Statement,
    next_version: Option<SqlValue>,
}

/// A composed read and the table its rows map onto.
struct PlannedRead {
    table: Arc<TableInfo>,
    statement: Statement,
}

impl<X> Database<X> {
    /// Creates a facade using the configured adapter and version strategy.
    #[must_use]
    pub fn new(executor: X, config: &MapperConfig) -> Self {
        Self {
            executor,
            adapter: config.build_adapter(),
            registry: TableRegistry::global(),
            versions: config.build_version_strategy(),
        }
    }

    /// Creates a facade around an explicit adapter.
    #[must_use]
    pub fn with_adapter(executor: X, adapter: Box<dyn SqlAdapter>) -> Self {
        Self {
            executor,
            adapter,
            registry: TableRegistry::global(),
            versions: Box::new(CounterVersion),
        }
    }

    /// Replaces the version strategy.
    #[must_use]
    pub fn with_version_strategy(mut self, versions: Box<dyn VersionStrategy>) -> Self {
        self.versions = versions;
        self
    }

    /// Resolves metadata through `registry` instead of the shared one.
    #[must_use]
    pub fn with_registry(mut self, registry: &'static TableRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub const fn executor(&self) -> &X {
        &self.executor
    }

    #[must_use]
    pub fn adapter(&self) -> &dyn SqlAdapter {
        self.adapter.as_ref()
    }

    /// Consumes the facade, returning the executor.
    pub fn into_executor(self) -> X {
        self.executor
    }

    /// Resolves the table metadata of an entity type.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Configuration`] for invalid entity metadata.
    pub fn table_info<E: Entity>(&self) -> Result<Arc<TableInfo>> {
        self.registry.resolve::<E>()
    }

    fn plan_insert<E: Entity>(&self, entity: &E) -> Result<PlannedWrite> {
        let table = self.table_info::<E>()?;
        let statement = self.adapter.compose_insert(&table)?;
        Ok(PlannedWrite {
            statement: bind(statement, Parameters::from_entity(entity)),
            table,
            next_version: None,
        })
    }

    fn plan_update<E: Entity>(&self, entity: &E, columns: Option<&[&str]>) -> Result<PlannedWrite> {
        let table = self.table_info::<E>()?;
        let current = Parameters::from_entity(entity);
        let statement =
            self.adapter
                .compose_update(&table, columns, &current, self.versions.as_ref())?;
        let next_version = table.version_column().and_then(|column| {
            statement
                .parameters
                .get(&format!("{}{NEXT_VERSION_SUFFIX}", column.property_name))
                .cloned()
        });
        Ok(PlannedWrite {
            statement: bind(statement, current),
            table,
            next_version,
        })
    }

    fn plan_delete<E: Entity>(&self, entity: &E) -> Result<Statement> {
        let table = self.table_info::<E>()?;
        let current = Parameters::from_entity(entity);
        let statement = self.adapter.compose_delete(&table, "", &current)?;
        Ok(bind(statement, current))
    }

    fn plan_delete_where<E: Entity>(&self, fragment: &str, parameters: &Parameters) -> Result<Statement> {
        let table = self.table_info::<E>()?;
        let statement = self.adapter.compose_delete(&table, fragment, parameters)?;
        Ok(bind(statement, parameters.clone()))
    }

    fn plan_exists<E: Entity>(&self, fragment: &str, parameters: Parameters) -> Result<Statement> {
        let table = self.table_info::<E>()?;
        let statement = self.adapter.compose_exists(&table, fragment)?;
        Ok(bind(statement, parameters))
    }

    fn plan_get<E: Entity>(&self, key: SqlValue) -> Result<PlannedRead> {
        let table = self.table_info::<E>()?;
        let parameters = Parameters::new().with(&table.get_single_key()?.property_name, key);
        let statement = self.adapter.compose_get(&table, "")?;
        Ok(PlannedRead {
            statement: bind(statement, parameters),
            table,
        })
    }

    fn plan_select<E: Entity>(&self, fragment: &str, parameters: Parameters) -> Result<PlannedRead> {
        let table = self.table_info::<E>()?;
        let statement = self.adapter.compose_get(&table, fragment)?;
        Ok(PlannedRead {
            statement: bind(statement, parameters),
            table,
        })
    }

    fn plan_list<E: Entity>(&self, fragment: &str, parameters: &Parameters) -> Result<PlannedRead> {
        let table = self.table_info::<E>()?;
        let statement = self.adapter.compose_list(&table, fragment)?;
        Ok(PlannedRead {
            statement: bind(statement, parameters.clone()),
            table,
        })
    }

    fn plan_page<E: Entity>(
        &self,
        page: i64,
        page_size: i64,
        fragment: &str,
        parameters: &Parameters,
    ) -> Result<PlannedRead> {
        let table = self.table_info::<E>()?;
        let statement = self
            .adapter
            .compose_page_list(&table, page, page_size, fragment)?;
        Ok(PlannedRead {
            statement: bind(statement, parameters.clone()),
            table,
        })
    }

    fn plan_count<E: Entity>(&self, fragment: &str, parameters: &Parameters) -> Result<PlannedRead> {
        let table = self.table_info::<E>()?;
        let statement = self.adapter.compose_count(&table, fragment)?;
        Ok(PlannedRead {
            statement: bind(statement, parameters.clone()),
            table,
        })
    }
}

/// Merges adapter-injected parameters over the caller's.
fn bind(statement: Statement, mut parameters: Parameters) -> Statement {
    let Statement {
        sql,
        parameters: injected,
        mode,
        retrieval,
    } = statement;
    parameters.merge(injected);
    debug!(sql = %sql, ?mode, "Composed statement");
    trace!(parameters = ?parameters, "Bound parameters");
    Statement {
        sql,
        parameters,
        mode,
        retrieval,
    }
}

/// Writes generated values and the advanced version back onto `entity`.
///
/// Returns false, leaving the entity untouched, when the write matched no
/// row. A returned row missing a generated column fails before anything is
/// written.
fn finish_write<E: Entity>(
    write: &PlannedWrite,
    outcome: &ExecutionOutcome,
    entity: &mut E,
) -> Result<bool> {
    let Some(values) = write.statement.retrieval.retrieve(&write.table, outcome)? else {
        debug!(entity = write.table.entity_name(), "Write matched no row");
        return Ok(false);
    };
    values.apply(entity)?;
    if let (Some(column), Some(next)) = (write.table.version_column(), &write.next_version) {
        column.write(entity, next.clone())?;
    }
    Ok(true)
}

fn first<E: Entity + Default>(read: &PlannedRead, rows: &[Row]) -> Result<Option<E>> {
    rows.first()
        .map(|row| materialize(&read.table, row))
        .transpose()
}

fn count_value(table: &TableInfo, rows: &[Row]) -> Result<i64> {
    let Some((_, value)) = rows.first().and_then(|row| row.iter().next()) else {
        return Ok(0);
    };
    i64::from_sql_value(value.clone()).map_err(|source| MapperError::Conversion {
        entity: table.entity_name(),
        property: String::from("count(*)"),
        source,
    })
}

/// The first column of the first row, `None` without rows.
fn scalar_value<T: FromSqlValue>(rows: &[Row]) -> Result<Option<T>> {
    let Some((column, value)) = rows.first().and_then(|row| row.iter().next()) else {
        return Ok(None);
    };
    T::from_sql_value(value.clone())
        .map(Some)
        .map_err(|source| MapperError::Conversion {
            entity: std::any::type_name::<T>(),
            property: String::from(column),
            source,
        })
}

impl<X: SqlExecutor> Database<X> {
    fn command(&self, statement: Statement) -> Result<u64> {
        let mut parameters = statement.parameters;
        self.executor
            .execute(&statement.sql, &mut parameters)
            .map_err(MapperError::execution)
    }

    fn rows(&self, statement: &Statement) -> Result<Vec<Row>> {
        self.executor
            .query(&statement.sql, &statement.parameters)
            .map_err(MapperError::execution)
    }

    fn write<E: Entity>(&self, write: &PlannedWrite, entity: &mut E) -> Result<bool> {
        let statement = &write.statement;
        let outcome = run(
            &self.executor,
            statement.mode,
            &statement.sql,
            statement.parameters.clone(),
        )?;
        finish_write(write, &outcome, entity)
    }

    /// Inserts an entity and copies generated values onto it.
    ///
    /// Returns false when no row was written.
    ///
    /// # Errors
    ///
    /// Returns a [`MapperError`] for invalid metadata, unconvertible
    /// generated values, or an executor failure.
    pub fn insert<E: Entity>(&self, entity: &mut E) -> Result<bool> {
        let write = self.plan_insert(&*entity)?;
        self.write(&write, entity)
    }

    /// Updates an entity by key.
    ///
    /// Returns false when no row matched the key (and version, if any).
    /// On success the entity's version field holds the new version.
    ///
    /// # Errors
    ///
    /// See [`Database::insert`].
    pub fn update<E: Entity>(&self, entity: &mut E) -> Result<bool> {
        let write = self.plan_update(&*entity, None)?;
        self.write(&write, entity)
    }

    /// Updates only the named properties of an entity.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Configuration`] if a name is not an
    /// updatable property; otherwise see [`Database::insert`].
    pub fn update_columns<E: Entity>(&self, entity: &mut E, columns: &[&str]) -> Result<bool> {
        let write = self.plan_update(&*entity, Some(columns))?;
        self.write(&write, entity)
    }

    /// Updates the entity if its key exists, inserts it otherwise.
    ///
    /// # Errors
    ///
    /// See [`Database::insert`].
    pub fn upsert<E: Entity>(&self, entity: &mut E) -> Result<bool> {
        if self.exists(&*entity)? {
            self.update(entity)
        } else {
            self.insert(entity)
        }
    }

    /// Deletes an entity by key, guarded by its version when it has one.
    ///
    /// # Errors
    ///
    /// See [`Database::insert`].
    pub fn delete<E: Entity>(&self, entity: &E) -> Result<bool> {
        Ok(self.command(self.plan_delete(entity)?)? > 0)
    }

    /// Deletes the rows a fragment selects and returns how many went.
    ///
    /// # Errors
    ///
    /// See [`Database::insert`].
    pub fn delete_where<E: Entity>(&self, fragment: &str, parameters: &Parameters) -> Result<u64> {
        self.command(self.plan_delete_where::<E>(fragment, parameters)?)
    }

    /// Returns true if a row with the entity's key exists.
    ///
    /// # Errors
    ///
    /// See [`Database::insert`].
    pub fn exists<E: Entity>(&self, entity: &E) -> Result<bool> {
        let statement = self.plan_exists::<E>("", Parameters::from_entity(entity))?;
        Ok(!self.rows(&statement)?.is_empty())
    }

    /// Returns true if the fragment matches at least one row.
    ///
    /// # Errors
    ///
    /// See [`Database::insert`].
    pub fn exists_where<E: Entity>(&self, fragment: &str, parameters: &Parameters) -> Result<bool> {
        let statement = self.plan_exists::<E>(fragment, parameters.clone())?;
        Ok(!self.rows(&statement)?.is_empty())
    }

    /// Loads the entity whose single key equals `key`.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Configuration`] unless the entity has exactly
    /// one key; otherwise see [`Database::insert`].
    pub fn get<E: Entity + Default>(&self, key: impl ToSqlValue) -> Result<Option<E>> {
        let read = self.plan_get::<E>(key.to_sql_value())?;
        first(&read, &self.rows(&read.statement)?)
    }

    /// Loads the row matching all key values of `entity`.
    ///
    /// # Errors
    ///
    /// See [`Database::insert`].
    pub fn find<E: Entity + Default>(&self, entity: &E) -> Result<Option<E>> {
        let read = self.plan_select::<E>("", Parameters::from_entity(entity))?;
        first(&read, &self.rows(&read.statement)?)
    }

    /// Loads the first row a fragment selects.
    ///
    /// # Errors
    ///
    /// See [`Database::insert`].
    pub fn get_first<E: Entity + Default>(
        &self,
        fragment: &str,
        parameters: &Parameters,
    ) -> Result<Option<E>> {
        let read = self.plan_select::<E>(fragment, parameters.clone())?;
        first(&read, &self.rows(&read.statement)?)
    }

    /// Loads every row a fragment selects; an empty fragment loads all.
    ///
    /// # Errors
    ///
    /// See [`Database::insert`].
    pub fn get_list<E: Entity + Default>(
        &self,
        fragment: &str,
        parameters: &Parameters,
    ) -> Result<Vec<E>> {
        let read = self.plan_list::<E>(fragment, parameters)?;
        materialize_all(&read.table, &self.rows(&read.statement)?)
    }

    /// Loads one 1-based page of the list a fragment selects.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::UnsupportedShape`] for a page or page size
    /// below 1, or when there is neither an ORDER BY nor a key to order by;
    /// otherwise see [`Database::insert`].
    pub fn get_page_list<E: Entity + Default>(
        &self,
        page: i64,
        page_size: i64,
        fragment: &str,
        parameters: &Parameters,
    ) -> Result<Vec<E>> {
        let read = self.plan_page::<E>(page, page_size, fragment, parameters)?;
        materialize_all(&read.table, &self.rows(&read.statement)?)
    }

    /// Counts the rows a fragment selects.
    ///
    /// # Errors
    ///
    /// See [`Database::insert`].
    pub fn count<E: Entity>(&self, fragment: &str, parameters: &Parameters) -> Result<i64> {
        let read = self.plan_count::<E>(fragment, parameters)?;
        count_value(&read.table, &self.rows(&read.statement)?)
    }

    /// Runs arbitrary SQL as a command.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Execution`] if the executor fails.
    pub fn execute_sql(&self, sql: &str, parameters: &mut Parameters) -> Result<u64> {
        debug!(sql = %sql, "Executing SQL");
        self.executor
            .execute(sql, parameters)
            .map_err(MapperError::execution)
    }

    /// Runs a query and returns the first column of its first row.
    ///
    /// Returns `None` when the query yields no rows; a SQL `NULL` converts
    /// like any other value, so read it as `Option<T>`.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Execution`] if the executor fails and
    /// [`MapperError::Conversion`] if the value does not convert to `T`.
    pub fn execute_scalar<T: FromSqlValue>(
        &self,
        sql: &str,
        parameters: &Parameters,
    ) -> Result<Option<T>> {
        debug!(sql = %sql, "Executing scalar query");
        let rows = self
            .executor
            .query(sql, parameters)
            .map_err(MapperError::execution)?;
        scalar_value(&rows)
    }

    /// Runs a batch of `;`-separated queries and returns its result sets.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Execution`] if the executor fails.
    pub fn get_multiple(&self, sql: &str, parameters: &Parameters) -> Result<MultipleResults> {
        debug!(sql = %sql, "Executing multi-result query");
        let sets: Vec<ResultSet> = self
            .executor
            .query_multiple(sql, parameters)
            .map_err(MapperError::execution)?;
        Ok(MultipleResults::new(self.registry, sets))
    }
}

impl<X: AsyncSqlExecutor> Database<X> {
    async fn command_async(&self, statement: Statement) -> Result<u64> {
        let mut parameters = statement.parameters;
        self.executor
            .execute(&statement.sql, &mut parameters)
            .await
            .map_err(MapperError::execution)
    }

    async fn rows_async(&self, statement: &Statement) -> Result<Vec<Row>> {
        self.executor
            .query(&statement.sql, &statement.parameters)
            .await
            .map_err(MapperError::execution)
    }

    async fn write_async<E: Entity>(&self, write: &PlannedWrite, entity: &mut E) -> Result<bool> {
        let statement = &write.statement;
        let outcome = run_async(
            &self.executor,
            statement.mode,
            &statement.sql,
            statement.parameters.clone(),
        )
        .await?;
        finish_write(write, &outcome, entity)
    }

    /// Async [`Database::insert`].
    ///
    /// # Errors
    ///
    /// See [`Database::insert`].
    pub async fn insert_async<E: Entity>(&self, entity: &mut E) -> Result<bool> {
        let write = self.plan_insert(&*entity)?;
        self.write_async(&write, entity).await
    }

    /// Async [`Database::update`].
    ///
    /// # Errors
    ///
    /// See [`Database::insert`].
    pub async fn update_async<E: Entity>(&self, entity: &mut E) -> Result<bool> {
        let write = self.plan_update(&*entity, None)?;
        self.write_async(&write, entity).await
    }

    /// Async [`Database::update_columns`].
    ///
    /// # Errors
    ///
    /// See [`Database::update_columns`].
    pub async fn update_columns_async<E: Entity>(
        &self,
        entity: &mut E,
        columns: &[&str],
    ) -> Result<bool> {
        let write = self.plan_update(&*entity, Some(columns))?;
        self.write_async(&write, entity).await
    }

    /// Async [`Database::upsert`].
    ///
    /// # Errors
    ///
    /// See [`Database::insert`].
    pub async fn upsert_async<E: Entity>(&self, entity: &mut E) -> Result<bool> {
        if self.exists_async(&*entity).await? {
            self.update_async(entity).await
        } else {
            self.insert_async(entity).await
        }
    }

    /// Async [`Database::delete`].
    ///
    /// # Errors
    ///
    /// See [`Database::insert`].
    pub async fn delete_async<E: Entity>(&self, entity: &E) -> Result<bool> {
        Ok(self.command_async(self.plan_delete(entity)?).await? > 0)
    }

    /// Async [`Database::delete_where`].
    ///
    /// # Errors
    ///
    /// See [`Database::insert`].
    pub async fn delete_where_async<E: Entity>(
        &self,
        fragment: &str,
        parameters: &Parameters,
    ) -> Result<u64> {
        self.command_async(self.plan_delete_where::<E>(fragment, parameters)?)
            .await
    }

    /// Async [`Database::exists`].
    ///
    /// # Errors
    ///
    /// See [`Database::insert`].
    pub async fn exists_async<E: Entity>(&self, entity: &E) -> Result<bool> {
        let statement = self.plan_exists::<E>("", Parameters::from_entity(entity))?;
        Ok(!self.rows_async(&statement).await?.is_empty())
    }

    /// Async [`Database::exists_where`].
    ///
    /// # Errors
    ///
    /// See [`Database::insert`].
    pub async fn exists_where_async<E: Entity>(
        &self,
        fragment: &str,
        parameters: &Parameters,
    ) -> Result<bool> {
        let statement = self.plan_exists::<E>(fragment, parameters.clone())?;
        Ok(!self.rows_async(&statement).await?.is_empty())
    }

    /// Async [`Database::get`].
    ///
    /// # Errors
    ///
    /// See [`Database::get`].
    pub async fn get_async<E: Entity + Default>(&self, key: impl ToSqlValue) -> Result<Option<E>> {
        let read = self.plan_get::<E>(key.to_sql_value())?;
        first(&read, &self.rows_async(&read.statement).await?)
    }

    /// Async [`Database::find`].
    ///
    /// # Errors
    ///
    /// See [`Database::insert`].
    pub async fn find_async<E: Entity + Default>(&self, entity: &E) -> Result<Option<E>> {
        let read = self.plan_select::<E>("", Parameters::from_entity(entity))?;
        first(&read, &self.rows_async(&read.statement).await?)
    }

    /// Async [`Database::get_first`].
    ///
    /// # Errors
    ///
    /// See [`Database::insert`].
    pub async fn get_first_async<E: Entity + Default>(
        &self,
        fragment: &str,
        parameters: &Parameters,
    ) -> Result<Option<E>> {
        let read = self.plan_select::<E>(fragment, parameters.clone())?;
        first(&read, &self.rows_async(&read.statement).await?)
    }

    /// Async [`Database::get_list`].
    ///
    /// # Errors
    ///
    /// See [`Database::insert`].
    pub async fn get_list_async<E: Entity + Default>(
        &self,
        fragment: &str,
        parameters: &Parameters,
    ) -> Result<Vec<E>> {
        let read = self.plan_list::<E>(fragment, parameters)?;
        materialize_all(&read.table, &self.rows_async(&read.statement).await?)
    }

    /// Async [`Database::get_page_list`].
    ///
    /// # Errors
    ///
    /// See [`Database::get_page_list`].
    pub async fn get_page_list_async<E: Entity + Default>(
        &self,
        page: i64,
        page_size: i64,
        fragment: &str,
        parameters: &Parameters,
    ) -> Result<Vec<E>> {
        let read = self.plan_page::<E>(page, page_size, fragment, parameters)?;
        materialize_all(&read.table, &self.rows_async(&read.statement).await?)
    }

    /// Async [`Database::count`].
    ///
    /// # Errors
    ///
    /// See [`Database::insert`].
    pub async fn count_async<E: Entity>(&self, fragment: &str, parameters: &Parameters) -> Result<i64> {
        let read = self.plan_count::<E>(fragment, parameters)?;
        count_value(&read.table, &self.rows_async(&read.statement).await?)
    }

    /// Async [`Database::execute_sql`].
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Execution`] if the executor fails.
    pub async fn execute_sql_async(&self, sql: &str, parameters: &mut Parameters) -> Result<u64> {
        debug!(sql = %sql, "Executing SQL");
        self.executor
            .execute(sql, parameters)
            .await
            .map_err(MapperError::execution)
    }

    /// Async [`Database::execute_scalar`].
    ///
    /// # Errors
    ///
    /// See [`Database::execute_scalar`].
    pub async fn execute_scalar_async<T: FromSqlValue>(
        &self,
        sql: &str,
        parameters: &Parameters,
    ) -> Result<Option<T>> {
        debug!(sql = %sql, "Executing scalar query");
        let rows = self
            .executor
            .query(sql, parameters)
            .await
            .map_err(MapperError::execution)?;
        scalar_value(&rows)
    }

    /// Async [`Database::get_multiple`].
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Execution`] if the executor fails.
    pub async fn get_multiple_async(
        &self,
        sql: &str,
        parameters: &Parameters,
    ) -> Result<MultipleResults> {
        debug!(sql = %sql, "Executing multi-result query");
        let sets: Vec<ResultSet> = self
            .executor
            .query_multiple(sql, parameters)
            .await
            .map_err(MapperError::execution)?;
        Ok(MultipleResults::new(self.registry, sets))
    }
}
