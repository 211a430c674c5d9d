#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::NaiveDateTime;
use oxide_mapper::{AsyncSqlExecutor, Entity, Parameters, ResultSet, Row, SqlExecutor, SqlValue};
use oxide_mapper_core::ExecutionMode;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

// =============================================================================
// Fixtures
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Entity)]
pub struct Person {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl Person {
    pub fn new(first_name: &str, last_name: &str) -> Self {
        Self {
            id: 0,
            first_name: String::from(first_name),
            last_name: String::from(last_name),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Entity)]
#[entity(table = "Documents")]
pub struct Document {
    pub id: i64,
    pub title: String,
    #[column(version)]
    pub revision: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Entity)]
pub struct Gadget {
    #[column(key)]
    pub guid: Uuid,
    pub name: String,
    pub in_stock: bool,
    pub weight: f64,
    #[column(name = "made_at")]
    pub manufactured: Option<NaiveDateTime>,
    #[column(generated)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Entity)]
#[entity(table = "Memberships")]
pub struct Membership {
    #[column(key)]
    pub group_id: i64,
    #[column(key)]
    pub person_id: i64,
    pub role: String,
}

// =============================================================================
// Recording executor
// =============================================================================

/// One call received by [`RecordingExecutor`].
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub mode: ExecutionMode,
    pub sql: String,
    pub parameters: Parameters,
}

/// A scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Affected row count plus output parameter values.
    Affected(u64, Vec<(&'static str, SqlValue)>),
    Rows(Vec<Row>),
    Sets(Vec<ResultSet>),
}

#[derive(Debug, thiserror::Error)]
#[error("scripted reply {reply:?} does not fit a {mode:?} call")]
pub struct ScriptError {
    pub mode: ExecutionMode,
    pub reply: Reply,
}

/// Records every call and answers from a script.
///
/// With the script exhausted, commands affect one row and queries return
/// nothing.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<Call>>,
    script: Mutex<VecDeque<Reply>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, reply: Reply) -> Self {
        self.script.lock().unwrap().push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> Call {
        self.calls
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_else(|| panic!("no call was recorded"))
    }

    fn record(&self, mode: ExecutionMode, sql: &str, parameters: &Parameters) -> Option<Reply> {
        self.calls.lock().unwrap().push(Call {
            mode,
            sql: String::from(sql),
            parameters: parameters.clone(),
        });
        self.script.lock().unwrap().pop_front()
    }
}

impl SqlExecutor for RecordingExecutor {
    type Error = ScriptError;

    fn execute(&self, sql: &str, parameters: &mut Parameters) -> Result<u64, ScriptError> {
        match self.record(ExecutionMode::Execute, sql, parameters) {
            None => Ok(1),
            Some(Reply::Affected(n, outputs)) => {
                for (name, value) in outputs {
                    parameters.set(name, value);
                }
                Ok(n)
            }
            Some(reply) => Err(ScriptError {
                mode: ExecutionMode::Execute,
                reply,
            }),
        }
    }

    fn query(&self, sql: &str, parameters: &Parameters) -> Result<Vec<Row>, ScriptError> {
        match self.record(ExecutionMode::Query, sql, parameters) {
            None => Ok(Vec::new()),
            Some(Reply::Rows(rows)) => Ok(rows),
            Some(reply) => Err(ScriptError {
                mode: ExecutionMode::Query,
                reply,
            }),
        }
    }

    fn query_multiple(
        &self,
        sql: &str,
        parameters: &Parameters,
    ) -> Result<Vec<ResultSet>, ScriptError> {
        match self.record(ExecutionMode::QueryMultiple, sql, parameters) {
            None => Ok(Vec::new()),
            Some(Reply::Sets(sets)) => Ok(sets),
            Some(reply) => Err(ScriptError {
                mode: ExecutionMode::QueryMultiple,
                reply,
            }),
        }
    }
}

impl AsyncSqlExecutor for RecordingExecutor {
    type Error = ScriptError;

    async fn execute(&self, sql: &str, parameters: &mut Parameters) -> Result<u64, ScriptError> {
        SqlExecutor::execute(self, sql, parameters)
    }

    async fn query(&self, sql: &str, parameters: &Parameters) -> Result<Vec<Row>, ScriptError> {
        SqlExecutor::query(self, sql, parameters)
    }

    async fn query_multiple(
        &self,
        sql: &str,
        parameters: &Parameters,
    ) -> Result<Vec<ResultSet>, ScriptError> {
        SqlExecutor::query_multiple(self, sql, parameters)
    }
}

pub fn row(columns: &[(&str, SqlValue)]) -> Row {
    columns
        .iter()
        .map(|(name, value)| (String::from(*name), value.clone()))
        .collect()
}

// =============================================================================
// SQLite
// =============================================================================

/// A single-connection in-memory database, so every statement sees the
/// same schema.
pub async fn sqlite_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap_or_else(|e| panic!("Failed to create in-memory SQLite pool: {e}"))
}

pub async fn create_schema(pool: &SqlitePool) {
    let ddl = [
        "CREATE TABLE Persons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL
        )",
        "CREATE TABLE Documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            revision INTEGER
        )",
        "CREATE TABLE Gadgets (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            in_stock BOOLEAN NOT NULL,
            weight REAL NOT NULL,
            made_at TEXT,
            label TEXT GENERATED ALWAYS AS (upper(name)) VIRTUAL
        )",
        "CREATE TABLE Memberships (
            group_id INTEGER NOT NULL,
            person_id INTEGER NOT NULL,
            role TEXT NOT NULL,
            PRIMARY KEY (group_id, person_id)
        )",
    ];
    for sql in ddl {
        sqlx::query(sql)
            .execute(pool)
            .await
            .unwrap_or_else(|e| panic!("Failed to create schema: {e}"));
    }
}
