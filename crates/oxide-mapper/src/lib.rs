//! # oxide-mapper
//!
//! Entity CRUD and paging on top of `oxide-mapper-core`.
//!
//! This crate provides:
//! - [`SqlExecutor`] and [`AsyncSqlExecutor`], the seams a database driver
//!   plugs into
//! - [`Database`], which composes SQL for an entity, runs it and writes
//!   generated values (identities, sequences, computed columns, versions)
//!   back onto the entity
//! - [`SqliteExecutor`], an async executor over a sqlx SQLite pool
//!
//! ## Quick Start
//!
//! ```ignore
//! use oxide_mapper::{AdapterKind, Database, Entity, MapperConfig, Parameters, SqliteExecutor};
//!
//! #[derive(Debug, Default, Entity)]
//! struct Person {
//!     id: i64,
//!     first_name: String,
//!     last_name: String,
//! }
//!
//! async fn example() -> oxide_mapper::Result<()> {
//!     let executor = SqliteExecutor::connect("sqlite::memory:")
//!         .await
//!         .map_err(oxide_mapper::MapperError::execution)?;
//!     let db = Database::new(executor, &MapperConfig::new(AdapterKind::Sqlite));
//!
//!     let mut ada = Person { id: 0, first_name: "Ada".into(), last_name: "Lovelace".into() };
//!     db.insert_async(&mut ada).await?;
//!
//!     let params = Parameters::new().with("last_name", "Lovelace");
//!     let found: Vec<Person> = db
//!         .get_page_list_async(1, 10, "where last_name = @last_name", &params)
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Not found is not an error
//!
//! Writes return `Ok(false)` when nothing was written: an update whose key
//! or version no longer matches, a delete of a missing row, an insert that
//! selected no row back. The entity is left unchanged in that case. A row
//! that comes back without one of the generated columns is an error
//! ([`MapperError::MissingGeneratedValue`]).
//!
//! ## Scalars and batches
//!
//! [`Database::execute_scalar`] reads the first column of the first row;
//! [`Database::get_multiple`] runs a `;`-separated batch and returns a
//! [`MultipleResults`] that materializes each set as its own entity type.

pub mod database;
pub mod executor;
pub mod materialize;
pub mod sqlite;

pub use database::Database;
pub use executor::{AsyncSqlExecutor, SqlExecutor};
pub use materialize::{materialize, materialize_all, MultipleResults};
pub use sqlite::{SqliteExecutor, SqliteExecutorError};

pub use oxide_mapper_core::{
    AdapterKind, ConversionError, Entity, MapperConfig, MapperError, Parameters, Result,
    ResultSet, Row, SqlAdapter, SqlValue, TableInfo, TableRegistry, VersionKind,
};
pub use oxide_mapper_derive::Entity;
