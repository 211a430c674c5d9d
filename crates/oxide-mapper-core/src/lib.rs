//! # oxide-mapper-core
//!
//! Entity metadata and dialect-specific SQL composition for CRUD and paging.
//!
//! This crate provides:
//! - A declarative entity description ([`schema::EntityDescriptor`]) and the
//!   table metadata derived from it ([`TableInfo`]), cached per type in a
//!   [`TableRegistry`]
//! - Dialect adapters ([`SqlAdapter`]) for generic ANSI SQL, SQL Server,
//!   Oracle, PostgreSQL and SQLite
//! - Generated-value retrieval strategies that read identity, sequence and
//!   computed values back after a write
//! - A lexical SQL clause splitter used to inject and relocate clauses in
//!   caller-supplied fragments
//!
//! Nothing here performs I/O. Composed statements are run by an execution
//! provider (see the `oxide-mapper` crate).
//!
//! ## Composing SQL
//!
//! ```rust
//! use oxide_mapper_core::dialect::{OracleAdapter, SqlAdapter};
//! use oxide_mapper_core::schema::{EntityDescriptor, FieldDescriptor, TableInfo};
//! use oxide_mapper_core::SqlValue;
//!
//! static FIELDS: [FieldDescriptor; 2] = [
//!     FieldDescriptor::new("Id").key().identity(),
//!     FieldDescriptor::new("Name"),
//! ];
//! static PERSON: EntityDescriptor = EntityDescriptor::new("Person", &FIELDS).table("people");
//!
//! let table = TableInfo::from_descriptor(&PERSON, None).unwrap();
//! let page = OracleAdapter::new()
//!     .compose_page_list(&table, 2, 10, "where Name like :Name")
//!     .unwrap();
//!
//! assert!(page.sql.ends_with(
//!     "order by \"ID\" offset :PAGE_SKIP__ rows fetch next :PAGE_SIZE__ rows only"
//! ));
//! assert_eq!(page.parameters.get("PAGE_SKIP__"), Some(&SqlValue::Int(10)));
//! ```
//!
//! ## SQL Injection Prevention
//!
//! Values are only ever bound as parameters. Every table, schema and column
//! name passes through the adapter's identifier quoting, which doubles
//! embedded quote characters.

pub mod config;
pub mod dialect;
pub mod error;
pub mod lexer;
pub mod params;
pub mod retrieval;
pub mod row;
pub mod schema;
pub mod splitter;
pub mod value;
pub mod version;

pub use config::{MapperConfig, VersionKind};
pub use dialect::{AdapterKind, SqlAdapter, Statement};
pub use error::{ConversionError, MapperError, Result};
pub use params::{ParamDirection, Parameter, Parameters};
pub use retrieval::{ExecutionMode, ExecutionOutcome, GeneratedValues, RetrievalStrategy};
pub use row::{ResultSet, Row};
pub use schema::{ColumnInfo, Entity, EntityDescriptor, FieldDescriptor, TableInfo, TableRegistry};
pub use splitter::SqlClauses;
pub use value::{FromSqlValue, SqlValue, ToSqlValue};
pub use version::{CounterVersion, TimestampVersion, VersionStrategy};
