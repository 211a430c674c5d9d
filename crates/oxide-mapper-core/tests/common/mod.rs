#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDateTime;
use oxide_mapper_core::schema::{Entity, TableInfo, TableRegistry};
use oxide_mapper_derive::Entity;
use uuid::Uuid;

/// Resolves an entity through the shared registry.
pub fn table<E: Entity>() -> Arc<TableInfo> {
    TableRegistry::global()
        .resolve::<E>()
        .unwrap_or_else(|e| panic!("Failed to resolve {}: {e}", E::descriptor().type_name))
}

/// Keyed implicitly through its `id` field.
#[derive(Debug, Clone, Default, PartialEq, Entity)]
pub struct Person {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Entity)]
#[entity(table = "Product", schema = "Sales")]
pub struct Product {
    #[column(key, identity, name = "ProductID")]
    pub product_id: i64,
    pub name: String,
    pub color: Option<String>,
    #[column(name = "rowguid", ignore_update)]
    pub guid_id: Uuid,
    #[column(generated)]
    pub modified_date: Option<NaiveDateTime>,
    #[column(ignore)]
    pub cached_label: Option<String>,
}

/// Externally supplied key with a database-computed column.
#[derive(Debug, Clone, Default, PartialEq, Entity)]
pub struct PersonUniqueIdentifier {
    #[column(key)]
    pub guid_id: Uuid,
    pub first_name: String,
    #[column(generated)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Entity)]
pub struct PersonCompositeKey {
    #[column(key)]
    pub guid_id: Uuid,
    #[column(key)]
    pub state_code: String,
    pub first_name: String,
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
pub struct SequencePerson {
    #[column(key, sequence = "person_seq")]
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Entity)]
#[entity(interface)]
pub struct IWidget {
    pub id: i64,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Entity)]
pub struct NoKey {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Entity)]
pub struct ReadOnlyAudit {
    pub id: i64,
    #[column(read_only)]
    pub created_by: String,
    #[column(ignore_select)]
    pub secret: String,
    #[column(ignore_insert)]
    pub touched: bool,
}
