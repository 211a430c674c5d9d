//! Table metadata derived from an entity descriptor.

use tracing::warn;

use super::{Entity, EntityDescriptor, FieldDescriptor};
use crate::error::{MapperError, Result};
use crate::value::SqlValue;

/// The persistence shape of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// SQL-side name.
    pub column_name: String,
    /// Entity-side name.
    pub property_name: String,
    pub is_key: bool,
    pub is_generated: bool,
    pub is_identity: bool,
    pub is_version: bool,
    pub exclude_on_insert: bool,
    pub exclude_on_update: bool,
    pub exclude_on_select: bool,
    /// Sequence supplying the value on insert. Such a column is generated
    /// but still part of the insert column list.
    pub sequence_name: Option<String>,
}

impl ColumnInfo {
    /// Derives the column roles of a field.
    #[must_use]
    pub fn from_field(field: &FieldDescriptor) -> Self {
        let has_sequence = field.sequence.is_some();
        let is_identity = field.identity || has_sequence;
        let is_generated = field.identity || field.generated || has_sequence;

        Self {
            column_name: String::from(field.column_name()),
            property_name: String::from(field.property),
            is_key: field.key,
            is_generated,
            is_identity,
            is_version: field.version,
            exclude_on_insert: (is_generated && !has_sequence)
                || field.ignore_insert
                || field.read_only,
            exclude_on_update: is_generated || field.ignore_update || field.read_only,
            exclude_on_select: field.ignore_select,
            sequence_name: field.sequence.map(String::from),
        }
    }

    /// Returns true if the property name differs from the column name.
    #[must_use]
    pub fn is_aliased(&self) -> bool {
        self.column_name != self.property_name
    }

    /// Reads this column's value from an entity.
    #[must_use]
    pub fn read<E: Entity>(&self, entity: &E) -> Option<SqlValue> {
        entity.get_value(&self.property_name)
    }

    /// Writes a retrieved value back onto an entity.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Conversion`] if the value cannot be coerced to
    /// the field's type.
    pub fn write<E: Entity>(&self, entity: &mut E, value: SqlValue) -> Result<()> {
        entity
            .set_value(&self.property_name, value)
            .map_err(|source| MapperError::Conversion {
                entity: E::descriptor().type_name,
                property: self.property_name.clone(),
                source,
            })
    }

    fn violates_version_rules(&self) -> bool {
        self.is_key
            || self.is_generated
            || self.is_identity
            || self.exclude_on_insert
            || self.exclude_on_update
            || self.exclude_on_select
    }
}

/// The persistence shape of an entity type.
///
/// Built once per type by [`super::TableRegistry`]; immutable afterwards.
/// The role views are computed eagerly at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    entity_name: &'static str,
    table_name: String,
    schema_name: Option<String>,
    columns: Vec<ColumnInfo>,
    insert: Vec<usize>,
    update: Vec<usize>,
    select: Vec<usize>,
    keys: Vec<usize>,
    generated: Vec<usize>,
    version: Option<usize>,
}

impl TableInfo {
    /// Derives and validates table metadata.
    ///
    /// `table_name` overrides both the descriptor's explicit table and the
    /// naming convention; an override carries no schema.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Configuration`] if the descriptor has no
    /// fields, maps two fields to one column, declares more than one
    /// version column, or combines the version role with a key, generated,
    /// identity or excluded role.
    pub fn from_descriptor(
        descriptor: &EntityDescriptor,
        table_name: Option<String>,
    ) -> Result<Self> {
        let entity = descriptor.type_name;
        let (table_name, schema_name) = match (table_name, descriptor.table) {
            (Some(mapped), _) => (mapped, None),
            (None, Some(table)) => (String::from(table), descriptor.schema.map(String::from)),
            (None, None) => (descriptor.conventional_table_name(), None),
        };

        if descriptor.fields.is_empty() {
            return Err(MapperError::Configuration(format!(
                "{entity} has no mapped fields"
            )));
        }

        let mut columns: Vec<ColumnInfo> =
            descriptor.fields.iter().map(ColumnInfo::from_field).collect();

        let has_explicit_key = columns.iter().any(|c| c.is_key);
        let id = columns
            .iter()
            .position(|c| c.property_name.eq_ignore_ascii_case("id"));
        match id {
            Some(i) if !has_explicit_key => {
                let column = &mut columns[i];
                column.is_key = true;
                column.is_generated = true;
                column.is_identity = true;
                column.exclude_on_insert = true;
                column.exclude_on_update = true;
            }
            Some(i) if !columns[i].is_key => {
                warn!(
                    entity,
                    field = %columns[i].property_name,
                    "explicit key present; field named id is not promoted to key"
                );
            }
            _ => {}
        }

        Self::validate(entity, &columns)?;

        let pick = |f: fn(&ColumnInfo) -> bool| -> Vec<usize> {
            columns
                .iter()
                .enumerate()
                .filter(|(_, c)| f(c))
                .map(|(i, _)| i)
                .collect()
        };
        let insert = pick(|c| !c.exclude_on_insert);
        let update = pick(|c| !c.exclude_on_update && !c.is_version);
        let select = pick(|c| !c.exclude_on_select);
        let keys = pick(|c| c.is_key);
        let generated = pick(|c| c.is_generated);
        let version = columns.iter().position(|c| c.is_version);

        Ok(Self {
            entity_name: entity,
            table_name,
            schema_name,
            columns,
            insert,
            update,
            select,
            keys,
            generated,
            version,
        })
    }

    fn validate(entity: &str, columns: &[ColumnInfo]) -> Result<()> {
        let mut version_columns = columns.iter().filter(|c| c.is_version);
        if let Some(column) = version_columns.next() {
            if column.violates_version_rules() {
                return Err(MapperError::Configuration(format!(
                    "{entity}.{}: a version column cannot also be a key, identity, \
                     generated, read-only or ignored on insert, update or select",
                    column.property_name
                )));
            }
            if let Some(second) = version_columns.next() {
                return Err(MapperError::Configuration(format!(
                    "{entity} declares more than one version column ({} and {})",
                    column.property_name, second.property_name
                )));
            }
        }

        for (i, column) in columns.iter().enumerate() {
            if columns[..i]
                .iter()
                .any(|c| c.column_name.eq_ignore_ascii_case(&column.column_name))
            {
                return Err(MapperError::Configuration(format!(
                    "{entity} maps more than one field to column `{}`",
                    column.column_name
                )));
            }
        }
        Ok(())
    }

    /// The entity type name this metadata was derived from.
    #[must_use]
    pub const fn entity_name(&self) -> &'static str {
        self.entity_name
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    #[must_use]
    pub fn schema_name(&self) -> Option<&str> {
        self.schema_name.as_deref()
    }

    /// All persisted columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    #[must_use]
    pub fn insert_columns(&self) -> Vec<&ColumnInfo> {
        self.view(&self.insert)
    }

    /// Columns written by an update; the version column is excluded and
    /// handled separately.
    #[must_use]
    pub fn update_columns(&self) -> Vec<&ColumnInfo> {
        self.view(&self.update)
    }

    #[must_use]
    pub fn select_columns(&self) -> Vec<&ColumnInfo> {
        self.view(&self.select)
    }

    #[must_use]
    pub fn key_columns(&self) -> Vec<&ColumnInfo> {
        self.view(&self.keys)
    }

    #[must_use]
    pub fn generated_columns(&self) -> Vec<&ColumnInfo> {
        self.view(&self.generated)
    }

    #[must_use]
    pub fn version_column(&self) -> Option<&ColumnInfo> {
        self.version.map(|i| &self.columns[i])
    }

    /// Property names of all persisted columns.
    #[must_use]
    pub fn property_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.property_name.as_str()).collect()
    }

    /// Returns true if any column is filled from a sequence.
    #[must_use]
    pub fn has_sequence(&self) -> bool {
        self.columns.iter().any(|c| c.sequence_name.is_some())
    }

    /// Finds a column by property name, ignoring ASCII case.
    #[must_use]
    pub fn column_by_property(&self, property: &str) -> Option<&ColumnInfo> {
        self.columns
            .iter()
            .find(|c| c.property_name.eq_ignore_ascii_case(property))
    }

    /// Returns the key column of a single-key entity.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Configuration`] unless exactly one key exists.
    pub fn get_single_key(&self) -> Result<&ColumnInfo> {
        match self.keys.as_slice() {
            [only] => Ok(&self.columns[*only]),
            keys => Err(MapperError::Configuration(format!(
                "{} has {} key columns; this operation requires exactly one",
                self.entity_name,
                keys.len()
            ))),
        }
    }

    /// Returns all key columns in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Configuration`] if the entity has no key.
    pub fn get_composite_keys(&self) -> Result<Vec<&ColumnInfo>> {
        if self.keys.is_empty() {
            return Err(MapperError::Configuration(format!(
                "{} does not have a key column",
                self.entity_name
            )));
        }
        Ok(self.key_columns())
    }

    fn view(&self, indices: &[usize]) -> Vec<&ColumnInfo> {
        indices.iter().map(|&i| &self.columns[i]).collect()
    }
}
