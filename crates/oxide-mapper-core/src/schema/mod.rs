//! Entity descriptions and the table metadata derived from them.
//!
//! An entity describes itself through a static [`EntityDescriptor`]: one
//! [`FieldDescriptor`] per persisted field, in declaration order. The
//! descriptor is usually emitted by `#[derive(Entity)]` but can be written by
//! hand with the `const` builders:
//!
//! ```
//! use oxide_mapper_core::schema::{EntityDescriptor, FieldDescriptor};
//!
//! static FIELDS: [FieldDescriptor; 2] = [
//!     FieldDescriptor::new("Id").key().identity(),
//!     FieldDescriptor::new("Name").column("full_name"),
//! ];
//! static PERSON: EntityDescriptor = EntityDescriptor::new("Person", &FIELDS).table("people");
//!
//! assert_eq!(PERSON.fields[1].column_name(), "full_name");
//! ```

mod registry;
mod table_info;

pub use registry::{TableNameMapper, TableRegistry};
pub use table_info::{ColumnInfo, TableInfo};

use crate::error::ConversionError;
use crate::value::SqlValue;

/// Static description of one persisted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Entity-side name.
    pub property: &'static str,
    /// SQL-side name, when it differs from the property name.
    pub column: Option<&'static str>,
    /// Part of the primary key.
    pub key: bool,
    /// Populated by an auto-increment mechanism.
    pub identity: bool,
    /// Computed by the database.
    pub generated: bool,
    /// Optimistic-concurrency column.
    pub version: bool,
    /// Never written by inserts.
    pub ignore_insert: bool,
    /// Never written by updates.
    pub ignore_update: bool,
    /// Never read by selects.
    pub ignore_select: bool,
    /// Never written at all.
    pub read_only: bool,
    /// Database sequence that supplies the value on insert.
    pub sequence: Option<&'static str>,
}

impl FieldDescriptor {
    /// Describes a plain read/write field.
    #[must_use]
    pub const fn new(property: &'static str) -> Self {
        Self {
            property,
            column: None,
            key: false,
            identity: false,
            generated: false,
            version: false,
            ignore_insert: false,
            ignore_update: false,
            ignore_select: false,
            read_only: false,
            sequence: None,
        }
    }

    #[must_use]
    pub const fn column(mut self, name: &'static str) -> Self {
        self.column = Some(name);
        self
    }

    #[must_use]
    pub const fn key(mut self) -> Self {
        self.key = true;
        self
    }

    #[must_use]
    pub const fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    #[must_use]
    pub const fn generated(mut self) -> Self {
        self.generated = true;
        self
    }

    #[must_use]
    pub const fn version(mut self) -> Self {
        self.version = true;
        self
    }

    #[must_use]
    pub const fn ignore_insert(mut self) -> Self {
        self.ignore_insert = true;
        self
    }

    #[must_use]
    pub const fn ignore_update(mut self) -> Self {
        self.ignore_update = true;
        self
    }

    #[must_use]
    pub const fn ignore_select(mut self) -> Self {
        self.ignore_select = true;
        self
    }

    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    #[must_use]
    pub const fn sequence(mut self, name: &'static str) -> Self {
        self.sequence = Some(name);
        self
    }

    /// The SQL-side name: the alias if one is set, otherwise the property.
    #[must_use]
    pub const fn column_name(&self) -> &'static str {
        match self.column {
            Some(name) => name,
            None => self.property,
        }
    }
}

/// Static description of an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDescriptor {
    /// The simple type name, used for naming conventions and messages.
    pub type_name: &'static str,
    /// The type follows the interface naming convention (`IPerson`).
    pub interface: bool,
    /// Explicit table name.
    pub table: Option<&'static str>,
    /// Explicit schema name; only honoured together with `table`.
    pub schema: Option<&'static str>,
    /// Persisted fields in declaration order.
    pub fields: &'static [FieldDescriptor],
}

impl EntityDescriptor {
    #[must_use]
    pub const fn new(type_name: &'static str, fields: &'static [FieldDescriptor]) -> Self {
        Self {
            type_name,
            interface: false,
            table: None,
            schema: None,
            fields,
        }
    }

    #[must_use]
    pub const fn table(mut self, name: &'static str) -> Self {
        self.table = Some(name);
        self
    }

    #[must_use]
    pub const fn schema(mut self, name: &'static str) -> Self {
        self.schema = Some(name);
        self
    }

    #[must_use]
    pub const fn interface(mut self) -> Self {
        self.interface = true;
        self
    }

    /// The table name by convention: the type name plus `s`, with a leading
    /// `I` stripped from interface-style names.
    #[must_use]
    pub fn conventional_table_name(&self) -> String {
        let name = format!("{}s", self.type_name);
        match name.strip_prefix('I') {
            Some(stripped) if self.interface => String::from(stripped),
            _ => name,
        }
    }
}

/// A mapped entity type and its property accessor.
///
/// `get_value` and `set_value` address fields by property name.
pub trait Entity: 'static {
    /// The static field-descriptor table for this type.
    fn descriptor() -> &'static EntityDescriptor;

    /// Reads a field, or `None` if the entity has no such property.
    fn get_value(&self, property: &str) -> Option<SqlValue>;

    /// Writes a field, coercing the value to the field's type.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::UnknownField`] for an unknown property and
    /// other variants when the value cannot be coerced.
    fn set_value(&mut self, property: &str, value: SqlValue) -> Result<(), ConversionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conventional_table_name() {
        static NONE: [FieldDescriptor; 0] = [];
        assert_eq!(
            EntityDescriptor::new("Person", &NONE).conventional_table_name(),
            "Persons"
        );
        assert_eq!(
            EntityDescriptor::new("IPerson", &NONE)
                .interface()
                .conventional_table_name(),
            "Persons"
        );
        assert_eq!(
            EntityDescriptor::new("Invoice", &NONE).conventional_table_name(),
            "Invoices"
        );
    }

    #[test]
    fn test_field_builders() {
        let field = FieldDescriptor::new("Seq").sequence("person_seq").column("seq_id");
        assert_eq!(field.column_name(), "seq_id");
        assert_eq!(field.sequence, Some("person_seq"));
        assert!(!field.key);
    }
}
