//! Process-wide cache of derived table metadata.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::debug;

use super::{Entity, EntityDescriptor, TableInfo};
use crate::error::Result;

/// Naming override consulted before annotations and conventions.
pub type TableNameMapper = fn(&EntityDescriptor) -> String;

/// Cache of [`TableInfo`] keyed by entity type.
///
/// Lookups take a shared lock only. A miss derives the metadata outside the
/// lock and publishes it; if another thread got there first, its instance
/// is kept and returned. Derivation failures are not cached.
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: RwLock<HashMap<TypeId, Arc<TableInfo>>>,
    name_mapper: Option<TableNameMapper>,
}

impl TableRegistry {
    /// Creates an empty registry using annotations and conventions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry whose table names come from `mapper`.
    #[must_use]
    pub fn with_table_name_mapper(mapper: TableNameMapper) -> Self {
        Self {
            tables: RwLock::default(),
            name_mapper: Some(mapper),
        }
    }

    /// The shared registry.
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<TableRegistry> = OnceLock::new();
        GLOBAL.get_or_init(Self::new)
    }

    /// Resolves the metadata of an entity type.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MapperError::Configuration`] if the entity's
    /// descriptor is invalid.
    pub fn resolve<E: Entity>(&self) -> Result<Arc<TableInfo>> {
        self.resolve_descriptor(TypeId::of::<E>(), E::descriptor())
    }

    /// Resolves metadata for a descriptor registered under `type_id`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MapperError::Configuration`] if the descriptor is
    /// invalid.
    pub fn resolve_descriptor(
        &self,
        type_id: TypeId,
        descriptor: &EntityDescriptor,
    ) -> Result<Arc<TableInfo>> {
        if let Some(info) = self.cached(type_id) {
            return Ok(info);
        }

        let mapped = self.name_mapper.map(|mapper| mapper(descriptor));
        let info = Arc::new(TableInfo::from_descriptor(descriptor, mapped)?);

        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let published = tables.entry(type_id).or_insert_with(|| {
            debug!(
                entity = descriptor.type_name,
                table = info.table_name(),
                columns = info.columns().len(),
                "Resolved table metadata"
            );
            Arc::clone(&info)
        });
        Ok(Arc::clone(published))
    }

    /// Returns true if metadata for `E` has already been resolved.
    #[must_use]
    pub fn contains<E: Entity>(&self) -> bool {
        self.cached(TypeId::of::<E>()).is_some()
    }

    fn cached(&self, type_id: TypeId) -> Option<Arc<TableInfo>> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .cloned()
    }
}
