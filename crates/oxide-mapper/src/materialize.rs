//! Building entities from result rows.

use oxide_mapper_core::{
    ColumnInfo, Entity, MapperError, Result, ResultSet, Row, TableInfo, TableRegistry,
};

/// Builds an entity from a row.
///
/// Columns are matched to selectable properties ignoring ASCII case.
/// Columns with no matching property (`page_rn`, computed extras) are
/// skipped; properties with no matching column keep their default.
///
/// # Errors
///
/// Returns [`oxide_mapper_core::MapperError::Conversion`] if a value cannot
/// be coerced to its field's type.
pub fn materialize<E: Entity + Default>(table: &TableInfo, row: &Row) -> Result<E> {
    materialize_with(&table.select_columns(), row)
}

/// Builds one entity per row.
///
/// # Errors
///
/// Fails on the first row that cannot be converted.
pub fn materialize_all<E: Entity + Default>(table: &TableInfo, rows: &[Row]) -> Result<Vec<E>> {
    let columns = table.select_columns();
    rows.iter().map(|row| materialize_with(&columns, row)).collect()
}

fn materialize_with<E: Entity + Default>(columns: &[&ColumnInfo], row: &Row) -> Result<E> {
    let mut entity = E::default();
    for (name, value) in row.iter() {
        if let Some(column) = columns
            .iter()
            .find(|c| c.property_name.eq_ignore_ascii_case(name))
        {
            column.write(&mut entity, value.clone())?;
        }
    }
    Ok(entity)
}

/// The result sets of a multi-statement query, read front to back.
///
/// Each read consumes one set and materializes it as the requested entity.
#[derive(Debug)]
pub struct MultipleResults {
    registry: &'static TableRegistry,
    sets: std::vec::IntoIter<ResultSet>,
}

impl MultipleResults {
    pub(crate) fn new(registry: &'static TableRegistry, sets: Vec<ResultSet>) -> Self {
        Self {
            registry,
            sets: sets.into_iter(),
        }
    }

    /// Number of sets not read yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.sets.len()
    }

    /// Reads the next set as a list of `E`.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::UnsupportedShape`] once every set has been
    /// read, and conversion errors from [`materialize_all`].
    pub fn read<E: Entity + Default>(&mut self) -> Result<Vec<E>> {
        let set = self.next_set()?;
        materialize_all(&*self.registry.resolve::<E>()?, &set)
    }

    /// Reads the next set and keeps its first row.
    ///
    /// # Errors
    ///
    /// See [`MultipleResults::read`].
    pub fn read_first<E: Entity + Default>(&mut self) -> Result<Option<E>> {
        let set = self.next_set()?;
        let table = self.registry.resolve::<E>()?;
        set.first().map(|row| materialize(&table, row)).transpose()
    }

    /// The unread sets as returned by the executor.
    #[must_use]
    pub fn into_sets(self) -> Vec<ResultSet> {
        self.sets.collect()
    }

    fn next_set(&mut self) -> Result<ResultSet> {
        self.sets.next().ok_or_else(|| {
            MapperError::UnsupportedShape(String::from("every result set has been read"))
        })
    }
}
