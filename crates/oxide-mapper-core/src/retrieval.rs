//! Reading server-generated values back after an insert or update.
//!
//! Engines disagree on how a write reports the values it generated. Each
//! adapter picks one [`RetrievalStrategy`] when it is constructed; the
//! composed statement carries it, the execution provider runs the statement
//! in the [`ExecutionMode`] it asks for, and the strategy turns the
//! resulting [`ExecutionOutcome`] into [`GeneratedValues`].

use tracing::warn;

use crate::error::{MapperError, Result};
use crate::params::Parameters;
use crate::row::{ResultSet, Row};
use crate::schema::{Entity, TableInfo};
use crate::value::SqlValue;

/// How a composed statement must be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Run as a command; report affected rows and output parameters.
    Execute,
    /// Run as a query; report its rows.
    Query,
    /// Run as a batch; report one result set per statement.
    QueryMultiple,
}

/// What the execution provider returned.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// Result of [`ExecutionMode::Execute`].
    Executed {
        rows_affected: u64,
        /// The bound parameters after execution, output values included.
        parameters: Parameters,
    },
    /// Result of [`ExecutionMode::Query`].
    Rows(Vec<Row>),
    /// Result of [`ExecutionMode::QueryMultiple`].
    ResultSets(Vec<ResultSet>),
}

impl ExecutionOutcome {
    /// The mode this outcome answers.
    #[must_use]
    pub const fn mode(&self) -> ExecutionMode {
        match self {
            Self::Executed { .. } => ExecutionMode::Execute,
            Self::Rows(_) => ExecutionMode::Query,
            Self::ResultSets(_) => ExecutionMode::QueryMultiple,
        }
    }
}

/// The generated-value retrieval mechanism of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetrievalStrategy {
    /// Plain write; success is a non-zero affected row count.
    #[default]
    None,
    /// `RETURNING ... INTO` bound output parameters.
    OutputParameters,
    /// `RETURNING ...` surfaced as a single result row.
    ReturningRow,
    /// A second statement selects the generated columns after the write.
    SelectAfter,
}

impl RetrievalStrategy {
    /// The execution mode a write using this strategy requires.
    #[must_use]
    pub const fn execution_mode(self) -> ExecutionMode {
        match self {
            Self::None | Self::OutputParameters => ExecutionMode::Execute,
            Self::ReturningRow => ExecutionMode::Query,
            Self::SelectAfter => ExecutionMode::QueryMultiple,
        }
    }

    /// Extracts the generated values of a write.
    ///
    /// Returns `Ok(None)` when the write touched no row. Values are keyed by
    /// property name; `SelectAfter` rows are matched exactly, the other
    /// strategies ignore ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::MissingGeneratedValue`] if the returned row or
    /// output parameters lack a generated column, and
    /// [`MapperError::UnexpectedOutcome`] if the outcome was not produced in
    /// this strategy's [`ExecutionMode`].
    pub fn retrieve(
        self,
        table: &TableInfo,
        outcome: &ExecutionOutcome,
    ) -> Result<Option<GeneratedValues>> {
        match (self, outcome) {
            (Self::None, ExecutionOutcome::Executed { rows_affected, .. }) => {
                Ok((*rows_affected > 0).then(GeneratedValues::default))
            }
            (
                Self::OutputParameters,
                ExecutionOutcome::Executed {
                    rows_affected,
                    parameters,
                },
            ) => {
                if *rows_affected == 0 {
                    return Ok(None);
                }
                collect_generated(table, |property| parameters.get(property)).map(Some)
            }
            (Self::ReturningRow, ExecutionOutcome::Rows(rows)) => match rows.first() {
                Some(row) => {
                    collect_generated(table, |property| row.get_ignore_case(property)).map(Some)
                }
                None => Ok(None),
            },
            (Self::SelectAfter, ExecutionOutcome::ResultSets(sets)) => {
                match sets.last().and_then(|set| set.first()) {
                    Some(row) => collect_generated(table, |property| row.get(property)).map(Some),
                    None => Ok(None),
                }
            }
            (strategy, outcome) => Err(MapperError::UnexpectedOutcome {
                expected: strategy.execution_mode(),
                received: outcome.mode(),
            }),
        }
    }
}

/// Looks up every generated column of `table`; all of them must be present.
fn collect_generated<'a>(
    table: &TableInfo,
    lookup: impl Fn(&str) -> Option<&'a SqlValue>,
) -> Result<GeneratedValues> {
    table
        .generated_columns()
        .into_iter()
        .map(|column| {
            lookup(&column.property_name)
                .map(|value| (column.property_name.clone(), value.clone()))
                .ok_or_else(|| {
                    warn!(
                        entity = table.entity_name(),
                        property = %column.property_name,
                        "Write returned no value for a generated column"
                    );
                    MapperError::MissingGeneratedValue {
                        entity: table.entity_name(),
                        property: column.property_name.clone(),
                    }
                })
        })
        .collect()
}

/// Generated values keyed by property name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedValues {
    values: Vec<(String, SqlValue)>,
}

impl GeneratedValues {
    /// Returns the value retrieved for a property.
    #[must_use]
    pub fn get(&self, property: &str) -> Option<&SqlValue> {
        self.values
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Writes every value onto the entity.
    ///
    /// Every value is attempted; the first conversion failure is returned.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Conversion`] if a value cannot be coerced to
    /// its field's type.
    pub fn apply<E: Entity>(&self, entity: &mut E) -> Result<()> {
        let mut first_error = None;
        for (property, value) in &self.values {
            if let Err(source) = entity.set_value(property, value.clone()) {
                first_error.get_or_insert(MapperError::Conversion {
                    entity: E::descriptor().type_name,
                    property: property.clone(),
                    source,
                });
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl FromIterator<(String, SqlValue)> for GeneratedValues {
    fn from_iter<I: IntoIterator<Item = (String, SqlValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for GeneratedValues {
    type Item = (String, SqlValue);
    type IntoIter = std::vec::IntoIter<(String, SqlValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
