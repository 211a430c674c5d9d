//! Named parameter sets bound alongside composed SQL.

use crate::schema::Entity;
use crate::value::{SqlValue, ToSqlValue};

/// Direction of a bound parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamDirection {
    /// Value flows to the database only.
    #[default]
    Input,
    /// Value is written by the database (e.g. `RETURNING ... INTO`).
    Output,
    /// Value flows both ways.
    InputOutput,
}

impl ParamDirection {
    /// Returns true if the database may write this parameter.
    #[must_use]
    pub const fn is_output(self) -> bool {
        matches!(self, Self::Output | Self::InputOutput)
    }
}

/// A single named parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name without any dialect prefix.
    pub name: String,
    /// The bound value.
    pub value: SqlValue,
    /// Binding direction.
    pub direction: ParamDirection,
}

/// An ordered set of named parameters.
///
/// Names are matched case-insensitively; the first spelling used wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    entries: Vec<Parameter>,
}

impl Parameters {
    /// Creates an empty parameter set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Builds a parameter set holding every mapped field of an entity,
    /// keyed by property name.
    #[must_use]
    pub fn from_entity<E: Entity>(entity: &E) -> Self {
        let mut params = Self::new();
        for field in E::descriptor().fields {
            if let Some(value) = entity.get_value(field.property) {
                params.add(field.property, value);
            }
        }
        params
    }

    /// Adds a parameter, consuming and returning the set.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl ToSqlValue) -> Self {
        self.add(name, value);
        self
    }

    /// Adds or replaces an input parameter.
    pub fn add(&mut self, name: &str, value: impl ToSqlValue) -> &mut Self {
        let value = value.to_sql_value();
        match self.position(name) {
            Some(i) => self.entries[i].value = value,
            None => self.entries.push(Parameter {
                name: String::from(name),
                value,
                direction: ParamDirection::Input,
            }),
        }
        self
    }

    /// Marks a parameter as written by the database.
    ///
    /// An existing input parameter becomes `InputOutput` and keeps its value.
    pub fn add_output(&mut self, name: &str) -> &mut Self {
        match self.position(name) {
            Some(i) => {
                let entry = &mut self.entries[i];
                if entry.direction == ParamDirection::Input {
                    entry.direction = ParamDirection::InputOutput;
                }
            }
            None => self.entries.push(Parameter {
                name: String::from(name),
                value: SqlValue::Null,
                direction: ParamDirection::Output,
            }),
        }
        self
    }

    /// Returns the value bound under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.parameter(name).map(|p| &p.value)
    }

    /// Returns the full parameter bound under `name`.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.position(name).map(|i| &self.entries[i])
    }

    /// Overwrites the value of an existing parameter.
    ///
    /// Returns false if no parameter has that name.
    pub fn set(&mut self, name: &str, value: SqlValue) -> bool {
        match self.position(name) {
            Some(i) => {
                self.entries[i].value = value;
                true
            }
            None => false,
        }
    }

    /// Merges `other` into this set.
    ///
    /// Input values in `other` replace existing values; output markers in
    /// `other` only widen the direction of an existing parameter.
    pub fn merge(&mut self, other: Self) {
        for param in other.entries {
            match param.direction {
                ParamDirection::Input => {
                    self.add(&param.name, param.value);
                }
                ParamDirection::Output => {
                    self.add_output(&param.name);
                }
                ParamDirection::InputOutput => {
                    self.add(&param.name, param.value);
                    self.add_output(&param.name);
                }
            }
        }
    }

    /// Returns true if a parameter with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Iterates parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.entries.iter()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
