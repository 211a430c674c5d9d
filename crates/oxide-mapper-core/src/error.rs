//! Error types for metadata resolution and SQL composition.

use thiserror::Error;

use crate::retrieval::ExecutionMode;

/// A value could not be coerced into the target field type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// The value's type has no conversion into the target.
    #[error("cannot convert {value} into {target}")]
    Incompatible {
        /// The Rust type being produced.
        target: &'static str,
        /// Debug rendering of the offending value.
        value: String,
    },

    /// The value is numeric but does not fit the target.
    #[error("{value} is out of range for {target}")]
    OutOfRange {
        /// The Rust type being produced.
        target: &'static str,
        /// Debug rendering of the offending value.
        value: String,
    },

    /// The entity has no field with this property name.
    #[error("no field named `{0}`")]
    UnknownField(String),
}

/// Errors produced by the mapper.
#[derive(Debug, Error)]
pub enum MapperError {
    /// Invalid or contradictory entity metadata.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A retrieved value could not be written onto an entity field.
    #[error("cannot set `{property}` on {entity}: {source}")]
    Conversion {
        /// The entity type name.
        entity: &'static str,
        /// The property that was being written.
        property: String,
        /// The underlying conversion failure.
        #[source]
        source: ConversionError,
    },

    /// A write reported a row or output parameters without a value for one
    /// of the entity's generated columns.
    #[error("{entity} write returned no value for generated `{property}`")]
    MissingGeneratedValue {
        /// The entity type name.
        entity: &'static str,
        /// The generated property with no value.
        property: String,
    },

    /// The execution provider answered in a different mode than the
    /// statement asked for.
    #[error("expected a {expected:?} outcome, received {received:?}")]
    UnexpectedOutcome {
        expected: ExecutionMode,
        received: ExecutionMode,
    },

    /// The request cannot be expressed deterministically for this entity.
    #[error("unsupported query shape: {0}")]
    UnsupportedShape(String),

    /// Error raised by the SQL execution provider, passed through unchanged.
    #[error("execution error: {0}")]
    Execution(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl MapperError {
    /// Wraps an execution provider error.
    pub fn execution<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Execution(Box::new(err))
    }
}

/// Result type alias for mapper operations.
pub type Result<T> = std::result::Result<T, MapperError>;
