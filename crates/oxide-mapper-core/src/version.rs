//! Optimistic-concurrency version stamping.

use std::fmt::Debug;

use chrono::{SecondsFormat, Utc};

use crate::error::ConversionError;
use crate::value::SqlValue;

/// Computes the value a version column moves to on update.
///
/// The current value is used in the WHERE clause; the value returned here is
/// written by the SET clause.
pub trait VersionStrategy: Debug + Send + Sync {
    /// Returns the next version for `current`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] when `current` is not a value this
    /// strategy knows how to advance.
    fn next_version(&self, current: &SqlValue) -> Result<SqlValue, ConversionError>;
}

/// Integer counter: `NULL` becomes 1, anything else is incremented.
#[derive(Debug, Default, Clone, Copy)]
pub struct CounterVersion;

impl VersionStrategy for CounterVersion {
    fn next_version(&self, current: &SqlValue) -> Result<SqlValue, ConversionError> {
        match current {
            SqlValue::Null => Ok(SqlValue::Int(1)),
            SqlValue::Int(n) => n
                .checked_add(1)
                .map(SqlValue::Int)
                .ok_or_else(|| ConversionError::OutOfRange {
                    target: "version counter",
                    value: n.to_string(),
                }),
            other => Err(ConversionError::Incompatible {
                target: "version counter",
                value: format!("{other:?}"),
            }),
        }
    }
}

/// Re-stamps with the current UTC time as RFC 3339 text.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampVersion;

impl VersionStrategy for TimestampVersion {
    fn next_version(&self, _current: &SqlValue) -> Result<SqlValue, ConversionError> {
        Ok(SqlValue::Text(
            Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        ))
    }
}
