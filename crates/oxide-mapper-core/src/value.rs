//! SQL values and conversions between Rust field types and driver values.
//!
//! Values are always bound as parameters, never interpolated into SQL text.

use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::error::ConversionError;

/// A SQL value that can be used as a parameter or read back from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Returns true if this is `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the integer payload, if this is an `Int`.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        format!("{self:?}")
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

/// Trait for types that can be coerced from a driver value.
///
/// This is the type conversion applied when a generated value is copied back
/// onto an entity field, and when rows are materialized.
pub trait FromSqlValue: Sized {
    /// Converts a `SqlValue` into `Self`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] when the value has no sensible
    /// representation as `Self`.
    fn from_sql_value(value: SqlValue) -> Result<Self, ConversionError>;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl FromSqlValue for SqlValue {
    fn from_sql_value(value: SqlValue) -> Result<Self, ConversionError> {
        Ok(value)
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

macro_rules! impl_to_sql_int {
    ($($ty:ty),+) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::Int(i64::from(self))
                }
            }
        )+
    };
}

impl_to_sql_int!(i32, i16, i8, u32, u16, u8);

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

impl ToSqlValue for Uuid {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.hyphenated().to_string())
    }
}

impl ToSqlValue for NaiveDateTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.format("%Y-%m-%d %H:%M:%S%.f").to_string())
    }
}

impl ToSqlValue for DateTime<Utc> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.to_rfc3339())
    }
}

fn incompatible(target: &'static str, value: &SqlValue) -> ConversionError {
    ConversionError::Incompatible {
        target,
        value: value.describe(),
    }
}

impl FromSqlValue for i64 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn from_sql_value(value: SqlValue) -> Result<Self, ConversionError> {
        match value {
            SqlValue::Int(n) => Ok(n),
            SqlValue::Bool(b) => Ok(Self::from(b)),
            SqlValue::Float(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                Ok(f as Self)
            }
            SqlValue::Float(_) => Err(ConversionError::OutOfRange {
                target: "i64",
                value: value.describe(),
            }),
            SqlValue::Text(ref s) => s.trim().parse().map_err(|_| incompatible("i64", &value)),
            _ => Err(incompatible("i64", &value)),
        }
    }
}

macro_rules! impl_from_sql_int {
    ($($ty:ty),+) => {
        $(
            impl FromSqlValue for $ty {
                fn from_sql_value(value: SqlValue) -> Result<Self, ConversionError> {
                    let described = value.describe();
                    let wide = i64::from_sql_value(value).map_err(|e| match e {
                        ConversionError::Incompatible { value, .. } => ConversionError::Incompatible {
                            target: stringify!($ty),
                            value,
                        },
                        ConversionError::OutOfRange { value, .. } => ConversionError::OutOfRange {
                            target: stringify!($ty),
                            value,
                        },
                        other => other,
                    })?;
                    <$ty>::try_from(wide).map_err(|_| ConversionError::OutOfRange {
                        target: stringify!($ty),
                        value: described,
                    })
                }
            }
        )+
    };
}

impl_from_sql_int!(i32, i16, i8, u32, u16, u8);

impl FromSqlValue for f64 {
    #[allow(clippy::cast_precision_loss)]
    fn from_sql_value(value: SqlValue) -> Result<Self, ConversionError> {
        match value {
            SqlValue::Float(f) => Ok(f),
            SqlValue::Int(n) => Ok(n as Self),
            SqlValue::Text(ref s) => s.trim().parse().map_err(|_| incompatible("f64", &value)),
            _ => Err(incompatible("f64", &value)),
        }
    }
}

impl FromSqlValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_sql_value(value: SqlValue) -> Result<Self, ConversionError> {
        f64::from_sql_value(value).map(|f| f as Self)
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: SqlValue) -> Result<Self, ConversionError> {
        match value {
            SqlValue::Bool(b) => Ok(b),
            SqlValue::Int(0) => Ok(false),
            SqlValue::Int(1) => Ok(true),
            SqlValue::Text(ref s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(incompatible("bool", &value)),
            },
            _ => Err(incompatible("bool", &value)),
        }
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: SqlValue) -> Result<Self, ConversionError> {
        match value {
            SqlValue::Text(s) => Ok(s),
            SqlValue::Int(n) => Ok(n.to_string()),
            SqlValue::Float(f) => Ok(f.to_string()),
            SqlValue::Bool(b) => Ok(b.to_string()),
            _ => Err(incompatible("String", &value)),
        }
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(value: SqlValue) -> Result<Self, ConversionError> {
        match value {
            SqlValue::Blob(b) => Ok(b),
            _ => Err(incompatible("Vec<u8>", &value)),
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: SqlValue) -> Result<Self, ConversionError> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_sql_value(other).map(Some),
        }
    }
}

impl FromSqlValue for Uuid {
    fn from_sql_value(value: SqlValue) -> Result<Self, ConversionError> {
        match value {
            SqlValue::Text(ref s) => Self::parse_str(s.trim()).map_err(|_| incompatible("Uuid", &value)),
            SqlValue::Blob(ref b) => Self::from_slice(b).map_err(|_| incompatible("Uuid", &value)),
            _ => Err(incompatible("Uuid", &value)),
        }
    }
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

impl FromSqlValue for NaiveDateTime {
    fn from_sql_value(value: SqlValue) -> Result<Self, ConversionError> {
        match value {
            SqlValue::Text(ref s) => {
                parse_naive(s.trim()).ok_or_else(|| incompatible("NaiveDateTime", &value))
            }
            _ => Err(incompatible("NaiveDateTime", &value)),
        }
    }
}

impl FromSqlValue for DateTime<Utc> {
    fn from_sql_value(value: SqlValue) -> Result<Self, ConversionError> {
        match value {
            SqlValue::Text(ref s) => parse_naive(s.trim())
                .map(|naive| naive.and_utc())
                .ok_or_else(|| incompatible("DateTime<Utc>", &value)),
            _ => Err(incompatible("DateTime<Utc>", &value)),
        }
    }
}
