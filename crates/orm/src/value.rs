//! Values exchanged with the database
//!
//! `Value` is what gets bound to placeholders and what rows decode into.
//! `FromValue` converts a decoded value back into a typed model field,
//! accepting the loose representations drivers use (numbers as text,
//! booleans as integers).

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value as JsonValue;
use sqlx::types::Decimal;
use uuid::Uuid;

use crate::error::{OrmError, OrmResult};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Database value enumeration for type-safe parameter binding
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Exact numeric, as stored in DECIMAL/NUMERIC columns
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Json(JsonValue),
    Uuid(Uuid),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
}

/// Primitive kind used to pick the binding mode of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindKind {
    Null,
    Boolean,
    Integer,
    Text,
    /// Bound without a specific primitive type
    Unspecified,
}

impl Value {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Inferred primitive kind
    pub fn kind(&self) -> BindKind {
        match self {
            Value::Null => BindKind::Null,
            Value::Bool(_) => BindKind::Boolean,
            Value::Int(_) => BindKind::Integer,
            Value::Text(_) => BindKind::Text,
            _ => BindKind::Unspecified,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view, parsing text and truncating integral floats
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Value::Decimal(d) if d.is_integer() => i64::try_from(*d).ok(),
            Value::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            }
            _ => None,
        }
    }

    /// Floating point view, parsing text
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Decimal(d) => f64::try_from(*d).ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(0) => Some(false),
            Value::Int(1) => Some(true),
            Value::Text(s) => match s.trim() {
                "0" | "false" | "f" => Some(false),
                "1" | "true" | "t" => Some(true),
                _ => None,
            },
            _ => None,
        }
    }

    /// Short type label for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Json(_) => "json",
            Value::Uuid(_) => "uuid",
            Value::Timestamp(_) => "timestamp",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Text(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Json(j) => write!(f, "{}", j),
            Value::Uuid(u) => write!(f, "{}", u),
            Value::Timestamp(t) => write!(f, "{}", t.format(DATETIME_FORMAT)),
            Value::Date(d) => write!(f, "{}", d),
            Value::Time(t) => write!(f, "{}", t),
        }
    }
}

macro_rules! value_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Int(i64::from(value))
                }
            }
        )*
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Text(value.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        Value::Json(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Timestamp(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveTime> for Value {
    fn from(value: NaiveTime) -> Self {
        Value::Time(value)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Conversion from a decoded value into a typed field
pub trait FromValue: Sized {
    fn from_value(value: Value) -> OrmResult<Self>;
}

fn mismatch<T>(expected: &str, value: &Value) -> OrmResult<T> {
    Err(OrmError::hydration(format!(
        "expected {}, got {} value '{}'",
        expected,
        value.type_name(),
        value
    )))
}

impl FromValue for Value {
    fn from_value(value: Value) -> OrmResult<Self> {
        Ok(value)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value.as_i64() {
            Some(i) => Ok(i),
            None => mismatch("integer", &value),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> OrmResult<Self> {
        let wide = i64::from_value(value)?;
        i32::try_from(wide)
            .map_err(|_| OrmError::hydration(format!("integer {} out of range for i32", wide)))
    }
}

impl FromValue for u32 {
    fn from_value(value: Value) -> OrmResult<Self> {
        let wide = i64::from_value(value)?;
        u32::try_from(wide)
            .map_err(|_| OrmError::hydration(format!("integer {} out of range for u32", wide)))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value.as_f64() {
            Some(f) => Ok(f),
            None => mismatch("number", &value),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value.as_bool() {
            Some(b) => Ok(b),
            None => mismatch("boolean", &value),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Null | Value::Bytes(_) => mismatch("text", &value),
            other => Ok(other.to_string()),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::Text(s) => Ok(s.into_bytes()),
            other => mismatch("bytes", &other),
        }
    }
}

impl FromValue for JsonValue {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Json(j) => Ok(j),
            Value::Text(s) => Ok(serde_json::from_str(&s)?),
            other => mismatch("json", &other),
        }
    }
}

impl FromValue for Uuid {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Uuid(u) => Ok(u),
            Value::Text(ref s) => {
                Uuid::parse_str(s).map_err(|e| OrmError::hydration(format!("invalid uuid '{}': {}", s, e)))
            }
            Value::Bytes(ref b) => {
                Uuid::from_slice(b).map_err(|e| OrmError::hydration(format!("invalid uuid bytes: {}", e)))
            }
            other => mismatch("uuid", &other),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Timestamp(t) => Ok(t),
            Value::Text(ref s) => NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
                .map_err(|e| OrmError::hydration(format!("invalid timestamp '{}': {}", s, e))),
            other => mismatch("timestamp", &other),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Date(d) => Ok(d),
            Value::Timestamp(t) => Ok(t.date()),
            Value::Text(ref s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| OrmError::hydration(format!("invalid date '{}': {}", s, e))),
            other => mismatch("date", &other),
        }
    }
}

impl FromValue for NaiveTime {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Time(t) => Ok(t),
            Value::Timestamp(t) => Ok(t.time()),
            Value::Text(ref s) => NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
                .map_err(|e| OrmError::hydration(format!("invalid time '{}': {}", s, e))),
            other => mismatch("time", &other),
        }
    }
}

impl FromValue for Decimal {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Decimal(d) => Ok(d),
            Value::Int(i) => Ok(Decimal::from(i)),
            Value::Float(f) => Decimal::try_from(f)
                .map_err(|e| OrmError::hydration(format!("float {} is not a decimal: {}", f, e))),
            Value::Text(ref s) => s
                .trim()
                .parse::<Decimal>()
                .map_err(|e| OrmError::hydration(format!("invalid decimal '{}': {}", s, e))),
            other => mismatch("decimal", &other),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_kinds() {
        assert_eq!(Value::Null.kind(), BindKind::Null);
        assert_eq!(Value::from(true).kind(), BindKind::Boolean);
        assert_eq!(Value::from(42).kind(), BindKind::Integer);
        assert_eq!(Value::from("x").kind(), BindKind::Text);
        assert_eq!(Value::from(1.5).kind(), BindKind::Unspecified);
        assert_eq!(Value::from(Uuid::nil()).kind(), BindKind::Unspecified);
    }

    #[test]
    fn test_numeric_views_accept_text() {
        assert_eq!(Value::from("12").as_i64(), Some(12));
        assert_eq!(Value::from("12.00").as_i64(), Some(12));
        assert_eq!(Value::from("12.5").as_f64(), Some(12.5));
        assert_eq!(Value::from("abc").as_f64(), None);
        assert_eq!(Value::Null.as_i64(), None);
    }

    #[test]
    fn test_typed_conversions() {
        assert_eq!(i64::from_value(Value::from("7")).unwrap(), 7);
        assert!(bool::from_value(Value::Int(1)).unwrap());
        assert_eq!(String::from_value(Value::Int(3)).unwrap(), "3");
        assert_eq!(Option::<i64>::from_value(Value::Null).unwrap(), None);
        assert!(i64::from_value(Value::from("seven")).is_err());
        assert!(i32::from_value(Value::Int(i64::MAX)).is_err());
    }

    #[test]
    fn test_decimal_and_time_values() {
        let price: Decimal = "10.50".parse().unwrap();
        let value = Value::from(price);

        assert_eq!(value.kind(), BindKind::Unspecified);
        assert_eq!(value.to_string(), "10.50");
        assert_eq!(value.as_f64(), Some(10.5));
        assert_eq!(value.as_i64(), None);
        assert_eq!(Value::from(Decimal::from(41)).as_i64(), Some(41));
        assert_eq!(Decimal::from_value(Value::from("10.50")).unwrap(), price);
        assert_eq!(Decimal::from_value(value).unwrap(), price);

        let opens = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        assert_eq!(NaiveTime::from_value(Value::from("09:30:00")).unwrap(), opens);
        assert_eq!(NaiveTime::from_value(Value::from(opens)).unwrap(), opens);
        assert_eq!(Value::from(opens).type_name(), "time");
    }

    #[test]
    fn test_timestamp_from_text() {
        let parsed = NaiveDateTime::from_value(Value::from("2024-03-01 10:20:30")).unwrap();
        assert_eq!(Value::from(parsed).to_string(), "2024-03-01 10:20:30");
    }
}
