use crate::{
    core::{data_type::DataType, temporal},
    error::ModelError,
    records::vector::Vector,
};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};
use uuid::Uuid;

/// A single typed cell. Temporal variants hold the server's integer encoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Char(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Date(i32),
    Month(i32),
    Time(i32),
    Minute(i32),
    Second(i32),
    DateTime(i32),
    Timestamp(i64),
    NanoTime(i64),
    NanoTimestamp(i64),
    DateHour(i32),
    Float(f32),
    Double(f64),
    Symbol(String),
    String(String),
    Uuid(Uuid),
    Blob(Vec<u8>),
    /// Nested vector: one cell of an array vector, or an element of a tuple.
    Vector(Box<Vector>),
}

impl Value {
    /// `None` for null; `Any` for nested vectors.
    pub fn data_type(&self) -> Option<DataType> {
        let data_type = match self {
            Value::Null => return None,
            Value::Bool(_) => DataType::Bool,
            Value::Char(_) => DataType::Char,
            Value::Short(_) => DataType::Short,
            Value::Int(_) => DataType::Int,
            Value::Long(_) => DataType::Long,
            Value::Date(_) => DataType::Date,
            Value::Month(_) => DataType::Month,
            Value::Time(_) => DataType::Time,
            Value::Minute(_) => DataType::Minute,
            Value::Second(_) => DataType::Second,
            Value::DateTime(_) => DataType::DateTime,
            Value::Timestamp(_) => DataType::Timestamp,
            Value::NanoTime(_) => DataType::NanoTime,
            Value::NanoTimestamp(_) => DataType::NanoTimestamp,
            Value::DateHour(_) => DataType::DateHour,
            Value::Float(_) => DataType::Float,
            Value::Double(_) => DataType::Double,
            Value::Symbol(_) => DataType::Symbol,
            Value::String(_) => DataType::String,
            Value::Uuid(_) => DataType::Uuid,
            Value::Blob(_) => DataType::Blob,
            Value::Vector(_) => DataType::Any,
        };
        Some(data_type)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        self.data_type().map_or("NULL", DataType::name)
    }

    /// Integral and temporal cells widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Char(v) => Some(v as i64),
            Value::Short(v) => Some(v as i64),
            Value::Int(v)
            | Value::Date(v)
            | Value::Month(v)
            | Value::Time(v)
            | Value::Minute(v)
            | Value::Second(v)
            | Value::DateTime(v)
            | Value::DateHour(v) => Some(v as i64),
            Value::Long(v)
            | Value::Timestamp(v)
            | Value::NanoTime(v)
            | Value::NanoTimestamp(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Symbol(v) | Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&Vector> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Orders cells of the same category; null sorts first.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        use Value::*;
        match (self, other) {
            (Null, Null) => Some(Ordering::Equal),
            (Null, _) => Some(Ordering::Less),
            (_, Null) => Some(Ordering::Greater),
            (Bool(a), Bool(b)) => Some(a.cmp(b)),
            (Symbol(a) | String(a), Symbol(b) | String(b)) => Some(a.cmp(b)),
            (Uuid(a), Uuid(b)) => Some(a.cmp(b)),
            (Blob(a), Blob(b)) => Some(a.cmp(b)),
            (Float(_) | Double(_), _) | (_, Float(_) | Double(_)) => {
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            _ => match (self.data_type()?, other.data_type()?) {
                (a, b) if a.is_temporal() != b.is_temporal() => None,
                _ => Some(self.as_i64()?.cmp(&other.as_i64()?)),
            },
        }
    }

    pub fn cast_temporal(&self, target: DataType) -> Result<Value, ModelError> {
        temporal::cast(self, target)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "{v}"),
            Value::Short(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Symbol(v) | Value::String(v) => f.write_str(v),
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Blob(v) => f.write_str(&std::string::String::from_utf8_lossy(v)),
            Value::Vector(v) => write!(f, "{v}"),
            temporal_value => {
                let text = temporal::axis_of(temporal_value).and_then(|axis| {
                    temporal_value
                        .data_type()
                        .and_then(|t| temporal::format(t, axis))
                });
                match text {
                    Some(text) => f.write_str(&text),
                    None => write!(f, "{}", temporal_value.as_i64().unwrap_or_default()),
                }
            }
        }
    }
}
