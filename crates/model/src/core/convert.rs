use crate::{
    core::{
        data_type::{ColumnType, DataType},
        temporal,
        value::Value,
    },
    error::ModelError,
    records::vector::Vector,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

/// Host-side value handed to row inserts before it is packed into a column's
/// type with [`Value::pack`].
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    List(Vec<RawValue>),
    Typed(Value),
}

impl RawValue {
    fn describe(&self) -> String {
        match self {
            RawValue::Null => "NULL".to_string(),
            RawValue::Bool(v) => format!("bool {v}"),
            RawValue::Int(v) => format!("integer {v}"),
            RawValue::Float(v) => format!("float {v}"),
            RawValue::Str(v) => format!("string {v:?}"),
            RawValue::Bytes(v) => format!("{} bytes", v.len()),
            RawValue::Uuid(v) => format!("uuid {v}"),
            RawValue::Date(v) => format!("date {v}"),
            RawValue::DateTime(v) => format!("datetime {v}"),
            RawValue::Time(v) => format!("time {v}"),
            RawValue::List(v) => format!("list of {} values", v.len()),
            RawValue::Typed(v) => format!("{} {v}", v.type_name()),
        }
    }
}

impl Value {
    /// Converts a host value into a cell of `column_type`.
    ///
    /// Array columns produce a nested vector cell: a list packs element-wise,
    /// a single value becomes a one-element vector and null becomes a
    /// one-element vector holding null.
    pub fn pack(column_type: ColumnType, raw: RawValue) -> Result<Value, ModelError> {
        match column_type {
            ColumnType::Scalar(data_type) => pack_scalar(data_type, raw),
            ColumnType::Array(element) => {
                let cells = match raw {
                    RawValue::Typed(Value::Vector(vector)) => {
                        if vector.column_type() != ColumnType::Scalar(element) {
                            return Err(ModelError::TypeMismatch {
                                expected: element.to_string(),
                                actual: vector.column_type().to_string(),
                            });
                        }
                        return Ok(Value::Vector(vector));
                    }
                    RawValue::List(items) => items
                        .into_iter()
                        .map(|item| pack_scalar(element, item))
                        .collect::<Result<Vec<_>, _>>()?,
                    other => vec![pack_scalar(element, other)?],
                };
                let vector = Vector::from_values(ColumnType::Scalar(element), cells)?;
                Ok(Value::Vector(Box::new(vector)))
            }
        }
    }
}

fn pack_scalar(data_type: DataType, raw: RawValue) -> Result<Value, ModelError> {
    let conversion_error = |raw: &RawValue| ModelError::Conversion {
        value: raw.describe(),
        target: data_type.to_string(),
    };

    let value = match (data_type, raw) {
        (_, RawValue::Null) | (_, RawValue::Typed(Value::Null)) => Value::Null,
        (DataType::Any, RawValue::Typed(value)) => value,
        (_, RawValue::Typed(value)) => {
            return match value.data_type() {
                Some(actual) if actual == data_type => Ok(value),
                Some(actual) if actual.is_temporal() && data_type.is_temporal() => {
                    Err(ModelError::TypeMismatch {
                        expected: data_type.to_string(),
                        actual: actual.to_string(),
                    })
                }
                _ => Err(conversion_error(&RawValue::Typed(value))),
            };
        }
        (DataType::Bool, RawValue::Bool(v)) => Value::Bool(v),
        (DataType::Char, RawValue::Int(v)) => Value::Char(narrow(v, data_type)?),
        (DataType::Short, RawValue::Int(v)) => Value::Short(narrow(v, data_type)?),
        (DataType::Int, RawValue::Int(v)) => Value::Int(narrow(v, data_type)?),
        (DataType::Long, RawValue::Int(v)) => Value::Long(v),
        (DataType::Float, RawValue::Float(v)) => Value::Float(v as f32),
        (DataType::Double, RawValue::Float(v)) => Value::Double(v),
        (DataType::Symbol, RawValue::Str(v)) => Value::Symbol(v),
        (DataType::String, RawValue::Str(v)) => Value::String(v),
        (DataType::Blob, RawValue::Str(v)) => Value::Blob(v.into_bytes()),
        (DataType::Blob, RawValue::Bytes(v)) => Value::Blob(v),
        (DataType::Uuid, RawValue::Uuid(v)) => Value::Uuid(v),
        (DataType::Uuid, RawValue::Str(v)) => match Uuid::parse_str(&v) {
            Ok(uuid) => Value::Uuid(uuid),
            Err(_) => return Err(conversion_error(&RawValue::Str(v))),
        },
        (t, RawValue::Date(v)) if t.has_date() => encode(t, temporal::from_date(v))?,
        (t, RawValue::DateTime(v)) if t.is_temporal() => encode(t, temporal::from_datetime(v))?,
        (t, RawValue::Time(v)) if t.is_temporal() && !t.has_date() => {
            encode(t, temporal::from_time(v))?
        }
        (_, other) => return Err(conversion_error(&other)),
    };
    Ok(value)
}

fn encode(target: DataType, axis: temporal::Axis) -> Result<Value, ModelError> {
    temporal::encode(target, axis).ok_or_else(|| ModelError::OutOfRange {
        value: format!("{axis:?}"),
        target: target.to_string(),
    })
}

fn narrow<T: TryFrom<i64>>(value: i64, target: DataType) -> Result<T, ModelError> {
    T::try_from(value).map_err(|_| ModelError::OutOfRange {
        value: value.to_string(),
        target: target.to_string(),
    })
}

macro_rules! impl_from_raw {
    ($variant:ident: $($t:ty),+ => $conv:expr) => {
        $(impl From<$t> for RawValue {
            fn from(v: $t) -> Self {
                RawValue::$variant($conv(v))
            }
        })+
    };
}

impl_from_raw!(Bool: bool => |v| v);
impl_from_raw!(Int: i8, i16, i32, i64, u16, u32 => |v| v as i64);
impl_from_raw!(Float: f32, f64 => |v| v as f64);
impl_from_raw!(Str: String => |v| v);
impl_from_raw!(Str: &str => |v: &str| v.to_string());
impl_from_raw!(Bytes: Vec<u8> => |v| v);
impl_from_raw!(Uuid: Uuid => |v| v);
impl_from_raw!(Date: NaiveDate => |v| v);
impl_from_raw!(DateTime: NaiveDateTime => |v| v);
impl_from_raw!(DateTime: DateTime<Utc> => |v: DateTime<Utc>| v.naive_utc());
impl_from_raw!(Time: NaiveTime => |v| v);
impl_from_raw!(Typed: Value => |v| v);

macro_rules! impl_from_list {
    ($($t:ty),+) => {
        $(impl From<Vec<$t>> for RawValue {
            fn from(items: Vec<$t>) -> Self {
                RawValue::List(items.into_iter().map(RawValue::from).collect())
            }
        })+
    };
}

impl_from_list!(bool, i16, i32, i64, f32, f64, String, &str, RawValue);

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(RawValue::Null, Into::into)
    }
}
