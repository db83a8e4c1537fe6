use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element types understood by the server, tagged with their wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Void,
    Bool,
    Char,
    Short,
    Int,
    Long,
    Date,
    Month,
    Time,
    Minute,
    Second,
    DateTime,
    Timestamp,
    NanoTime,
    NanoTimestamp,
    Float,
    Double,
    Symbol,
    String,
    Uuid,
    Any,
    DateHour,
    Blob,
}

/// Coarse type family used for schema compatibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Nothing,
    Logical,
    Integral,
    Floating,
    Temporal,
    Literal,
    Binary,
    Mixed,
    System,
}

/// Column type: either plain cells or an array vector of the element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Scalar(DataType),
    Array(DataType),
}

const ARRAY_OFFSET: i32 = 64;

impl DataType {
    pub fn code(self) -> i32 {
        match self {
            DataType::Void => 0,
            DataType::Bool => 1,
            DataType::Char => 2,
            DataType::Short => 3,
            DataType::Int => 4,
            DataType::Long => 5,
            DataType::Date => 6,
            DataType::Month => 7,
            DataType::Time => 8,
            DataType::Minute => 9,
            DataType::Second => 10,
            DataType::DateTime => 11,
            DataType::Timestamp => 12,
            DataType::NanoTime => 13,
            DataType::NanoTimestamp => 14,
            DataType::Float => 15,
            DataType::Double => 16,
            DataType::Symbol => 17,
            DataType::String => 18,
            DataType::Uuid => 19,
            DataType::Any => 25,
            DataType::DateHour => 28,
            DataType::Blob => 32,
        }
    }

    pub fn from_code(code: i32) -> Result<Self, ModelError> {
        let data_type = match code {
            0 => DataType::Void,
            1 => DataType::Bool,
            2 => DataType::Char,
            3 => DataType::Short,
            4 => DataType::Int,
            5 => DataType::Long,
            6 => DataType::Date,
            7 => DataType::Month,
            8 => DataType::Time,
            9 => DataType::Minute,
            10 => DataType::Second,
            11 => DataType::DateTime,
            12 => DataType::Timestamp,
            13 => DataType::NanoTime,
            14 => DataType::NanoTimestamp,
            15 => DataType::Float,
            16 => DataType::Double,
            17 => DataType::Symbol,
            18 => DataType::String,
            19 => DataType::Uuid,
            25 => DataType::Any,
            28 => DataType::DateHour,
            32 => DataType::Blob,
            other => return Err(ModelError::UnsupportedType(other)),
        };
        Ok(data_type)
    }

    pub fn name(self) -> &'static str {
        match self {
            DataType::Void => "VOID",
            DataType::Bool => "BOOL",
            DataType::Char => "CHAR",
            DataType::Short => "SHORT",
            DataType::Int => "INT",
            DataType::Long => "LONG",
            DataType::Date => "DATE",
            DataType::Month => "MONTH",
            DataType::Time => "TIME",
            DataType::Minute => "MINUTE",
            DataType::Second => "SECOND",
            DataType::DateTime => "DATETIME",
            DataType::Timestamp => "TIMESTAMP",
            DataType::NanoTime => "NANOTIME",
            DataType::NanoTimestamp => "NANOTIMESTAMP",
            DataType::Float => "FLOAT",
            DataType::Double => "DOUBLE",
            DataType::Symbol => "SYMBOL",
            DataType::String => "STRING",
            DataType::Uuid => "UUID",
            DataType::Any => "ANY",
            DataType::DateHour => "DATEHOUR",
            DataType::Blob => "BLOB",
        }
    }

    pub fn category(self) -> Category {
        match self {
            DataType::Void => Category::Nothing,
            DataType::Bool => Category::Logical,
            DataType::Char | DataType::Short | DataType::Int | DataType::Long => {
                Category::Integral
            }
            DataType::Float | DataType::Double => Category::Floating,
            DataType::Date
            | DataType::Month
            | DataType::Time
            | DataType::Minute
            | DataType::Second
            | DataType::DateTime
            | DataType::Timestamp
            | DataType::NanoTime
            | DataType::NanoTimestamp
            | DataType::DateHour => Category::Temporal,
            DataType::Symbol | DataType::String => Category::Literal,
            DataType::Uuid => Category::Binary,
            DataType::Any => Category::Mixed,
            DataType::Blob => Category::System,
        }
    }

    pub fn is_temporal(self) -> bool {
        self.category() == Category::Temporal
    }

    /// Temporal types whose value is anchored to a calendar date.
    pub fn has_date(self) -> bool {
        matches!(
            self,
            DataType::Date
                | DataType::Month
                | DataType::DateTime
                | DataType::Timestamp
                | DataType::NanoTimestamp
                | DataType::DateHour
        )
    }

    /// Temporal types that carry a time of day.
    pub fn has_time(self) -> bool {
        matches!(
            self,
            DataType::Time
                | DataType::Minute
                | DataType::Second
                | DataType::NanoTime
                | DataType::DateTime
                | DataType::Timestamp
                | DataType::NanoTimestamp
                | DataType::DateHour
        )
    }
}

impl ColumnType {
    pub fn from_code(code: i32) -> Result<Self, ModelError> {
        match code {
            c if !(0..2 * ARRAY_OFFSET).contains(&c) => Err(ModelError::UnsupportedType(c)),
            c if c >= ARRAY_OFFSET => Ok(ColumnType::Array(DataType::from_code(c - ARRAY_OFFSET)?)),
            c => Ok(ColumnType::Scalar(DataType::from_code(c)?)),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            ColumnType::Scalar(t) => t.code(),
            ColumnType::Array(t) => t.code() + ARRAY_OFFSET,
        }
    }

    pub fn element(self) -> DataType {
        match self {
            ColumnType::Scalar(t) | ColumnType::Array(t) => t,
        }
    }

    pub fn is_array(self) -> bool {
        matches!(self, ColumnType::Array(_))
    }

    pub fn category(self) -> Category {
        self.element().category()
    }
}

impl From<DataType> for ColumnType {
    fn from(data_type: DataType) -> Self {
        ColumnType::Scalar(data_type)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Scalar(t) => write!(f, "{t}"),
            ColumnType::Array(t) => write!(f, "{t}[]"),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Nothing => "NOTHING",
            Category::Logical => "LOGICAL",
            Category::Integral => "INTEGRAL",
            Category::Floating => "FLOATING",
            Category::Temporal => "TEMPORAL",
            Category::Literal => "LITERAL",
            Category::Binary => "BINARY",
            Category::Mixed => "MIXED",
            Category::System => "SYSTEM",
        };
        f.write_str(name)
    }
}
