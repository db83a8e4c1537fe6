use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("unsupported data type code {0}")]
    UnsupportedType(i32),

    #[error("cannot convert {value} to {target}")]
    Conversion { value: String, target: String },

    #[error("value {value} is out of range for {target}")]
    OutOfRange { value: String, target: String },

    #[error("the type of the input is {actual}, expect {expected}")]
    TypeMismatch { expected: String, actual: String },

    #[error("can't convert type from {from} to {to}")]
    TemporalCast { from: String, to: String },

    #[error("column {column} has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("{names} column names for {columns} columns")]
    ColumnCount { names: usize, columns: usize },

    #[error("invalid key {0}")]
    MissingKey(String),

    #[error("expect {expected} form, got {actual}")]
    UnexpectedForm {
        expected: &'static str,
        actual: &'static str,
    },
}
