use crate::core::value::Value;

/// One packed row, in target column order.
pub type Row = Vec<Value>;
