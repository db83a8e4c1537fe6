use crate::{
    core::value::Value,
    error::ModelError,
    records::{table::Table, vector::Vector},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result and argument envelope of a server call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataForm {
    Void,
    Scalar(Value),
    Vector(Vector),
    Table(Table),
    Dictionary(Dictionary),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dictionary {
    entries: BTreeMap<String, DataForm>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: DataForm) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Result<&DataForm, ModelError> {
        self.entries
            .get(key)
            .ok_or_else(|| ModelError::MissingKey(key.to_string()))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl DataForm {
    pub fn kind(&self) -> &'static str {
        match self {
            DataForm::Void => "void",
            DataForm::Scalar(_) => "scalar",
            DataForm::Vector(_) => "vector",
            DataForm::Table(_) => "table",
            DataForm::Dictionary(_) => "dictionary",
        }
    }

    pub fn as_scalar(&self) -> Result<&Value, ModelError> {
        match self {
            DataForm::Scalar(v) => Ok(v),
            other => Err(other.unexpected("scalar")),
        }
    }

    pub fn as_vector(&self) -> Result<&Vector, ModelError> {
        match self {
            DataForm::Vector(v) => Ok(v),
            other => Err(other.unexpected("vector")),
        }
    }

    pub fn as_table(&self) -> Result<&Table, ModelError> {
        match self {
            DataForm::Table(t) => Ok(t),
            other => Err(other.unexpected("table")),
        }
    }

    pub fn as_dictionary(&self) -> Result<&Dictionary, ModelError> {
        match self {
            DataForm::Dictionary(d) => Ok(d),
            other => Err(other.unexpected("dictionary")),
        }
    }

    /// Scalars and nested vectors become a single cell.
    pub fn into_value(self) -> Result<Value, ModelError> {
        match self {
            DataForm::Scalar(v) => Ok(v),
            DataForm::Vector(v) => Ok(Value::Vector(Box::new(v))),
            other => Err(other.unexpected("scalar or vector")),
        }
    }

    /// Inverse of [`DataForm::into_value`].
    pub fn from_value(value: Value) -> DataForm {
        match value {
            Value::Vector(v) => DataForm::Vector(*v),
            other => DataForm::Scalar(other),
        }
    }

    fn unexpected(&self, expected: &'static str) -> ModelError {
        ModelError::UnexpectedForm {
            expected,
            actual: self.kind(),
        }
    }
}

impl From<Table> for DataForm {
    fn from(table: Table) -> Self {
        DataForm::Table(table)
    }
}

impl From<Vector> for DataForm {
    fn from(vector: Vector) -> Self {
        DataForm::Vector(vector)
    }
}

impl From<Value> for DataForm {
    fn from(value: Value) -> Self {
        DataForm::from_value(value)
    }
}
