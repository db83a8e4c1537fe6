use crate::{
    core::data_type::{ColumnType, DataType},
    core::value::Value,
    error::ModelError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed column of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    column_type: ColumnType,
    values: Vec<Value>,
}

impl Vector {
    pub fn new(column_type: ColumnType) -> Self {
        Self::with_capacity(column_type, 0)
    }

    pub fn with_capacity(column_type: ColumnType, capacity: usize) -> Self {
        Vector {
            column_type,
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn from_values(column_type: ColumnType, values: Vec<Value>) -> Result<Self, ModelError> {
        let mut vector = Self::with_capacity(column_type, values.len());
        for value in values {
            vector.push(value)?;
        }
        Ok(vector)
    }

    /// Builds an array vector from one nested vector per row.
    pub fn array(element: DataType, rows: Vec<Vector>) -> Result<Self, ModelError> {
        let values = rows.into_iter().map(|row| Value::Vector(Box::new(row))).collect();
        Self::from_values(ColumnType::Array(element), values)
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn data_type(&self) -> DataType {
        self.column_type.element()
    }

    /// Element type of a tuple (`ANY`) vector is taken from its first cell.
    pub fn real_data_type(&self) -> DataType {
        match self.column_type {
            ColumnType::Scalar(DataType::Any) => self
                .values
                .iter()
                .find_map(|v| match v {
                    Value::Vector(inner) => Some(inner.data_type()),
                    other => other.data_type(),
                })
                .unwrap_or(DataType::Any),
            other => other.element(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// Null is accepted by every column.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self.column_type, value) {
            (_, Value::Null) => true,
            (ColumnType::Scalar(DataType::Any), _) => true,
            (ColumnType::Array(element), Value::Vector(inner)) => {
                inner.column_type() == ColumnType::Scalar(element)
            }
            (ColumnType::Array(_), _) => false,
            (ColumnType::Scalar(t), v) => v.data_type() == Some(t),
        }
    }

    pub fn push(&mut self, value: Value) -> Result<(), ModelError> {
        self.check(&value)?;
        self.values.push(value);
        Ok(())
    }

    pub fn set(&mut self, index: usize, value: Value) -> Result<(), ModelError> {
        self.check(&value)?;
        let len = self.values.len();
        let slot = self.values.get_mut(index).ok_or(ModelError::LengthMismatch {
            column: self.column_type.to_string(),
            expected: index + 1,
            actual: len,
        })?;
        *slot = value;
        Ok(())
    }

    pub fn append(&mut self, other: &Vector) -> Result<(), ModelError> {
        for value in other.iter() {
            self.push(value.clone())?;
        }
        Ok(())
    }

    /// Rows at `indices`, in the given order.
    pub fn select(&self, indices: &[usize]) -> Vector {
        Vector {
            column_type: self.column_type,
            values: indices
                .iter()
                .filter_map(|&i| self.values.get(i).cloned())
                .collect(),
        }
    }

    pub fn cast_temporal(&self, target: DataType) -> Result<Vector, ModelError> {
        let values = self
            .values
            .iter()
            .map(|v| v.cast_temporal(target))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Vector {
            column_type: ColumnType::Scalar(target),
            values,
        })
    }

    /// Every cell as text; fails on non-literal cells.
    pub fn strings(&self) -> Result<Vec<String>, ModelError> {
        self.values
            .iter()
            .map(|v| {
                v.as_str().map(str::to_string).ok_or_else(|| ModelError::TypeMismatch {
                    expected: DataType::String.to_string(),
                    actual: v.type_name().to_string(),
                })
            })
            .collect()
    }

    /// Every cell as an integer; fails on non-integral cells.
    pub fn integers(&self) -> Result<Vec<i64>, ModelError> {
        self.values
            .iter()
            .map(|v| {
                v.as_i64().ok_or_else(|| ModelError::TypeMismatch {
                    expected: DataType::Long.to_string(),
                    actual: v.type_name().to_string(),
                })
            })
            .collect()
    }

    fn check(&self, value: &Value) -> Result<(), ModelError> {
        if self.accepts(value) {
            return Ok(());
        }
        let actual = match value {
            Value::Vector(inner) => format!("{}[]", inner.data_type()),
            other => other.type_name().to_string(),
        };
        Err(ModelError::TypeMismatch {
            expected: self.column_type.to_string(),
            actual,
        })
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_rejects_foreign_types() {
        let mut v = Vector::new(ColumnType::Scalar(DataType::Int));
        v.push(Value::Int(1)).unwrap();
        v.push(Value::Null).unwrap();
        let err = v.push(Value::Double(1.0)).unwrap_err();
        assert_eq!(err.to_string(), "the type of the input is DOUBLE, expect INT");
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn test_array_vector_accepts_matching_cells_only() {
        let ints =
            Vector::from_values(ColumnType::Scalar(DataType::Int), vec![Value::Int(1)]).unwrap();
        let doubles =
            Vector::from_values(ColumnType::Scalar(DataType::Double), vec![Value::Double(1.0)])
                .unwrap();

        let array = Vector::array(DataType::Int, vec![ints.clone(), ints]).unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array.column_type(), ColumnType::Array(DataType::Int));

        let err = Vector::array(DataType::Int, vec![doubles]).unwrap_err();
        assert_eq!(err.to_string(), "the type of the input is DOUBLE[], expect INT[]");
    }

    #[test]
    fn test_select_keeps_requested_order() {
        let v = Vector::from_values(
            ColumnType::Scalar(DataType::Symbol),
            vec!["a", "b", "c"].into_iter().map(|s| Value::Symbol(s.into())).collect(),
        )
        .unwrap();
        assert_eq!(v.select(&[2, 0]).strings().unwrap(), vec!["c", "a"]);
    }

    #[test]
    fn test_real_data_type_of_tuple() {
        let tuple = Vector::from_values(
            ColumnType::Scalar(DataType::Any),
            vec![Value::Date(1), Value::Date(2)],
        )
        .unwrap();
        assert_eq!(tuple.real_data_type(), DataType::Date);
    }
}
