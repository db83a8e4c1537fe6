use crate::{core::value::Value, error::ModelError, records::vector::Vector};
use serde::{Deserialize, Serialize};

/// Named columns of equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Vector>,
}

impl Table {
    pub fn new(names: Vec<String>, columns: Vec<Vector>) -> Result<Self, ModelError> {
        if names.len() != columns.len() {
            return Err(ModelError::ColumnCount {
                names: names.len(),
                columns: columns.len(),
            });
        }

        if let Some(first) = columns.first() {
            let expected = first.len();
            for (name, column) in names.iter().zip(&columns) {
                if column.len() != expected {
                    return Err(ModelError::LengthMismatch {
                        column: name.clone(),
                        expected,
                        actual: column.len(),
                    });
                }
            }
        }

        Ok(Table { names, columns })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn columns(&self) -> &[Vector] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Vector> {
        self.columns.get(index)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Vector> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.columns.get(i))
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn rows(&self) -> usize {
        self.columns.first().map_or(0, Vector::len)
    }

    pub fn row(&self, index: usize) -> Option<Vec<Value>> {
        self.columns
            .iter()
            .map(|c| c.get(index).cloned())
            .collect()
    }

    /// Rows at `indices` as a new table with the same columns.
    pub fn subtable(&self, indices: &[usize]) -> Table {
        Table {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.select(indices)).collect(),
        }
    }

    /// Appends all rows of `other`, which must have the same column layout.
    pub fn append(&mut self, other: &Table) -> Result<(), ModelError> {
        if other.column_count() != self.column_count() {
            return Err(ModelError::ColumnCount {
                names: self.column_count(),
                columns: other.column_count(),
            });
        }
        for (column, incoming) in self.columns.iter_mut().zip(other.columns()) {
            column.append(incoming)?;
        }
        Ok(())
    }
}
