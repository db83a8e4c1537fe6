use model::{ColumnType, ModelError, Row, Table, Value, Vector};

/// Builds a column-oriented table from queued rows. Any cell that does not
/// fit its column fails the whole batch.
pub(crate) fn build_batch(
    names: &[String],
    types: &[ColumnType],
    rows: &[Row],
) -> Result<Table, ModelError> {
    if let Some(row) = rows.iter().find(|r| r.len() != types.len()) {
        return Err(ModelError::ColumnCount {
            names: types.len(),
            columns: row.len(),
        });
    }

    let columns = types
        .iter()
        .enumerate()
        .map(|(index, column_type)| match column_type {
            ColumnType::Scalar(_) => {
                let mut column = Vector::with_capacity(*column_type, rows.len());
                for row in rows {
                    column.push(row[index].clone())?;
                }
                Ok(column)
            }
            ColumnType::Array(element) => {
                let nested = rows
                    .iter()
                    .map(|row| match &row[index] {
                        Value::Vector(cell)
                            if cell.column_type() == ColumnType::Scalar(*element) =>
                        {
                            Ok((**cell).clone())
                        }
                        Value::Null => {
                            Vector::from_values(ColumnType::Scalar(*element), vec![Value::Null])
                        }
                        other => Err(ModelError::TypeMismatch {
                            expected: column_type.to_string(),
                            actual: other.type_name().to_string(),
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Vector::array(*element, nested)
            }
        })
        .collect::<Result<Vec<_>, ModelError>>()?;

    Table::new(names.to_vec(), columns)
}
