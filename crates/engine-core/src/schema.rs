//! Table descriptions as returned by the server's `schema()` function.

use crate::error::SchemaError;
use model::{ColumnType, DataForm, Dictionary, Value};
use partition::{Domain, PartitionType, composite::CompositeDomain};

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartitionLevel {
    pub column: String,
    pub column_index: usize,
    pub partition_type: PartitionType,
    pub schema: DataForm,
}

/// Partition metadata: one level, or several for composite partitioning.
#[derive(Debug, Clone, PartialEq)]
pub enum PartitionLayout {
    Single(PartitionLevel),
    Composite(Vec<PartitionLevel>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub columns: Vec<ColumnDef>,
    pub partition: Option<PartitionLayout>,
}

/// `schema(t)` for in-memory tables, `schema(loadTable("db", "t"))` otherwise.
pub fn schema_script(database: Option<&str>, table: &str) -> String {
    match database {
        Some(db) => format!("schema(loadTable(\"{db}\", \"{table}\"))"),
        None => format!("schema({table})"),
    }
}

impl TableSchema {
    pub fn from_form(form: &DataForm) -> Result<Self, SchemaError> {
        let dict = form.as_dictionary()?;
        let col_defs = dict.get("colDefs")?.as_table()?;

        let names = col_defs
            .column_by_name("name")
            .ok_or_else(|| SchemaError::Malformed("colDefs has no name column".to_string()))?
            .strings()?;
        let codes = col_defs
            .column_by_name("typeInt")
            .ok_or_else(|| SchemaError::Malformed("colDefs has no typeInt column".to_string()))?
            .integers()?;

        let columns = names
            .into_iter()
            .zip(codes)
            .map(|(name, code)| {
                let column_type = ColumnType::from_code(code as i32)?;
                Ok(ColumnDef { name, column_type })
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;

        let partition = parse_layout(dict)?;
        Ok(TableSchema { columns, partition })
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_types(&self) -> Vec<ColumnType> {
        self.columns.iter().map(|c| c.column_type).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn is_partitioned(&self) -> bool {
        self.partition.is_some()
    }

    /// Domain of the partition level at `level`; composite layouts wrap it
    /// with the level it was selected from.
    pub fn partition_domain(&self, level: usize) -> Result<Domain, SchemaError> {
        let layout = self
            .partition
            .as_ref()
            .ok_or_else(|| SchemaError::Malformed("table is not partitioned".to_string()))?;
        let entry = layout
            .levels()
            .get(level)
            .ok_or_else(|| SchemaError::Malformed(format!("no partition level {level}")))?;
        let column = self.columns.get(entry.column_index).ok_or_else(|| {
            SchemaError::Malformed(format!(
                "partition column index {} out of range",
                entry.column_index
            ))
        })?;

        let domain = Domain::create(
            entry.partition_type,
            column.column_type.element(),
            &entry.schema,
        )?;

        Ok(match layout {
            PartitionLayout::Single(_) => domain,
            PartitionLayout::Composite(_) => {
                Domain::Composite(CompositeDomain::new(level, &entry.column, domain))
            }
        })
    }
}

impl PartitionLayout {
    pub fn levels(&self) -> &[PartitionLevel] {
        match self {
            PartitionLayout::Single(level) => std::slice::from_ref(level),
            PartitionLayout::Composite(levels) => levels,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, PartitionLayout::Composite(_))
    }
}

fn parse_layout(dict: &Dictionary) -> Result<Option<PartitionLayout>, SchemaError> {
    if !dict.contains_key("partitionColumnName") {
        return Ok(None);
    }

    let layout = match dict.get("partitionColumnName")? {
        DataForm::Scalar(Value::Null) | DataForm::Void => return Ok(None),
        DataForm::Scalar(name) => {
            let column = name
                .as_str()
                .ok_or_else(|| SchemaError::Malformed("partitionColumnName".to_string()))?
                .to_string();
            let column_index = scalar_int(dict, "partitionColumnIndex")?;
            let partition_type =
                PartitionType::try_from(scalar_int(dict, "partitionType")? as i32)?;
            PartitionLayout::Single(PartitionLevel {
                column,
                column_index: index(column_index)?,
                partition_type,
                schema: dict.get("partitionSchema")?.clone(),
            })
        }
        DataForm::Vector(names) => {
            let names = names.strings()?;
            let indices = dict.get("partitionColumnIndex")?.as_vector()?.integers()?;
            let types = dict.get("partitionType")?.as_vector()?.integers()?;
            let schemas = dict.get("partitionSchema")?.as_vector()?;

            if indices.len() != names.len()
                || types.len() != names.len()
                || schemas.len() != names.len()
            {
                return Err(SchemaError::Malformed(
                    "partition metadata vectors differ in length".to_string(),
                ));
            }

            let levels = names
                .into_iter()
                .zip(indices)
                .zip(types)
                .zip(schemas.iter())
                .map(|(((column, column_index), code), schema)| {
                    Ok(PartitionLevel {
                        column,
                        column_index: index(column_index)?,
                        partition_type: PartitionType::try_from(code as i32)?,
                        schema: DataForm::from_value(schema.clone()),
                    })
                })
                .collect::<Result<Vec<_>, SchemaError>>()?;
            PartitionLayout::Composite(levels)
        }
        other => {
            return Err(SchemaError::Malformed(format!(
                "partitionColumnName is a {}",
                other.kind()
            )));
        }
    };

    Ok(Some(layout))
}

fn scalar_int(dict: &Dictionary, key: &str) -> Result<i64, SchemaError> {
    dict.get(key)?
        .as_scalar()?
        .as_i64()
        .ok_or_else(|| SchemaError::Malformed(format!("{key} is not an integer")))
}

fn index(value: i64) -> Result<usize, SchemaError> {
    usize::try_from(value).map_err(|_| SchemaError::Malformed(format!("negative index {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::{
        Connection, Dialer,
        memory::{MemoryCluster, TableDefinition},
    };
    use model::{DataType, Vector};
    use partition::PartitionDomain;

    fn symbols(values: &[&str]) -> DataForm {
        DataForm::Vector(
            Vector::from_values(
                ColumnType::Scalar(DataType::Symbol),
                values.iter().map(|s| Value::Symbol(s.to_string())).collect(),
            )
            .unwrap(),
        )
    }

    async fn fetch(cluster: &MemoryCluster, script: &str) -> TableSchema {
        let mut conn = cluster.dialer().dial("localhost:8848").await.unwrap();
        TableSchema::from_form(&conn.run_script(script).await.unwrap()).unwrap()
    }

    fn columns() -> TableDefinition {
        TableDefinition::new([
            ("date", ColumnType::Scalar(DataType::Date)),
            ("sym", ColumnType::Scalar(DataType::Symbol)),
            ("prices", ColumnType::Array(DataType::Double)),
        ])
    }

    #[test]
    fn test_schema_script() {
        assert_eq!(schema_script(None, "trades"), "schema(trades)");
        assert_eq!(
            schema_script(Some("dfs://db"), "trades"),
            "schema(loadTable(\"dfs://db\", \"trades\"))"
        );
    }

    #[tokio::test]
    async fn test_plain_table() {
        let cluster = MemoryCluster::new();
        cluster.create_table(None, "t", columns()).unwrap();

        let schema = fetch(&cluster, "schema(t)").await;
        assert_eq!(schema.column_names(), vec!["date", "sym", "prices"]);
        assert_eq!(schema.columns[2].column_type, ColumnType::Array(DataType::Double));
        assert!(!schema.is_partitioned());
        assert_eq!(schema.column_index("sym"), Some(1));
    }

    #[tokio::test]
    async fn test_single_level_partition() {
        let cluster = MemoryCluster::new();
        cluster
            .create_table(
                Some("dfs://db"),
                "pt",
                columns().partitioned_by("sym", PartitionType::Value, symbols(&["A", "B"])),
            )
            .unwrap();

        let schema = fetch(&cluster, &schema_script(Some("dfs://db"), "pt")).await;
        let Some(PartitionLayout::Single(level)) = &schema.partition else {
            panic!("expected a single partition level");
        };
        assert_eq!(level.column, "sym");
        assert_eq!(level.column_index, 1);
        assert_eq!(level.partition_type, PartitionType::Value);

        let domain = schema.partition_domain(0).unwrap();
        assert_eq!(domain.partition_type(), PartitionType::Value);
    }

    #[tokio::test]
    async fn test_composite_partition() {
        let cluster = MemoryCluster::new();
        cluster
            .create_table(
                Some("dfs://db"),
                "pt",
                columns()
                    .partitioned_by(
                        "date",
                        PartitionType::Value,
                        DataForm::Vector(
                            Vector::from_values(
                                ColumnType::Scalar(DataType::Date),
                                vec![Value::Date(19_723)],
                            )
                            .unwrap(),
                        ),
                    )
                    .partitioned_by(
                        "sym",
                        PartitionType::Hash,
                        DataForm::Scalar(Value::Int(4)),
                    ),
            )
            .unwrap();

        let schema = fetch(&cluster, &schema_script(Some("dfs://db"), "pt")).await;
        let layout = schema.partition.as_ref().unwrap();
        assert!(layout.is_composite());
        assert_eq!(layout.levels()[1].schema, DataForm::Scalar(Value::Int(4)));

        let Domain::Composite(domain) = schema.partition_domain(1).unwrap() else {
            panic!("expected a composite domain");
        };
        assert_eq!(domain.column(), "sym");
        let column = Vector::from_values(
            ColumnType::Scalar(DataType::Symbol),
            vec![Value::Symbol("A".into())],
        )
        .unwrap();
        assert_eq!(domain.partition_keys(&column).unwrap(), vec![1]);
    }

    #[test]
    fn test_missing_col_defs() {
        let err = TableSchema::from_form(&DataForm::Dictionary(Dictionary::new())).unwrap_err();
        assert_eq!(err.to_string(), "invalid key colDefs");
    }
}
