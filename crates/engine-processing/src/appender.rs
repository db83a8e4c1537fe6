use crate::error::AppendError;
use engine_config::AppenderOptions;
use engine_core::{
    ConnectionPool, Task,
    schema::{PartitionLayout, TableSchema, schema_script},
};
use model::{Category, ColumnType, DataForm, DataType, Table, Value, Vector};
use partition::{Domain, PartitionDomain};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Splits tables by partition and appends the pieces concurrently through a
/// [`ConnectionPool`], one task per pool connection.
pub struct PartitionedTableAppender {
    pool: Arc<ConnectionPool>,
    table_name: String,
    column_types: Vec<ColumnType>,
    partition_index: usize,
    domain: Domain,
    append_script: String,
}

impl PartitionedTableAppender {
    /// Reads the target's schema and resolves its partition column.
    pub async fn new(
        options: AppenderOptions,
        pool: Arc<ConnectionPool>,
    ) -> Result<Self, AppendError> {
        options.validate()?;

        let mut tasks = [Some(Task::new(schema_script(
            options.database(),
            &options.table_name,
        )))];
        pool.execute(&mut tasks).await?;
        let form = tasks[0]
            .as_mut()
            .and_then(Task::take_outcome)
            .ok_or_else(|| AppendError::UnexpectedResult("schema task did not run".to_string()))??;
        let schema = TableSchema::from_form(&form)?;

        let level = resolve_level(&schema, &options.partition_col)?;
        let partition_index = schema.partition.as_ref().map_or(0, |layout| {
            layout.levels()[level].column_index
        });
        let domain = schema.partition_domain(level)?;

        let append_script = match options.append_function.as_str() {
            "" => match options.database() {
                Some(db) => format!(
                    "tableInsert{{loadTable(\"{db}\", \"{}\")}}",
                    options.table_name
                ),
                None => format!("tableInsert{{{}}}", options.table_name),
            },
            custom => custom.to_string(),
        };

        info!(
            table = %options.table_name,
            partition_col = %options.partition_col,
            partition_type = %domain.partition_type(),
            pool_size = pool.pool_size(),
            "Partitioned table appender ready"
        );

        Ok(PartitionedTableAppender {
            pool,
            table_name: options.table_name,
            column_types: schema.column_types(),
            partition_index,
            domain,
            append_script,
        })
    }

    /// Appends `table`, returning the number of rows the server reported.
    ///
    /// Rows are grouped by `partition key % pool size`; rows matching no
    /// partition are skipped. When any group fails, its error is returned
    /// and the groups that did land stay written.
    pub async fn append(&self, table: &Table) -> Result<usize, AppendError> {
        if table.column_count() != self.column_types.len() {
            return Err(AppendError::SchemaMismatch);
        }
        let columns = table.columns().iter().zip(&self.column_types);
        for (index, (column, expected)) in columns.enumerate() {
            check_column(index, column, *expected)?;
        }

        let partition_column = table
            .column(self.partition_index)
            .ok_or(AppendError::SchemaMismatch)?;
        let keys = self.domain.partition_keys(partition_column)?;

        let buckets = self.pool.pool_size();
        let mut groups: Vec<Vec<usize>> = vec![Vec::new(); buckets];
        let mut dropped = 0usize;
        for (row, key) in keys.into_iter().enumerate() {
            match usize::try_from(key) {
                Ok(key) => groups[key % buckets].push(row),
                Err(_) => dropped += 1,
            }
        }
        if dropped > 0 {
            warn!(
                table = %self.table_name,
                dropped,
                "Rows match no partition and were skipped"
            );
        }

        let mut tasks: Vec<Option<Task>> = groups
            .iter()
            .map(|rows| {
                (!rows.is_empty()).then(|| {
                    Task::with_args(
                        self.append_script.clone(),
                        vec![DataForm::Table(table.subtable(rows))],
                    )
                })
            })
            .collect();
        debug!(
            table = %self.table_name,
            rows = table.rows(),
            tasks = tasks.iter().flatten().count(),
            "Appending partitioned table"
        );
        self.pool.execute(&mut tasks).await?;

        let mut affected = 0usize;
        for task in tasks.iter_mut().flatten() {
            match task.take_outcome() {
                Some(Ok(result)) => affected += rows_affected(&result)?,
                Some(Err(e)) => {
                    warn!(table = %self.table_name, error = %e, "Partition append failed");
                    return Err(e.into());
                }
                None => {
                    return Err(AppendError::UnexpectedResult(
                        "append task did not run".to_string(),
                    ));
                }
            }
        }
        Ok(affected)
    }

    /// Closes the underlying pool.
    pub async fn close(&self) -> Result<(), AppendError> {
        Ok(self.pool.close().await?)
    }

    pub fn column_types(&self) -> &[ColumnType] {
        &self.column_types
    }

    pub fn partition_column_index(&self) -> usize {
        self.partition_index
    }

    pub fn append_script(&self) -> &str {
        &self.append_script
    }
}

/// Index of the partition level named `column`: exact for single-level
/// tables, case-insensitive for composite ones.
fn resolve_level(schema: &TableSchema, column: &str) -> Result<usize, AppendError> {
    match &schema.partition {
        Some(PartitionLayout::Single(level)) if level.column == column => Ok(0),
        Some(PartitionLayout::Composite(levels)) => levels
            .iter()
            .position(|l| l.column.eq_ignore_ascii_case(column))
            .ok_or(AppendError::PartitionColumnNotFound),
        _ => Err(AppendError::PartitionColumnNotFound),
    }
}

fn check_column(index: usize, column: &Vector, expected: ColumnType) -> Result<(), AppendError> {
    let actual = match column.column_type() {
        ColumnType::Scalar(DataType::Any) => ColumnType::Scalar(column.real_data_type()),
        other => other,
    };

    if actual.category() != expected.category() {
        return Err(AppendError::CategoryMismatch {
            column: index,
            expected: expected.category(),
            actual: actual.category(),
        });
    }
    if actual.category() == Category::Temporal && actual != expected {
        return Err(AppendError::TemporalMismatch {
            column: index,
            expected,
            actual,
        });
    }
    Ok(())
}

fn rows_affected(result: &DataForm) -> Result<usize, AppendError> {
    match result {
        DataForm::Void | DataForm::Scalar(Value::Null) => Ok(0),
        DataForm::Scalar(value) => value
            .as_i64()
            .and_then(|rows| usize::try_from(rows).ok())
            .ok_or_else(|| AppendError::UnexpectedResult(value.to_string())),
        other => Err(AppendError::UnexpectedResult(other.kind().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::memory::{MemoryCluster, TableDefinition};
    use engine_config::PoolOptions;
    use partition::PartitionType;
    use tracing_test::traced_test;

    const DB: &str = "dfs://trades";

    fn symbols(values: &[&str]) -> Vector {
        Vector::from_values(
            ColumnType::Scalar(DataType::Symbol),
            values.iter().map(|s| Value::Symbol(s.to_string())).collect(),
        )
        .unwrap()
    }

    fn doubles(values: &[f64]) -> Vector {
        Vector::from_values(
            ColumnType::Scalar(DataType::Double),
            values.iter().map(|v| Value::Double(*v)).collect(),
        )
        .unwrap()
    }

    fn trades(syms: &[&str], prices: &[f64]) -> Table {
        Table::new(
            vec!["sym".into(), "price".into()],
            vec![symbols(syms), doubles(prices)],
        )
        .unwrap()
    }

    fn definition() -> TableDefinition {
        TableDefinition::new([
            ("sym", ColumnType::Scalar(DataType::Symbol)),
            ("price", ColumnType::Scalar(DataType::Double)),
        ])
    }

    async fn appender(cluster: &MemoryCluster, pool_size: usize) -> PartitionedTableAppender {
        let pool = ConnectionPool::connect(
            &PoolOptions::new("localhost:8848").with_pool_size(pool_size),
            &cluster.dialer(),
        )
        .await
        .unwrap();
        PartitionedTableAppender::new(
            AppenderOptions::new("pt", "sym").with_db_path(DB),
            Arc::new(pool),
        )
        .await
        .unwrap()
    }

    fn value_cluster() -> MemoryCluster {
        let cluster = MemoryCluster::new();
        cluster
            .create_table(
                Some(DB),
                "pt",
                definition().partitioned_by(
                    "sym",
                    PartitionType::Value,
                    DataForm::Vector(symbols(&["A", "B", "C"])),
                ),
            )
            .unwrap();
        cluster
    }

    #[tokio::test]
    async fn test_append_splits_by_partition() {
        let cluster = value_cluster();
        let appender = appender(&cluster, 3).await;
        assert_eq!(
            appender.append_script(),
            "tableInsert{loadTable(\"dfs://trades\", \"pt\")}"
        );

        let rows = appender
            .append(&trades(&["A", "B", "C", "A"], &[1.0, 2.0, 3.0, 4.0]))
            .await
            .unwrap();
        assert_eq!(rows, 4);

        let inserts = cluster
            .calls()
            .into_iter()
            .filter(|c| c.request.starts_with("tableInsert"))
            .count();
        assert_eq!(inserts, 3);
        assert_eq!(cluster.table(Some(DB), "pt").unwrap().rows(), 4);
    }

    #[tokio::test]
    async fn test_single_connection_sends_one_task() {
        let cluster = value_cluster();
        let appender = appender(&cluster, 1).await;

        let rows = appender
            .append(&trades(&["A", "B", "C"], &[1.0, 2.0, 3.0]))
            .await
            .unwrap();
        assert_eq!(rows, 3);
        let inserts = cluster
            .calls()
            .into_iter()
            .filter(|c| c.request.starts_with("tableInsert"))
            .count();
        assert_eq!(inserts, 1);
    }

    #[tokio::test]
    async fn test_schema_mismatch_makes_no_call() {
        let cluster = value_cluster();
        let appender = appender(&cluster, 2).await;
        let calls = cluster.calls().len();

        let narrow = Table::new(vec!["sym".into()], vec![symbols(&["A"])]).unwrap();
        let err = appender.append(&narrow).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "the input table doesn't match the schema of the target table"
        );

        let ints =
            Vector::from_values(ColumnType::Scalar(DataType::Int), vec![Value::Int(1)]).unwrap();
        let wrong = Table::new(vec!["sym".into(), "price".into()], vec![symbols(&["A"]), ints])
            .unwrap();
        let err = appender.append(&wrong).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "column 1, expect category FLOATING, got category INTEGRAL"
        );
        assert_eq!(cluster.calls().len(), calls);
    }

    #[tokio::test]
    async fn test_temporal_columns_need_exact_type() {
        let cluster = MemoryCluster::new();
        cluster
            .create_table(
                Some(DB),
                "pt",
                TableDefinition::new([
                    ("date", ColumnType::Scalar(DataType::Date)),
                    ("price", ColumnType::Scalar(DataType::Double)),
                ])
                .partitioned_by(
                    "date",
                    PartitionType::Range,
                    DataForm::Vector(
                        Vector::from_values(
                            ColumnType::Scalar(DataType::Date),
                            vec![Value::Date(0), Value::Date(10), Value::Date(20)],
                        )
                        .unwrap(),
                    ),
                ),
            )
            .unwrap();
        let pool = ConnectionPool::connect(&PoolOptions::new("localhost:8848"), &cluster.dialer())
            .await
            .unwrap();
        let appender = PartitionedTableAppender::new(
            AppenderOptions::new("pt", "date").with_db_path(DB),
            Arc::new(pool),
        )
        .await
        .unwrap();

        let stamps = Vector::from_values(
            ColumnType::Scalar(DataType::Timestamp),
            vec![Value::Timestamp(0)],
        )
        .unwrap();
        let table = Table::new(vec!["date".into(), "price".into()], vec![stamps, doubles(&[1.0])])
            .unwrap();
        let err = appender.append(&table).await.unwrap_err();
        assert!(matches!(err, AppendError::TemporalMismatch { column: 0, .. }));
        assert_eq!(
            err.to_string(),
            "column 0, temporal column must have exactly the same type, expect DATE, got TIMESTAMP"
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn test_unmatched_rows_are_skipped() {
        let cluster = MemoryCluster::new();
        cluster
            .create_table(
                Some(DB),
                "pt",
                definition().partitioned_by(
                    "sym",
                    PartitionType::List,
                    DataForm::Vector(
                        Vector::from_values(
                            ColumnType::Scalar(DataType::Any),
                            vec![
                                Value::Vector(Box::new(symbols(&["A", "B"]))),
                                Value::Vector(Box::new(symbols(&["C"]))),
                            ],
                        )
                        .unwrap(),
                    ),
                ),
            )
            .unwrap();
        let appender = appender(&cluster, 2).await;

        let rows = appender
            .append(&trades(&["A", "Z", "C"], &[1.0, 2.0, 3.0]))
            .await
            .unwrap();
        assert_eq!(rows, 2);
        assert!(logs_contain("Rows match no partition and were skipped"));
    }

    #[tokio::test]
    async fn test_partial_failure_reports_error() {
        let cluster = value_cluster();
        let appender = appender(&cluster, 3).await;
        cluster.reject_value(Value::Symbol("B".into()));

        let err = appender
            .append(&trades(&["A", "B", "C"], &[1.0, 2.0, 3.0]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppendError::Connection(_)));
        assert_eq!(err.to_string(), "server response: The server rejected value B");
        // Buckets that succeeded are not rolled back.
        assert_eq!(cluster.table(Some(DB), "pt").unwrap().rows(), 2);
    }

    #[tokio::test]
    async fn test_partition_column_resolution() {
        let cluster = value_cluster();
        let pool = Arc::new(
            ConnectionPool::connect(&PoolOptions::new("localhost:8848"), &cluster.dialer())
                .await
                .unwrap(),
        );

        let err = PartitionedTableAppender::new(
            AppenderOptions::new("pt", "price").with_db_path(DB),
            pool.clone(),
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err.to_string(), "can't find specified partition column name");

        // Single-level names must match exactly.
        let err = PartitionedTableAppender::new(
            AppenderOptions::new("pt", "SYM").with_db_path(DB),
            pool,
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, AppendError::PartitionColumnNotFound));
    }

    #[tokio::test]
    async fn test_composite_match_ignores_case() {
        let cluster = MemoryCluster::new();
        cluster
            .create_table(
                Some(DB),
                "pt",
                TableDefinition::new([
                    ("date", ColumnType::Scalar(DataType::Date)),
                    ("sym", ColumnType::Scalar(DataType::Symbol)),
                    ("price", ColumnType::Scalar(DataType::Double)),
                ])
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
                .partitioned_by("sym", PartitionType::Hash, DataForm::Scalar(Value::Int(4))),
            )
            .unwrap();
        let pool = ConnectionPool::connect(
            &PoolOptions::new("localhost:8848").with_pool_size(2),
            &cluster.dialer(),
        )
        .await
        .unwrap();

        let appender = PartitionedTableAppender::new(
            AppenderOptions::new("pt", "SYM").with_db_path(DB),
            Arc::new(pool),
        )
        .await
        .unwrap();
        assert_eq!(appender.partition_column_index(), 1);

        let dates = Vector::from_values(
            ColumnType::Scalar(DataType::Date),
            vec![Value::Date(19_723), Value::Date(19_723)],
        )
        .unwrap();
        let table = Table::new(
            vec!["date".into(), "sym".into(), "price".into()],
            vec![dates, symbols(&["A", "B"]), doubles(&[1.0, 2.0])],
        )
        .unwrap();
        assert_eq!(appender.append(&table).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_custom_append_function() {
        let cluster = MemoryCluster::new();
        cluster
            .create_table(
                None,
                "pt",
                definition().partitioned_by(
                    "sym",
                    PartitionType::Hash,
                    DataForm::Scalar(Value::Int(3)),
                ),
            )
            .unwrap();
        let pool = ConnectionPool::connect(&PoolOptions::new("localhost:8848"), &cluster.dialer())
            .await
            .unwrap();
        let appender = PartitionedTableAppender::new(
            AppenderOptions::new("pt", "sym").with_append_function("append!{pt}"),
            Arc::new(pool),
        )
        .await
        .unwrap();

        // append! returns nothing, so no rows are reported.
        let rows = appender.append(&trades(&["A", "B"], &[1.0, 2.0])).await.unwrap();
        assert_eq!(rows, 0);
        assert_eq!(cluster.table(None, "pt").unwrap().rows(), 2);

        appender.close().await.unwrap();
        assert_eq!(cluster.open_connections(), 0);
    }
}
