#![allow(dead_code)]

use tracing_subscriber::util::SubscriberInitExt;
use connectors::memory::{MemoryCluster, TableDefinition};
use engine_config::{PoolOptions, WriterOptions};
use engine_core::ConnectionPool;
use engine_processing::MultiGoroutineTable;
use model::{ColumnType, DataForm, DataType, Table, Value, Vector};
use partition::PartitionType;
use std::{sync::Arc, time::Duration};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

pub const ADDRESS: &str = "localhost:8848";
pub const QUOTES_DB: &str = "dfs://quotes";

/// Formatted output honouring `RUST_LOG` for the current thread, until the
/// guard drops. Leaves the global subscriber to `#[traced_test]`.
pub fn init_logging() -> DefaultGuard {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .set_default()
}

pub fn symbol_vector(values: &[&str]) -> Vector {
    Vector::from_values(
        ColumnType::Scalar(DataType::Symbol),
        values.iter().map(|s| Value::Symbol(s.to_string())).collect(),
    )
    .expect("symbol vector")
}

pub fn double_vector(values: &[f64]) -> Vector {
    Vector::from_values(
        ColumnType::Scalar(DataType::Double),
        values.iter().map(|v| Value::Double(*v)).collect(),
    )
    .expect("double vector")
}

/// `{sym SYMBOL, val DOUBLE}`, VALUE-partitioned on `sym` over A, B and C.
pub fn quotes_cluster() -> MemoryCluster {
    let cluster = MemoryCluster::new();
    cluster
        .create_table(
            Some(QUOTES_DB),
            "quotes",
            TableDefinition::new([
                ("sym", ColumnType::Scalar(DataType::Symbol)),
                ("val", ColumnType::Scalar(DataType::Double)),
            ])
            .partitioned_by(
                "sym",
                PartitionType::Value,
                DataForm::Vector(symbol_vector(&["A", "B", "C"])),
            ),
        )
        .expect("create quotes table");
    cluster
}

pub fn quotes_table(symbols: &[&str], values: &[f64]) -> Table {
    Table::new(
        vec!["sym".into(), "val".into()],
        vec![symbol_vector(symbols), double_vector(values)],
    )
    .expect("quotes table")
}

pub fn quotes_writer_options(workers: usize) -> WriterOptions {
    WriterOptions::new(ADDRESS, "quotes")
        .with_database(QUOTES_DB)
        .with_batch_size(10)
        .with_throttle(Duration::from_millis(50))
        .with_workers(workers, "sym")
}

pub async fn pool(cluster: &MemoryCluster, options: PoolOptions) -> Arc<ConnectionPool> {
    Arc::new(
        ConnectionPool::connect(&options, &cluster.dialer())
            .await
            .expect("connect pool"),
    )
}

pub fn stored_rows(cluster: &MemoryCluster, database: Option<&str>, table: &str) -> usize {
    cluster.table(database, table).map_or(0, |t| t.rows())
}

pub fn stored_doubles(
    cluster: &MemoryCluster,
    database: Option<&str>,
    table: &str,
    column: &str,
) -> Vec<f64> {
    cluster
        .table(database, table)
        .and_then(|t| t.column_by_name(column).cloned())
        .map(|c| c.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default()
}

pub fn insert_calls(cluster: &MemoryCluster) -> usize {
    cluster
        .calls()
        .iter()
        .filter(|c| c.request.starts_with("tableInsert"))
        .count()
}

/// Polls until the writer stops accepting rows.
pub async fn wait_for_exit(writer: &MultiGoroutineTable) {
    for _ in 0..400 {
        if writer.status().is_exit {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("writer did not stop");
}
