use connectors::ConnectionError;
use engine_config::ConfigError;
use engine_core::{PoolError, SchemaError};
use model::{Category, ColumnType, ModelError};
use partition::PartitionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppendError {
    #[error("the input table doesn't match the schema of the target table")]
    SchemaMismatch,

    #[error("column {column}, expect category {expected}, got category {actual}")]
    CategoryMismatch {
        column: usize,
        expected: Category,
        actual: Category,
    },

    #[error("column {column}, temporal column must have exactly the same type, expect {expected}, got {actual}")]
    TemporalMismatch {
        column: usize,
        expected: ColumnType,
        actual: ColumnType,
    },

    #[error("can't find specified partition column name")]
    PartitionColumnNotFound,

    #[error("unexpected append result: {0}")]
    UnexpectedResult(String),

    /// The first failed sub-table write; other buckets may have landed.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Partition(#[from] PartitionError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum WriterError {
    /// The table was poisoned by a failed batch or already closed.
    #[error("goroutine already exists")]
    NotOpen,

    #[error("column counts don't match")]
    ColumnCountMismatch,

    #[error("failed to obtain the partition scheme")]
    PartitionSchemeUnavailable,

    #[error("the parameter GoroutineCount must be 1 for a dimension table")]
    DimensionTable,

    #[error("no match found for {0}")]
    RoutingColumnNotFound(String),

    #[error("the parameter PartitionCol must be the partitioning column {0} in the table")]
    NotPartitionColumn(String),

    #[error("the parameter partitionCol must be the partitioning columns in the partitioned table")]
    NotPartitioningColumns,

    #[error("the parameter partitionCol must be specified for a partitioned table")]
    PartitionColumnRequired,

    #[error("worker {0} has no open connection")]
    ConnectionReleased(usize),

    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Partition(#[from] PartitionError),

    #[error(transparent)]
    Model(#[from] ModelError),
}
