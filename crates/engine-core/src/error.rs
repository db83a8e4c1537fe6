use connectors::ConnectionError;
use engine_config::ConfigError;
use model::ModelError;
use partition::PartitionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("the connection pool is closed")]
    Closed,

    /// A permit was granted but no idle connection was left to lease.
    #[error("no idle connection left in the pool")]
    ConnectionLost,

    #[error("invalid data node address {0}")]
    InvalidNodeAddress(String),

    #[error("no live data nodes available")]
    NoLiveNodes,

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

/// Errors reading a table description returned by `schema()`.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("malformed table schema: {0}")]
    Malformed(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Partition(#[from] PartitionError),
}
