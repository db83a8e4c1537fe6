use thiserror::Error;

/// Errors raised while loading or validating options.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PoolSize must be greater than 0")]
    PoolSize,

    #[error("the parameter {0} must be specified")]
    MissingParameter(&'static str),

    #[error("the parameter {0} must be greater than or equal to 1")]
    BelowMinimum(&'static str),

    #[error("the parameter PartitionCol must be specified when GoroutineCount is greater than 1")]
    PartitionColRequired,

    #[error("Failed to parse options: {0}")]
    Json(#[from] serde_json::Error),
}
