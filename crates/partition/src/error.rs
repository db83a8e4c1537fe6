use crate::scheme::PartitionType;
use model::{Category, ModelError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PartitionError {
    #[error("data category incompatible: expect {expected}, got {actual}")]
    IncompatibleCategory { expected: Category, actual: Category },

    #[error("the partitioning column cannot be of long type")]
    LongValuePartition,

    #[error("unknown partition type code {0}")]
    UnknownType(i32),

    #[error("unsupported partition type {0}")]
    Unsupported(PartitionType),

    #[error("the input list must be a tuple")]
    ListNotTuple,

    #[error("malformed partition schema: {0}")]
    MalformedSchema(String),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}
