use crate::{
    domain::{PartitionDomain, align},
    error::PartitionError,
};
use model::{DataType, Vector};

/// Bucket count the server uses to key VALUE partitions.
pub const VALUE_BUCKETS: i32 = 1_048_576;

/// One partition per distinct value.
#[derive(Debug, Clone)]
pub struct ValueDomain {
    data_type: DataType,
}

impl ValueDomain {
    pub fn new(data_type: DataType) -> Self {
        ValueDomain { data_type }
    }
}

impl PartitionDomain for ValueDomain {
    fn partition_keys(&self, column: &Vector) -> Result<Vec<i32>, PartitionError> {
        let column = align(self.data_type, column)?;
        if column.real_data_type() == DataType::Long {
            return Err(PartitionError::LongValuePartition);
        }

        Ok(column
            .iter()
            .map(|v| v.hash_bucket(VALUE_BUCKETS))
            .collect())
    }
}
