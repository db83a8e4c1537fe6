use crate::{
    domain::{PartitionDomain, align},
    error::PartitionError,
};
use model::{DataType, Vector};

/// Fixed number of buckets keyed by the server hash of the cell.
#[derive(Debug, Clone)]
pub struct HashDomain {
    data_type: DataType,
    buckets: i32,
}

impl HashDomain {
    pub fn new(data_type: DataType, buckets: i32) -> Self {
        HashDomain { data_type, buckets }
    }

    pub fn buckets(&self) -> i32 {
        self.buckets
    }
}

impl PartitionDomain for HashDomain {
    fn partition_keys(&self, column: &Vector) -> Result<Vec<i32>, PartitionError> {
        let column = align(self.data_type, column)?;
        Ok(column.iter().map(|v| v.hash_bucket(self.buckets)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{ColumnType, Value};

    #[test]
    fn test_keys_within_bucket_range() {
        let domain = HashDomain::new(DataType::Int, 4);
        let column = Vector::from_values(
            ColumnType::Scalar(DataType::Int),
            vec![Value::Int(9), Value::Int(-1), Value::Null],
        )
        .unwrap();
        assert_eq!(domain.partition_keys(&column).unwrap(), vec![1, 3, -1]);
    }
}
