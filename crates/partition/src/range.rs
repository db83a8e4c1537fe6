use crate::{
    domain::{PartitionDomain, align},
    error::PartitionError,
};
use model::{DataType, Value, Vector};
use std::cmp::Ordering;

/// Partitions delimited by sorted boundaries; partition `i` covers
/// `[boundaries[i], boundaries[i + 1])`.
#[derive(Debug, Clone)]
pub struct RangeDomain {
    data_type: DataType,
    boundaries: Vector,
}

impl RangeDomain {
    pub fn new(data_type: DataType, boundaries: Vector) -> Self {
        RangeDomain {
            data_type,
            boundaries,
        }
    }

    fn partitions(&self) -> usize {
        self.boundaries.len().saturating_sub(1)
    }

    /// Index of the last boundary not greater than `value`.
    fn asof(&self, value: &Value) -> Option<usize> {
        let bounds = self.boundaries.values();
        let at_or_below = bounds.partition_point(|b| {
            matches!(b.compare(value), Some(Ordering::Less | Ordering::Equal))
        });
        at_or_below.checked_sub(1)
    }
}

impl PartitionDomain for RangeDomain {
    fn partition_keys(&self, column: &Vector) -> Result<Vec<i32>, PartitionError> {
        let column = align(self.data_type, column)?;
        let partitions = self.partitions();

        Ok(column
            .iter()
            .map(|v| match self.asof(v) {
                Some(index) if !v.is_null() && index < partitions => index as i32,
                _ => -1,
            })
            .collect())
    }
}
