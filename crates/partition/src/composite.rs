use crate::{
    domain::{Domain, PartitionDomain},
    error::PartitionError,
};
use model::Vector;

/// One level of a multi-level (COMPO) partitioning, selected by the routing
/// column's name.
#[derive(Debug, Clone)]
pub struct CompositeDomain {
    level: usize,
    column: String,
    inner: Box<Domain>,
}

impl CompositeDomain {
    pub fn new(level: usize, column: impl Into<String>, inner: Domain) -> Self {
        CompositeDomain {
            level,
            column: column.into(),
            inner: Box::new(inner),
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn inner(&self) -> &Domain {
        &self.inner
    }
}

impl PartitionDomain for CompositeDomain {
    fn partition_keys(&self, column: &Vector) -> Result<Vec<i32>, PartitionError> {
        self.inner.partition_keys(column)
    }
}
