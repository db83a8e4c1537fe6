use crate::{
    composite::CompositeDomain, error::PartitionError, hash::HashDomain, list::ListDomain,
    range::RangeDomain, scheme::PartitionType, value::ValueDomain,
};
use model::{Category, DataForm, DataType, Vector};
use std::{borrow::Cow, fmt};
use tracing::debug;

/// Maps partition-column cells to partition keys; `-1` means the cell
/// belongs to no partition.
pub trait PartitionDomain: Send + Sync + fmt::Debug {
    fn partition_keys(&self, column: &Vector) -> Result<Vec<i32>, PartitionError>;
}

#[derive(Debug, Clone)]
pub enum Domain {
    Value(ValueDomain),
    Range(RangeDomain),
    Hash(HashDomain),
    List(ListDomain),
    Composite(CompositeDomain),
}

impl Domain {
    /// Builds the domain of one partition level from its `partitionSchema`.
    pub fn create(
        partition_type: PartitionType,
        data_type: DataType,
        schema: &DataForm,
    ) -> Result<Self, PartitionError> {
        debug!(%partition_type, %data_type, "Creating partition domain");
        let domain = match partition_type {
            PartitionType::Value => Domain::Value(ValueDomain::new(data_type)),
            PartitionType::Hash => {
                let buckets = schema
                    .as_scalar()?
                    .as_i64()
                    .and_then(|b| i32::try_from(b).ok())
                    .filter(|b| *b > 0)
                    .ok_or_else(|| {
                        PartitionError::MalformedSchema("hash bucket count".to_string())
                    })?;
                Domain::Hash(HashDomain::new(data_type, buckets))
            }
            PartitionType::Range => {
                Domain::Range(RangeDomain::new(data_type, schema.as_vector()?.clone()))
            }
            PartitionType::List => Domain::List(ListDomain::new(data_type, schema.as_vector()?)?),
            other => return Err(PartitionError::Unsupported(other)),
        };
        Ok(domain)
    }

    pub fn partition_type(&self) -> PartitionType {
        match self {
            Domain::Value(_) => PartitionType::Value,
            Domain::Range(_) => PartitionType::Range,
            Domain::Hash(_) => PartitionType::Hash,
            Domain::List(_) => PartitionType::List,
            Domain::Composite(_) => PartitionType::Compo,
        }
    }
}

impl PartitionDomain for Domain {
    fn partition_keys(&self, column: &Vector) -> Result<Vec<i32>, PartitionError> {
        match self {
            Domain::Value(d) => d.partition_keys(column),
            Domain::Range(d) => d.partition_keys(column),
            Domain::Hash(d) => d.partition_keys(column),
            Domain::List(d) => d.partition_keys(column),
            Domain::Composite(d) => d.partition_keys(column),
        }
    }
}

/// Checks the column against the domain's type and casts temporal columns
/// to the domain's exact subtype.
pub(crate) fn align(
    expected: DataType,
    column: &Vector,
) -> Result<Cow<'_, Vector>, PartitionError> {
    let actual = column.real_data_type();
    if actual.category() != expected.category() {
        return Err(PartitionError::IncompatibleCategory {
            expected: expected.category(),
            actual: actual.category(),
        });
    }

    if expected.category() == Category::Temporal && actual != expected {
        return Ok(Cow::Owned(column.cast_temporal(expected)?));
    }
    Ok(Cow::Borrowed(column))
}
