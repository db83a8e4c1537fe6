use crate::{
    domain::{PartitionDomain, align},
    error::PartitionError,
};
use model::{DataType, Value, Vector};
use std::collections::HashMap;

/// Explicit value lists; each element of the schema tuple is one partition.
#[derive(Debug, Clone)]
pub struct ListDomain {
    data_type: DataType,
    index: HashMap<String, i32>,
}

impl ListDomain {
    pub fn new(data_type: DataType, schema: &Vector) -> Result<Self, PartitionError> {
        if schema.data_type() != DataType::Any {
            return Err(PartitionError::ListNotTuple);
        }

        let mut index = HashMap::new();
        for (partition, cell) in schema.iter().enumerate() {
            let partition = partition as i32;
            match cell {
                Value::Vector(members) => {
                    for member in members.iter() {
                        index.insert(member.to_string(), partition);
                    }
                }
                scalar => {
                    index.insert(scalar.to_string(), partition);
                }
            }
        }

        Ok(ListDomain { data_type, index })
    }
}

impl PartitionDomain for ListDomain {
    fn partition_keys(&self, column: &Vector) -> Result<Vec<i32>, PartitionError> {
        let column = align(self.data_type, column)?;
        Ok(column
            .iter()
            .map(|v| match v {
                Value::Null => -1,
                v => self.index.get(&v.to_string()).copied().unwrap_or(-1),
            })
            .collect())
    }
}
