use crate::error::PartitionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Partitioning scheme of one partition level, as reported by `schema()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartitionType {
    Seq,
    Value,
    Range,
    List,
    Compo,
    Hash,
}

impl PartitionType {
    pub fn code(self) -> i32 {
        match self {
            PartitionType::Seq => 0,
            PartitionType::Value => 1,
            PartitionType::Range => 2,
            PartitionType::List => 3,
            PartitionType::Compo => 4,
            PartitionType::Hash => 5,
        }
    }
}

impl TryFrom<i32> for PartitionType {
    type Error = PartitionError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(PartitionType::Seq),
            1 => Ok(PartitionType::Value),
            2 => Ok(PartitionType::Range),
            3 => Ok(PartitionType::List),
            4 => Ok(PartitionType::Compo),
            5 => Ok(PartitionType::Hash),
            other => Err(PartitionError::UnknownType(other)),
        }
    }
}

impl fmt::Display for PartitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PartitionType::Seq => "SEQ",
            PartitionType::Value => "VALUE",
            PartitionType::Range => "RANGE",
            PartitionType::List => "LIST",
            PartitionType::Compo => "COMPO",
            PartitionType::Hash => "HASH",
        };
        f.write_str(name)
    }
}
