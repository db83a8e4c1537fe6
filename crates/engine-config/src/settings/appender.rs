use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Options of a partitioned bulk appender.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AppenderOptions {
    /// Database path; empty for an in-memory table.
    #[serde(rename = "DBPath")]
    pub db_path: String,

    pub table_name: String,

    /// Column the rows are split on.
    pub partition_col: String,

    /// Function invoked with each sub-table; defaults to `tableInsert`.
    pub append_function: String,
}

impl AppenderOptions {
    pub fn new(table_name: impl Into<String>, partition_col: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            partition_col: partition_col.into(),
            ..Self::default()
        }
    }

    pub fn with_db_path(mut self, db_path: impl Into<String>) -> Self {
        self.db_path = db_path.into();
        self
    }

    pub fn with_append_function(mut self, function: impl Into<String>) -> Self {
        self.append_function = function.into();
        self
    }

    pub fn database(&self) -> Option<&str> {
        Some(self.db_path.as_str()).filter(|p| !p.is_empty())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table_name.is_empty() {
            return Err(ConfigError::MissingParameter("TableName"));
        }
        Ok(())
    }
}
