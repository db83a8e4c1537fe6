use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Options of a multi-worker table writer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct WriterOptions {
    /// Database path; empty for an in-memory table.
    pub database: String,

    pub table_name: String,

    /// Node every worker connects to, `host:port`.
    pub address: String,

    /// Rows a worker waits for before flushing without throttling.
    pub batch_size: usize,

    /// Milliseconds a worker waits for a batch to fill.
    pub throttle: u64,

    /// Number of workers, each with its own connection.
    pub goroutine_count: usize,

    /// Column used to route rows to workers.
    pub partition_col: String,

    /// Script run after every successful batch insert.
    pub follow_up_script: String,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            database: String::new(),
            table_name: String::new(),
            address: String::new(),
            batch_size: 1,
            throttle: 1,
            goroutine_count: 1,
            partition_col: String::new(),
            follow_up_script: String::new(),
        }
    }
}

impl WriterOptions {
    pub fn new(address: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            table_name: table_name.into(),
            ..Self::default()
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle.as_millis() as u64;
        self
    }

    pub fn with_workers(mut self, count: usize, partition_col: impl Into<String>) -> Self {
        self.goroutine_count = count;
        self.partition_col = partition_col.into();
        self
    }

    pub fn with_follow_up_script(mut self, script: impl Into<String>) -> Self {
        self.follow_up_script = script.into();
        self
    }

    pub fn database(&self) -> Option<&str> {
        Some(self.database.as_str()).filter(|d| !d.is_empty())
    }

    pub fn partition_column(&self) -> Option<&str> {
        Some(self.partition_col.as_str()).filter(|c| !c.is_empty())
    }

    pub fn follow_up(&self) -> Option<&str> {
        Some(self.follow_up_script.as_str()).filter(|s| !s.is_empty())
    }

    pub fn throttle_duration(&self) -> Duration {
        Duration::from_millis(self.throttle)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.goroutine_count < 1 {
            return Err(ConfigError::BelowMinimum("GoroutineCount"));
        }
        if self.batch_size < 1 {
            return Err(ConfigError::BelowMinimum("BatchSize"));
        }
        if self.throttle < 1 {
            return Err(ConfigError::BelowMinimum("Throttle"));
        }
        if self.goroutine_count > 1 && self.partition_col.is_empty() {
            return Err(ConfigError::PartitionColRequired);
        }
        if self.table_name.is_empty() {
            return Err(ConfigError::MissingParameter("TableName"));
        }
        if self.address.is_empty() {
            return Err(ConfigError::MissingParameter("Address"));
        }

        if self.batch_size > 100_000 {
            warn!(
                batch_size = self.batch_size,
                "Batch size is very large, may cause memory issues"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::from_json;

    fn options() -> WriterOptions {
        WriterOptions::new("localhost:8848", "trades")
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(options().validate().is_ok());
        assert_eq!(options().throttle_duration(), Duration::from_millis(1));
    }

    #[test]
    fn test_bounds() {
        let err = options().with_workers(0, "").validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "the parameter GoroutineCount must be greater than or equal to 1"
        );

        let err = options().with_batch_size(0).validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "the parameter BatchSize must be greater than or equal to 1"
        );

        let err = options()
            .with_throttle(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "the parameter Throttle must be greater than or equal to 1"
        );
    }

    #[test]
    fn test_partition_col_required_for_many_workers() {
        let err = options().with_workers(3, "").validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "the parameter PartitionCol must be specified when GoroutineCount is greater than 1"
        );
        assert!(options().with_workers(3, "sym").validate().is_ok());
    }

    #[test]
    fn test_parse() {
        let options: WriterOptions = from_json(
            r#"{
                "Database": "dfs://db",
                "TableName": "pt",
                "Address": "localhost:8848",
                "BatchSize": 10,
                "Throttle": 50,
                "GoroutineCount": 2,
                "PartitionCol": "sym",
                "FollowUpScript": "flush()"
            }"#,
        )
        .unwrap();
        assert_eq!(options.database(), Some("dfs://db"));
        assert_eq!(options.throttle_duration(), Duration::from_millis(50));
        assert_eq!(options.follow_up(), Some("flush()"));
        assert!(options.validate().is_ok());
    }
}
