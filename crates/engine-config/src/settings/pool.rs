use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Options of a connection pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PoolOptions {
    /// Node to connect to, `host:port`. With load balancing and no explicit
    /// addresses, this node is asked for the live data nodes.
    pub address: String,

    /// Number of connections, fixed for the pool's lifetime.
    pub pool_size: usize,

    pub load_balance: bool,

    /// Nodes to spread connections over when load balancing.
    pub load_balance_addresses: Vec<String>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            address: String::new(),
            pool_size: 1,
            load_balance: false,
            load_balance_addresses: Vec::new(),
        }
    }
}

impl PoolOptions {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    pub fn with_load_balance(mut self, enabled: bool) -> Self {
        self.load_balance = enabled;
        self
    }

    pub fn with_load_balance_addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.load_balance = true;
        self.load_balance_addresses = addresses.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_size < 1 {
            return Err(ConfigError::PoolSize);
        }
        let has_addresses = self.load_balance && !self.load_balance_addresses.is_empty();
        if self.address.is_empty() && !has_addresses {
            return Err(ConfigError::MissingParameter("Address"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::from_json;

    #[test]
    fn test_zero_pool_size_is_rejected() {
        let err = PoolOptions::new("localhost:8848")
            .with_pool_size(0)
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "PoolSize must be greater than 0");
    }

    #[test]
    fn test_explicit_addresses_replace_address() {
        let options = PoolOptions::default().with_load_balance_addresses(["a:1", "b:2"]);
        assert!(options.load_balance);
        assert!(options.validate().is_ok());
        assert!(PoolOptions::default().validate().is_err());
    }

    #[test]
    fn test_parse_pascal_case_keys() {
        let options: PoolOptions =
            from_json(r#"{"Address": "localhost:8848", "PoolSize": 4, "LoadBalance": true}"#)
                .unwrap();
        assert_eq!(options.pool_size, 4);
        assert!(options.load_balance);
        assert!(options.load_balance_addresses.is_empty());
    }
}
