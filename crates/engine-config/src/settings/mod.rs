use crate::error::ConfigError;
use serde::de::DeserializeOwned;

pub mod appender;
pub mod pool;
pub mod writer;

/// Parses options from JSON using the PascalCase keys of the option structs.
pub fn from_json<T: DeserializeOwned>(text: &str) -> Result<T, ConfigError> {
    Ok(serde_json::from_str(text)?)
}
