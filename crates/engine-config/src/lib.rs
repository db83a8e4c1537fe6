pub mod error;
pub mod settings;

pub use error::ConfigError;
pub use settings::{appender::AppenderOptions, pool::PoolOptions, writer::WriterOptions};
