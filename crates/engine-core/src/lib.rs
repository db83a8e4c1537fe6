pub mod error;
pub mod metrics;
pub mod pool;
pub mod schema;
pub mod task;

pub use error::{PoolError, SchemaError};
pub use pool::ConnectionPool;
pub use task::Task;
