pub mod appender;
pub mod error;
pub mod writer;

pub use appender::PartitionedTableAppender;
pub use error::{AppendError, WriterError};
pub use writer::{MultiGoroutineTable, TableState, status::Status};
