pub mod connection;
pub mod error;
pub mod memory;

pub use connection::{Connection, Dialer};
pub use error::ConnectionError;
