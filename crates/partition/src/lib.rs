pub mod composite;
pub mod domain;
pub mod error;
pub mod hash;
pub mod list;
pub mod range;
pub mod scheme;
pub mod value;

pub use domain::{Domain, PartitionDomain};
pub use error::PartitionError;
pub use scheme::PartitionType;
