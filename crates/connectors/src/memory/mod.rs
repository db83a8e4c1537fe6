//! In-process stand-in for a cluster of server nodes.
//!
//! Understands the scripts issued by the ingestion engine (`schema(...)`,
//! `tableInsert{...}`, `append!{...}` and the live data node query), keeps
//! appended rows in memory and supports fault injection for tests.

pub mod cluster;
pub mod connection;
mod script;

pub use cluster::{CallRecord, MemoryCluster, MemoryDialer, PartitionLevel, TableDefinition};
pub use connection::MemoryConnection;
