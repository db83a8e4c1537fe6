use crate::error::ConnectionError;
use async_trait::async_trait;
use model::DataForm;

/// A single request/response channel to one server node.
///
/// A connection serves one call at a time; callers that share connections
/// lease them exclusively.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Runs a script and returns its result.
    async fn run_script(&mut self, script: &str) -> Result<DataForm, ConnectionError>;

    /// Invokes `function` with positional arguments.
    async fn run_function(
        &mut self,
        function: &str,
        args: &[DataForm],
    ) -> Result<DataForm, ConnectionError>;

    async fn close(&mut self) -> Result<(), ConnectionError>;

    fn is_closed(&self) -> bool;

    fn address(&self) -> &str;
}

/// Opens authenticated connections to a node address (`host:port`).
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, address: &str) -> Result<Box<dyn Connection>, ConnectionError>;
}
