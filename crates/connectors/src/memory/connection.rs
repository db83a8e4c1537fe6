use crate::{
    connection::Connection,
    error::ConnectionError,
    memory::{cluster::MemoryCluster, script::Request},
};
use async_trait::async_trait;
use model::DataForm;
use tracing::debug;

/// Connection to one node of a [`MemoryCluster`].
pub struct MemoryConnection {
    cluster: MemoryCluster,
    address: String,
    closed: bool,
}

impl MemoryConnection {
    pub(crate) fn new(cluster: MemoryCluster, address: &str) -> Self {
        MemoryConnection {
            cluster,
            address: address.to_string(),
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<(), ConnectionError> {
        if self.closed {
            return Err(ConnectionError::Closed(self.address.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn run_script(&mut self, script: &str) -> Result<DataForm, ConnectionError> {
        self.ensure_open()?;
        debug!(address = %self.address, script, "Running script");
        self.cluster
            .call(&self.address, Request::Script(script))
            .await
    }

    async fn run_function(
        &mut self,
        function: &str,
        args: &[DataForm],
    ) -> Result<DataForm, ConnectionError> {
        self.ensure_open()?;
        debug!(address = %self.address, function, args = args.len(), "Running function");
        self.cluster
            .call(&self.address, Request::Function { name: function, args })
            .await
    }

    async fn close(&mut self) -> Result<(), ConnectionError> {
        if !self.closed {
            self.closed = true;
            self.cluster.connection_closed();
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn address(&self) -> &str {
        &self.address
    }
}
