use crate::{error::PoolError, task::Task};
use connectors::{Connection, Dialer};
use engine_config::PoolOptions;
use futures::{future::join_all, lock::Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

const LIVE_DATA_NODES_SCRIPT: &str = "rpc(getControllerAlias(), getClusterLiveDataNodes{false})";

struct Slots {
    idle: Vec<Box<dyn Connection>>,
    closed: bool,
}

/// A fixed set of connections shared by concurrently executed tasks.
///
/// Each connection serves one task at a time, so at most `pool_size` calls
/// are in flight. Leasing, returning and closing go through the same lock:
/// once the pool is closed, new leases fail and connections returned by
/// in-flight tasks are closed instead of being checked back in.
pub struct ConnectionPool {
    size: usize,
    addresses: Vec<String>,
    permits: Semaphore,
    slots: Mutex<Slots>,
    closed: AtomicBool,
}

impl ConnectionPool {
    /// Opens `pool_size` connections, spread round-robin over the
    /// load-balance addresses when load balancing is enabled.
    pub async fn connect(options: &PoolOptions, dialer: &dyn Dialer) -> Result<Self, PoolError> {
        options.validate()?;

        let addresses = if !options.load_balance {
            vec![options.address.clone()]
        } else if !options.load_balance_addresses.is_empty() {
            options.load_balance_addresses.clone()
        } else {
            discover_nodes(&options.address, dialer).await?
        };

        if addresses.is_empty() {
            return Err(PoolError::NoLiveNodes);
        }

        let mut idle = Vec::with_capacity(options.pool_size);
        for slot in 0..options.pool_size {
            let address = &addresses[slot % addresses.len()];
            match dialer.dial(address).await {
                Ok(connection) => idle.push(connection),
                Err(e) => {
                    warn!(address = %address, error = %e, "Failed to open pooled connection");
                    close_all(idle).await;
                    return Err(e.into());
                }
            }
        }

        info!(
            pool_size = options.pool_size,
            load_balance = options.load_balance,
            addresses = ?addresses,
            "Connection pool opened"
        );

        Ok(ConnectionPool {
            size: options.pool_size,
            addresses,
            permits: Semaphore::new(options.pool_size),
            slots: Mutex::new(Slots {
                idle,
                closed: false,
            }),
            closed: AtomicBool::new(false),
        })
    }

    /// Runs every present task concurrently and records its outcome on the
    /// task. Fails only when the pool itself is unusable; a task that fails
    /// keeps its error and does not affect the others.
    pub async fn execute(&self, tasks: &mut [Option<Task>]) -> Result<(), PoolError> {
        if self.is_closed() {
            return Err(PoolError::Closed);
        }

        let count = tasks.iter().flatten().count();
        debug!(tasks = count, pool_size = self.size, "Executing tasks");

        let runs = tasks.iter_mut().flatten().map(|task| self.run(task));
        join_all(runs)
            .await
            .into_iter()
            .collect::<Result<Vec<()>, PoolError>>()?;
        Ok(())
    }

    /// Closes every idle connection. Idempotent.
    pub async fn close(&self) -> Result<(), PoolError> {
        let idle = {
            let mut slots = self.slots.lock().await;
            if slots.closed {
                return Ok(());
            }
            slots.closed = true;
            self.closed.store(true, Ordering::SeqCst);
            std::mem::take(&mut slots.idle)
        };
        self.permits.close();

        let count = idle.len();
        let mut first_error = None;
        for mut connection in idle {
            if let Err(e) = connection.close().await {
                warn!(address = connection.address(), error = %e, "Failed to close connection");
                first_error.get_or_insert(e);
            }
        }

        info!(closed = count, "Connection pool closed");
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.size
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Addresses the pool's connections were opened against.
    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    /// Connections currently checked in.
    pub async fn idle_connections(&self) -> usize {
        self.slots.lock().await.idle.len()
    }

    async fn run(&self, task: &mut Task) -> Result<(), PoolError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| PoolError::Closed)?;
        let mut connection = self.lease().await?;
        task.run_on(connection.as_mut()).await;
        self.release(connection).await;
        Ok(())
    }

    async fn lease(&self) -> Result<Box<dyn Connection>, PoolError> {
        let mut slots = self.slots.lock().await;
        if slots.closed {
            return Err(PoolError::Closed);
        }
        slots.idle.pop().ok_or(PoolError::ConnectionLost)
    }

    async fn release(&self, mut connection: Box<dyn Connection>) {
        {
            let mut slots = self.slots.lock().await;
            if !slots.closed {
                slots.idle.push(connection);
                return;
            }
        }

        debug!(
            address = connection.address(),
            "Closing connection returned after pool close"
        );
        if let Err(e) = connection.close().await {
            warn!(address = connection.address(), error = %e, "Failed to close connection");
        }
    }
}

async fn close_all(connections: Vec<Box<dyn Connection>>) {
    for mut connection in connections {
        if let Err(e) = connection.close().await {
            warn!(address = connection.address(), error = %e, "Failed to close connection");
        }
    }
}

/// Asks `address` for the cluster's live data nodes.
async fn discover_nodes(address: &str, dialer: &dyn Dialer) -> Result<Vec<String>, PoolError> {
    let mut connection = dialer.dial(address).await?;
    let response = connection.run_script(LIVE_DATA_NODES_SCRIPT).await;
    if let Err(e) = connection.close().await {
        warn!(address, error = %e, "Failed to close discovery connection");
    }

    let nodes = response?.as_vector()?.strings()?;
    debug!(address, nodes = ?nodes, "Discovered live data nodes");
    nodes.iter().map(|n| parse_node_address(n)).collect()
}

/// `host:port:alias` → `host:port`.
fn parse_node_address(entry: &str) -> Result<String, PoolError> {
    let mut parts = entry.split(':');
    match (parts.next(), parts.next()) {
        (Some(host), Some(port)) if !host.is_empty() && !port.is_empty() => {
            Ok(format!("{host}:{port}"))
        }
        _ => Err(PoolError::InvalidNodeAddress(entry.to_string())),
    }
}
