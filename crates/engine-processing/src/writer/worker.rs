use crate::{
    error::WriterError,
    writer::{TableContext, batch::build_batch, queue::RowQueue, status::WorkerStatus},
};
use connectors::Connection;
use engine_core::metrics::WriterMetrics;
use model::{DataForm, Row};
use serde::Serialize;
use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicU8, Ordering},
};
use tokio::{sync::Notify, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Idle, waiting for rows.
    Running,
    /// Writing queued batches.
    Draining,
    /// Exit requested; writing what is left in the queue.
    Stopping,
    Finished,
}

impl WorkerState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => WorkerState::Running,
            1 => WorkerState::Draining,
            2 => WorkerState::Stopping,
            _ => WorkerState::Finished,
        }
    }
}

/// State shared between a worker task and the table that feeds it.
struct Shared {
    index: usize,
    pending: RowQueue,
    failed: RowQueue,
    wake: Notify,
    exit: CancellationToken,
    state: AtomicU8,
    metrics: WriterMetrics,
}

impl Shared {
    fn set_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    /// Moves `from -> to` unless another transition got there first.
    fn advance(&self, from: WorkerState, to: WorkerState) {
        let _ = self
            .state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst);
    }
}

/// Handle to one background writer task and its queues.
pub(crate) struct Worker {
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Worker {
    pub fn spawn(index: usize, table: Arc<TableContext>, connection: Box<dyn Connection>) -> Self {
        let shared = Arc::new(Shared {
            index,
            pending: RowQueue::new(),
            failed: RowQueue::new(),
            wake: Notify::new(),
            exit: CancellationToken::new(),
            state: AtomicU8::new(WorkerState::Running as u8),
            metrics: WriterMetrics::new(),
        });

        let task = WorkerTask {
            shared: shared.clone(),
            table,
            connection: Some(connection),
        };
        let handle = tokio::spawn(task.run().in_current_span());

        Worker {
            shared,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Queues a row and wakes the worker. Wakes coalesce.
    pub fn enqueue(&self, row: Row) {
        self.shared.pending.push(row);
        self.shared.wake.notify_one();
    }

    pub fn enqueue_all(&self, rows: Vec<Row>) {
        if rows.is_empty() {
            return;
        }
        self.shared.pending.push_all(rows);
        self.shared.wake.notify_one();
    }

    /// Asks the worker to drain its queue and exit.
    pub fn stop(&self) {
        self.shared.exit.cancel();
        self.shared.advance(WorkerState::Running, WorkerState::Stopping);
        self.shared.advance(WorkerState::Draining, WorkerState::Stopping);
        self.shared.wake.notify_one();
    }

    /// Waits for the worker task to finish. Later calls return immediately.
    pub async fn join(&self) -> Result<(), WriterError> {
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.await?;
        }
        Ok(())
    }

    /// Failed rows first, then rows never sent.
    pub fn take_unwritten(&self) -> Vec<Row> {
        let mut rows = self.shared.failed.drain();
        rows.extend(self.shared.pending.drain());
        rows
    }

    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.shared.state.load(Ordering::SeqCst))
    }

    pub fn status(&self) -> WorkerStatus {
        WorkerStatus {
            index: self.shared.index,
            sent_rows: self.shared.metrics.rows_sent(),
            unsent_rows: self.shared.pending.len(),
            failed_rows: self.shared.failed.len(),
            state: self.state(),
        }
    }
}

struct WorkerTask {
    shared: Arc<Shared>,
    table: Arc<TableContext>,
    connection: Option<Box<dyn Connection>>,
}

impl WorkerTask {
    async fn run(mut self) {
        let index = self.shared.index;
        info!(table = %self.table.table_name, worker = index, "Worker started");

        loop {
            tokio::select! {
                _ = self.shared.exit.cancelled() => break,
                _ = self.shared.wake.notified() => {}
            }

            self.throttle().await;
            self.shared.advance(WorkerState::Running, WorkerState::Draining);
            while !self.shared.exit.is_cancelled() && self.table.state.is_open() {
                if !self.flush().await {
                    break;
                }
            }
            self.shared.advance(WorkerState::Draining, WorkerState::Running);
        }

        self.shared.set_state(WorkerState::Stopping);
        while self.table.state.is_open() && self.flush().await {}

        self.release_connection().await;
        self.shared.set_state(WorkerState::Finished);

        let snapshot = self.shared.metrics.snapshot();
        info!(
            table = %self.table.table_name,
            worker = index,
            rows_sent = snapshot.rows_sent,
            batches_sent = snapshot.batches_sent,
            failed_rows = snapshot.failed_rows,
            "Worker finished"
        );
    }

    /// Gives a small backlog one throttle interval to grow into a batch.
    async fn throttle(&self) {
        let batch_size = self.table.batch_size;
        let throttle = self.table.throttle;
        if batch_size <= 1 || throttle.is_zero() || self.shared.pending.len() >= batch_size {
            return;
        }

        tokio::select! {
            _ = tokio::time::sleep(throttle) => {}
            _ = self.shared.exit.cancelled() => {}
        }
    }

    /// Writes everything currently queued as one batch. Returns `false`
    /// when the queue was empty.
    async fn flush(&mut self) -> bool {
        let rows = self.shared.pending.drain();
        if rows.is_empty() {
            return false;
        }

        let count = rows.len() as u64;
        match self.write(&rows).await {
            Ok(()) => {
                self.shared.metrics.record_batch(count);
                debug!(
                    table = %self.table.table_name,
                    worker = self.shared.index,
                    rows = count,
                    "Batch written"
                );
            }
            Err(e) => self.fail(rows, e).await,
        }
        true
    }

    async fn write(&mut self, rows: &[Row]) -> Result<(), WriterError> {
        let batch = build_batch(&self.table.column_names, &self.table.column_types, rows)?;
        let connection = self
            .connection
            .as_mut()
            .ok_or(WriterError::ConnectionReleased(self.shared.index))?;

        connection
            .run_function(&self.table.insert_script, &[DataForm::Table(batch)])
            .await?;
        if let Some(script) = &self.table.follow_up {
            connection.run_script(script).await?;
        }
        Ok(())
    }

    async fn fail(&mut self, rows: Vec<Row>, e: WriterError) {
        let count = rows.len();
        self.shared.failed.push_all(rows);
        self.shared.metrics.record_failure(count as u64);

        if self.table.state.poison(e.to_string()) {
            error!(
                table = %self.table.table_name,
                worker = self.shared.index,
                rows = count,
                error = %e,
                "Failed to write batch, table stops accepting rows"
            );
        } else {
            warn!(
                table = %self.table.table_name,
                worker = self.shared.index,
                rows = count,
                error = %e,
                "Failed to write batch after the table stopped"
            );
        }

        self.release_connection().await;
    }

    async fn release_connection(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            if let Err(e) = connection.close().await {
                warn!(
                    worker = self.shared.index,
                    address = connection.address(),
                    error = %e,
                    "Failed to close worker connection"
                );
            }
        }
    }
}
