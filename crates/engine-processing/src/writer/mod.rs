//! Multi-worker table writer.
//!
//! Rows are packed on insert, routed to a worker by partition (or by hash
//! of a column for non-partitioned tables) and written by that worker in
//! batches over its own connection. The first failed batch poisons the
//! table: later inserts are refused and the rows stay available through
//! [`MultiGoroutineTable::get_unwritten_data`].

mod batch;
mod queue;
mod state;
pub mod status;
mod worker;

pub use state::TableState;
pub use worker::WorkerState;

use crate::error::WriterError;
use connectors::{Connection, Dialer};
use engine_config::WriterOptions;
use engine_core::schema::{PartitionLayout, TableSchema, schema_script};
use model::{ColumnType, ModelError, RawValue, Row, Value, Vector};
use partition::{Domain, PartitionDomain};
use state::StateCell;
use status::Status;
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};
use worker::Worker;

/// Everything the workers need to know about the target table.
pub(crate) struct TableContext {
    pub table_name: String,
    pub column_names: Vec<String>,
    pub column_types: Vec<ColumnType>,
    pub insert_script: String,
    pub follow_up: Option<String>,
    pub batch_size: usize,
    pub throttle: Duration,
    pub state: StateCell,
}

#[derive(Debug)]
enum Routing {
    Single,
    Partitioned { column: usize, domain: Domain },
    Hashed { column: usize },
}

/// Writes rows into one table through several workers, each owning a
/// connection. Rows routed to the same worker keep their insert order.
pub struct MultiGoroutineTable {
    context: Arc<TableContext>,
    routing: Routing,
    workers: Vec<Worker>,
}

impl MultiGoroutineTable {
    pub async fn new(options: WriterOptions, dialer: &dyn Dialer) -> Result<Self, WriterError> {
        options.validate()?;

        let schema = fetch_schema(&options, dialer).await?;
        let routing = resolve_routing(&schema, &options)?;

        let insert_script = match options.database() {
            Some(db) => format!("tableInsert{{loadTable(\"{db}\",\"{}\")}}", options.table_name),
            None => format!("tableInsert{{\"{}\"}}", options.table_name),
        };

        let mut connections = Vec::with_capacity(options.goroutine_count);
        for _ in 0..options.goroutine_count {
            match dialer.dial(&options.address).await {
                Ok(connection) => connections.push(connection),
                Err(e) => {
                    warn!(
                        address = %options.address,
                        error = %e,
                        "Failed to open worker connection"
                    );
                    close_all(connections).await;
                    return Err(e.into());
                }
            }
        }

        let context = Arc::new(TableContext {
            table_name: options.table_name.clone(),
            column_names: schema.column_names(),
            column_types: schema.column_types(),
            insert_script,
            follow_up: options.follow_up().map(str::to_string),
            batch_size: options.batch_size,
            throttle: options.throttle_duration(),
            state: StateCell::new(),
        });

        let workers = connections
            .into_iter()
            .enumerate()
            .map(|(index, connection)| Worker::spawn(index, context.clone(), connection))
            .collect::<Vec<_>>();

        info!(
            table = %options.table_name,
            workers = workers.len(),
            batch_size = options.batch_size,
            throttle_ms = options.throttle,
            routing = ?routing,
            "Multi-worker table writer started"
        );

        Ok(MultiGoroutineTable {
            context,
            routing,
            workers,
        })
    }

    /// Packs one row of host values and queues it on its worker.
    pub fn insert(&self, row: Vec<RawValue>) -> Result<(), WriterError> {
        self.ensure_open()?;
        if row.len() != self.context.column_types.len() {
            return Err(WriterError::ColumnCountMismatch);
        }

        let packed = row
            .into_iter()
            .zip(&self.context.column_types)
            .map(|(raw, column_type)| Value::pack(*column_type, raw))
            .collect::<Result<Row, _>>()?;

        let index = self.route(&packed)?;
        self.workers[index].enqueue(packed);
        Ok(())
    }

    /// Queues rows returned by [`Self::get_unwritten_data`], routed the same
    /// way as [`Self::insert`]. Nothing is queued if any row is invalid.
    pub fn insert_unwritten_data(&self, rows: Vec<Row>) -> Result<(), WriterError> {
        self.ensure_open()?;
        if rows.is_empty() {
            return Ok(());
        }

        let probes: Vec<Vector> = self
            .context
            .column_types
            .iter()
            .map(|t| Vector::new(*t))
            .collect();
        for row in &rows {
            if row.len() != probes.len() {
                return Err(WriterError::ColumnCountMismatch);
            }
            if let Some((cell, probe)) = row.iter().zip(&probes).find(|(c, p)| !p.accepts(c)) {
                return Err(ModelError::TypeMismatch {
                    expected: probe.column_type().to_string(),
                    actual: cell.type_name().to_string(),
                }
                .into());
            }
        }

        let indices = self.route_all(&rows)?;
        let mut grouped: Vec<Vec<Row>> = vec![Vec::new(); self.workers.len()];
        for (row, index) in rows.into_iter().zip(indices) {
            grouped[index].push(row);
        }
        for (worker, rows) in self.workers.iter().zip(grouped) {
            worker.enqueue_all(rows);
        }
        Ok(())
    }

    /// Takes every failed and unsent row out of the workers' queues.
    pub fn get_unwritten_data(&self) -> Vec<Row> {
        self.workers
            .iter()
            .flat_map(Worker::take_unwritten)
            .collect()
    }

    /// Stops every worker after it drains its queue, waits for them and
    /// closes the table. Rows left behind by a poisoned table stay
    /// available through [`Self::get_unwritten_data`].
    pub async fn wait_for_completion(&self) -> Result<(), WriterError> {
        for worker in &self.workers {
            worker.stop();
        }

        let mut first_error = None;
        for worker in &self.workers {
            if let Err(e) = worker.join().await {
                warn!(
                    table = %self.context.table_name,
                    error = %e,
                    "Worker did not finish cleanly"
                );
                first_error.get_or_insert(e);
            }
        }
        self.context.state.close();

        let status = self.status();
        info!(
            table = %self.context.table_name,
            sent_rows = status.sent_rows,
            unsent_rows = status.unsent_rows,
            failed_rows = status.failed_rows,
            "Multi-worker table writer closed"
        );

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn status(&self) -> Status {
        Status::new(
            self.context.state.error_info(),
            !self.context.state.is_open(),
            self.workers.iter().map(Worker::status).collect(),
        )
    }

    pub fn state(&self) -> TableState {
        self.context.state.snapshot()
    }

    pub fn column_names(&self) -> &[String] {
        &self.context.column_names
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    fn ensure_open(&self) -> Result<(), WriterError> {
        if self.context.state.is_open() {
            Ok(())
        } else {
            Err(WriterError::NotOpen)
        }
    }

    fn route(&self, row: &Row) -> Result<usize, WriterError> {
        let workers = self.workers.len();
        match &self.routing {
            Routing::Single => Ok(0),
            Routing::Partitioned { column, domain } => {
                let value = &row[*column];
                if value.is_null() {
                    return Ok(0);
                }
                let cell =
                    Vector::from_values(self.context.column_types[*column], vec![value.clone()])?;
                let keys = domain.partition_keys(&cell)?;
                let key = keys.first().ok_or(WriterError::PartitionSchemeUnavailable)?;
                Ok(worker_index(i64::from(*key), workers))
            }
            Routing::Hashed { column } => Ok(hashed_index(&row[*column], workers)),
        }
    }

    fn route_all(&self, rows: &[Row]) -> Result<Vec<usize>, WriterError> {
        let workers = self.workers.len();
        match &self.routing {
            Routing::Single => Ok(vec![0; rows.len()]),
            Routing::Partitioned { column, domain } => {
                let cells = rows.iter().map(|row| row[*column].clone()).collect();
                let cells = Vector::from_values(self.context.column_types[*column], cells)?;
                let keys = domain.partition_keys(&cells)?;
                if keys.len() != rows.len() {
                    return Err(WriterError::PartitionSchemeUnavailable);
                }
                Ok(rows
                    .iter()
                    .zip(keys)
                    .map(|(row, key)| {
                        if row[*column].is_null() {
                            0
                        } else {
                            worker_index(i64::from(key), workers)
                        }
                    })
                    .collect())
            }
            Routing::Hashed { column } => Ok(rows
                .iter()
                .map(|row| hashed_index(&row[*column], workers))
                .collect()),
        }
    }
}

impl Drop for MultiGoroutineTable {
    fn drop(&mut self) {
        for worker in &self.workers {
            worker.stop();
        }
    }
}

/// Negative keys go to the first worker.
pub(crate) fn worker_index(key: i64, workers: usize) -> usize {
    match u64::try_from(key) {
        Ok(key) if workers > 0 => (key % workers as u64) as usize,
        _ => 0,
    }
}

fn hashed_index(value: &Value, workers: usize) -> usize {
    if value.is_null() {
        return 0;
    }
    let buckets = i32::try_from(workers).unwrap_or(i32::MAX);
    worker_index(i64::from(value.hash_bucket(buckets)), workers)
}

async fn fetch_schema(
    options: &WriterOptions,
    dialer: &dyn Dialer,
) -> Result<TableSchema, WriterError> {
    let mut connection = dialer.dial(&options.address).await?;
    let response = connection
        .run_script(&schema_script(options.database(), &options.table_name))
        .await;
    if let Err(e) = connection.close().await {
        warn!(address = %options.address, error = %e, "Failed to close schema connection");
    }

    Ok(TableSchema::from_form(&response?)?)
}

fn resolve_routing(schema: &TableSchema, options: &WriterOptions) -> Result<Routing, WriterError> {
    let workers = options.goroutine_count;

    let Some(layout) = &schema.partition else {
        if options.database().is_some() && workers > 1 {
            return Err(WriterError::DimensionTable);
        }
        return match options.partition_column() {
            Some(name) => {
                let column = schema
                    .column_index(name)
                    .ok_or_else(|| WriterError::RoutingColumnNotFound(name.to_string()))?;
                Ok(if workers > 1 {
                    Routing::Hashed { column }
                } else {
                    Routing::Single
                })
            }
            None => Ok(Routing::Single),
        };
    };

    let level = match layout {
        PartitionLayout::Single(level) => {
            if level.column != options.partition_col {
                return Err(WriterError::NotPartitionColumn(level.column.clone()));
            }
            0
        }
        PartitionLayout::Composite(levels) => {
            if levels.len() > 1 && options.partition_col.is_empty() {
                return Err(WriterError::PartitionColumnRequired);
            }
            levels
                .iter()
                .position(|l| l.column == options.partition_col)
                .ok_or(WriterError::NotPartitioningColumns)?
        }
    };

    let column = layout.levels()[level].column_index;
    let domain = schema.partition_domain(level)?;
    Ok(if workers > 1 {
        Routing::Partitioned { column, domain }
    } else {
        Routing::Single
    })
}

async fn close_all(connections: Vec<Box<dyn Connection>>) {
    for mut connection in connections {
        if let Err(e) = connection.close().await {
            warn!(address = connection.address(), error = %e, "Failed to close connection");
        }
    }
}
