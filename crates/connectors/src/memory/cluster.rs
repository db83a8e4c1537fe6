use crate::{
    connection::{Connection, Dialer},
    error::ConnectionError,
    memory::{
        connection::MemoryConnection,
        script::{Request, split_partial, storage_key, table_key},
    },
};
use async_trait::async_trait;
use model::{ColumnType, DataForm, DataType, Dictionary, Table, Value, Vector};
use partition::PartitionType;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tracing::debug;

/// One partition level of a stored table.
#[derive(Debug, Clone)]
pub struct PartitionLevel {
    pub column: String,
    pub partition_type: PartitionType,
    pub schema: DataForm,
}

#[derive(Debug, Clone)]
pub struct TableDefinition {
    columns: Vec<(String, ColumnType)>,
    partitions: Vec<PartitionLevel>,
}

impl TableDefinition {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, ColumnType)>,
        S: Into<String>,
    {
        TableDefinition {
            columns: columns
                .into_iter()
                .map(|(name, column_type)| (name.into(), column_type))
                .collect(),
            partitions: Vec::new(),
        }
    }

    /// Adds a partition level; two or more levels make a composite table.
    pub fn partitioned_by(
        mut self,
        column: impl Into<String>,
        partition_type: PartitionType,
        schema: DataForm,
    ) -> Self {
        self.partitions.push(PartitionLevel {
            column: column.into(),
            partition_type,
            schema,
        });
        self
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _)| n == name)
    }

    fn empty_table(&self) -> Result<Table, ConnectionError> {
        let names = self.columns.iter().map(|(n, _)| n.clone()).collect();
        let columns = self.columns.iter().map(|(_, t)| Vector::new(*t)).collect();
        Ok(Table::new(names, columns)?)
    }
}

/// A server call as observed by the cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    pub address: String,
    pub request: String,
}

struct StoredTable {
    definition: TableDefinition,
    data: Table,
}

struct InsertFailure {
    after: usize,
    message: String,
}

#[derive(Default)]
struct Faults {
    refuse_all: bool,
    refused_addresses: Vec<String>,
    rejected_values: Vec<Value>,
    insert_failure: Option<InsertFailure>,
    latency: Duration,
}

#[derive(Default)]
struct Stats {
    dialed: Vec<String>,
    closed: usize,
    calls: Vec<CallRecord>,
    in_flight: usize,
    max_in_flight: usize,
}

#[derive(Default)]
struct ClusterState {
    tables: HashMap<String, StoredTable>,
    live_nodes: Vec<String>,
    scripts: HashMap<String, DataForm>,
    faults: Faults,
    stats: Stats,
}

/// Shared in-memory cluster. Clones observe the same state.
#[derive(Clone, Default)]
pub struct MemoryCluster {
    state: Arc<Mutex<ClusterState>>,
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_table(
        &self,
        database: Option<&str>,
        name: &str,
        definition: TableDefinition,
    ) -> Result<(), ConnectionError> {
        for level in &definition.partitions {
            if definition.column_index(&level.column).is_none() {
                return Err(ConnectionError::Server(format!(
                    "partition column {} is not a column of {name}",
                    level.column
                )));
            }
        }

        let data = definition.empty_table()?;
        self.lock().tables.insert(
            storage_key(database, name),
            StoredTable { definition, data },
        );
        Ok(())
    }

    /// Rows appended so far.
    pub fn table(&self, database: Option<&str>, name: &str) -> Option<Table> {
        self.lock()
            .tables
            .get(&storage_key(database, name))
            .map(|t| t.data.clone())
    }

    /// Entries reported by the live data node query, as `host:port:alias`.
    pub fn set_live_nodes<I, S>(&self, nodes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock().live_nodes = nodes.into_iter().map(Into::into).collect();
    }

    /// Fixed response for a script the cluster would not otherwise recognise.
    pub fn register_script(&self, script: impl Into<String>, response: DataForm) {
        self.lock().scripts.insert(script.into(), response);
    }

    /// Delay applied to every call before it is answered.
    pub fn set_latency(&self, latency: Duration) {
        self.lock().faults.latency = latency;
    }

    /// Inserts containing `value` in any cell fail.
    pub fn reject_value(&self, value: Value) {
        self.lock().faults.rejected_values.push(value);
    }

    /// Every insert after the next `after` successful ones fails.
    pub fn fail_inserts_after(&self, after: usize, message: impl Into<String>) {
        self.lock().faults.insert_failure = Some(InsertFailure {
            after,
            message: message.into(),
        });
    }

    pub fn clear_faults(&self) {
        let mut state = self.lock();
        let latency = state.faults.latency;
        state.faults = Faults {
            latency,
            ..Faults::default()
        };
    }

    pub fn refuse_connections(&self, refuse: bool) {
        self.lock().faults.refuse_all = refuse;
    }

    pub fn refuse_address(&self, address: impl Into<String>) {
        self.lock().faults.refused_addresses.push(address.into());
    }

    pub fn dialer(&self) -> MemoryDialer {
        MemoryDialer {
            cluster: self.clone(),
        }
    }

    /// Addresses of every connection opened so far, in order.
    pub fn dialed_addresses(&self) -> Vec<String> {
        self.lock().stats.dialed.clone()
    }

    pub fn opened_connections(&self) -> usize {
        self.lock().stats.dialed.len()
    }

    pub fn closed_connections(&self) -> usize {
        self.lock().stats.closed
    }

    pub fn open_connections(&self) -> usize {
        let state = self.lock();
        state.stats.dialed.len().saturating_sub(state.stats.closed)
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.lock().stats.calls.clone()
    }

    /// Highest number of calls observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.lock().stats.max_in_flight
    }

    pub(crate) fn open(&self, address: &str) -> Result<MemoryConnection, ConnectionError> {
        let mut state = self.lock();
        let refused =
            state.faults.refuse_all || state.faults.refused_addresses.iter().any(|a| a == address);
        if refused {
            return Err(ConnectionError::Connect {
                address: address.to_string(),
                reason: "connection refused".to_string(),
            });
        }

        state.stats.dialed.push(address.to_string());
        debug!(address, "Opened in-memory connection");
        Ok(MemoryConnection::new(self.clone(), address))
    }

    pub(crate) fn connection_closed(&self) {
        self.lock().stats.closed += 1;
    }

    pub(crate) async fn call(
        &self,
        address: &str,
        request: Request<'_>,
    ) -> Result<DataForm, ConnectionError> {
        let latency = {
            let mut state = self.lock();
            state.stats.calls.push(CallRecord {
                address: address.to_string(),
                request: request.to_string(),
            });
            state.stats.in_flight += 1;
            state.stats.max_in_flight = state.stats.max_in_flight.max(state.stats.in_flight);
            state.faults.latency
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.lock();
        state.stats.in_flight -= 1;
        match request {
            Request::Script(script) => state.run_script(script),
            Request::Function { name, args } => state.run_function(name, args),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ClusterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ClusterState {
    fn run_script(&mut self, script: &str) -> Result<DataForm, ConnectionError> {
        if let Some(response) = self.scripts.get(script) {
            return Ok(response.clone());
        }

        if script.contains("getClusterLiveDataNodes") {
            let nodes = self
                .live_nodes
                .iter()
                .map(|n| Value::String(n.clone()))
                .collect();
            return Ok(DataForm::Vector(Vector::from_values(
                ColumnType::Scalar(DataType::String),
                nodes,
            )?));
        }

        if let Some(reference) = script
            .trim()
            .strip_prefix("schema(")
            .and_then(|s| s.strip_suffix(')'))
        {
            let table = self.lookup(reference)?;
            return schema_form(&table.definition);
        }

        Err(ConnectionError::Server(format!(
            "Syntax Error: cannot recognize the token {script}"
        )))
    }

    fn run_function(
        &mut self,
        function: &str,
        args: &[DataForm],
    ) -> Result<DataForm, ConnectionError> {
        let (name, reference) = split_partial(function).ok_or_else(|| {
            ConnectionError::Server(format!("Can't recognize function name {function}"))
        })?;

        match name {
            "tableInsert" => {
                let rows = self.insert(reference, args)?;
                Ok(DataForm::Scalar(Value::Int(rows as i32)))
            }
            "append!" => {
                self.insert(reference, args)?;
                Ok(DataForm::Void)
            }
            other => Err(ConnectionError::Server(format!(
                "Can't recognize function name {other}"
            ))),
        }
    }

    fn insert(&mut self, reference: &str, args: &[DataForm]) -> Result<usize, ConnectionError> {
        let incoming = match args {
            [DataForm::Table(table)] => table,
            _ => {
                return Err(ConnectionError::Server(
                    "tableInsert expects a single table argument".to_string(),
                ));
            }
        };

        if let Some(failure) = self.faults.insert_failure.as_mut() {
            if failure.after == 0 {
                return Err(ConnectionError::Server(failure.message.clone()));
            }
            failure.after -= 1;
        }

        if let Some(value) = self
            .faults
            .rejected_values
            .iter()
            .find(|v| incoming.columns().iter().any(|c| c.values().contains(*v)))
        {
            return Err(ConnectionError::Server(format!(
                "The server rejected value {value}"
            )));
        }

        let key = table_key(reference)
            .ok_or_else(|| ConnectionError::Server(format!("invalid table {reference}")))?;
        let stored = self
            .tables
            .get_mut(&key)
            .ok_or_else(|| ConnectionError::Server(format!("Can't find table {key}")))?;

        if incoming.column_count() != stored.definition.columns.len() {
            return Err(ConnectionError::Server(
                "The number of columns of the table to insert must be the same as that of the original table."
                    .to_string(),
            ));
        }

        for ((name, expected), column) in stored.definition.columns.iter().zip(incoming.columns()) {
            if column.column_type() != *expected {
                return Err(ConnectionError::Server(format!(
                    "Failed to append data to column '{name}': expect {expected}, got {}",
                    column.column_type()
                )));
            }
        }

        stored.data.append(incoming)?;
        Ok(incoming.rows())
    }

    fn lookup(&self, reference: &str) -> Result<&StoredTable, ConnectionError> {
        table_key(reference)
            .and_then(|key| self.tables.get(&key))
            .ok_or_else(|| ConnectionError::Server(format!("Can't find table {reference}")))
    }
}

fn schema_form(definition: &TableDefinition) -> Result<DataForm, ConnectionError> {
    let names = definition
        .columns
        .iter()
        .map(|(n, _)| Value::String(n.clone()))
        .collect();
    let type_names = definition
        .columns
        .iter()
        .map(|(_, t)| Value::String(t.to_string()))
        .collect();
    let type_codes = definition
        .columns
        .iter()
        .map(|(_, t)| Value::Int(t.code()))
        .collect();

    let col_defs = Table::new(
        vec!["name".into(), "typeString".into(), "typeInt".into()],
        vec![
            Vector::from_values(ColumnType::Scalar(DataType::String), names)?,
            Vector::from_values(ColumnType::Scalar(DataType::String), type_names)?,
            Vector::from_values(ColumnType::Scalar(DataType::Int), type_codes)?,
        ],
    )?;

    let mut dict = Dictionary::new();
    dict.insert("colDefs", DataForm::Table(col_defs));

    let mut levels = Vec::with_capacity(definition.partitions.len());
    for level in &definition.partitions {
        let index = definition.column_index(&level.column).ok_or_else(|| {
            ConnectionError::Server(format!("unknown partition column {}", level.column))
        })?;
        levels.push((level, index, definition.columns[index].1));
    }

    match levels.as_slice() {
        [] => {}
        [(level, index, column_type)] => {
            dict.insert(
                "partitionColumnName",
                DataForm::Scalar(Value::String(level.column.clone())),
            );
            dict.insert("partitionColumnIndex", DataForm::Scalar(Value::Int(*index as i32)));
            dict.insert(
                "partitionType",
                DataForm::Scalar(Value::Int(level.partition_type.code())),
            );
            dict.insert("partitionSchema", level.schema.clone());
            dict.insert(
                "partitionColumnType",
                DataForm::Scalar(Value::Int(column_type.code())),
            );
        }
        many => {
            let strings = |values: Vec<Value>| {
                Vector::from_values(ColumnType::Scalar(DataType::String), values)
            };
            let ints =
                |values: Vec<Value>| Vector::from_values(ColumnType::Scalar(DataType::Int), values);

            let names = many.iter().map(|(l, _, _)| Value::String(l.column.clone())).collect();
            let indices = many.iter().map(|(_, i, _)| Value::Int(*i as i32)).collect();
            let types = many
                .iter()
                .map(|(l, _, _)| Value::Int(l.partition_type.code()))
                .collect();
            let column_types = many.iter().map(|(_, _, t)| Value::Int(t.code())).collect();
            let schemas = many
                .iter()
                .map(|(l, _, _)| l.schema.clone().into_value())
                .collect::<Result<Vec<_>, _>>()?;

            dict.insert("partitionColumnName", DataForm::Vector(strings(names)?));
            dict.insert("partitionColumnIndex", DataForm::Vector(ints(indices)?));
            dict.insert("partitionType", DataForm::Vector(ints(types)?));
            dict.insert(
                "partitionSchema",
                DataForm::Vector(Vector::from_values(ColumnType::Scalar(DataType::Any), schemas)?),
            );
            dict.insert("partitionColumnType", DataForm::Vector(ints(column_types)?));
        }
    }

    Ok(DataForm::Dictionary(dict))
}

#[derive(Clone)]
pub struct MemoryDialer {
    cluster: MemoryCluster,
}

#[async_trait]
impl Dialer for MemoryDialer {
    async fn dial(&self, address: &str) -> Result<Box<dyn Connection>, ConnectionError> {
        let connection = self.cluster.open(address)?;
        Ok(Box::new(connection))
    }
}
