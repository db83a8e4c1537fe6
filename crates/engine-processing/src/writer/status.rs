use crate::writer::worker::WorkerState;
use serde::Serialize;
use std::fmt;

/// Point-in-time view of a writer and its workers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    /// Error text of the batch that poisoned the table, if any.
    pub error_message: String,
    /// Whether the table stopped accepting rows.
    pub is_exit: bool,
    pub sent_rows: u64,
    pub unsent_rows: usize,
    pub failed_rows: usize,
    pub workers: Vec<WorkerStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerStatus {
    pub index: usize,
    pub sent_rows: u64,
    pub unsent_rows: usize,
    pub failed_rows: usize,
    pub state: WorkerState,
}

impl Status {
    pub(crate) fn new(error_message: String, is_exit: bool, workers: Vec<WorkerStatus>) -> Self {
        Status {
            error_message,
            is_exit,
            sent_rows: workers.iter().map(|w| w.sent_rows).sum(),
            unsent_rows: workers.iter().map(|w| w.unsent_rows).sum(),
            failed_rows: workers.iter().map(|w| w.failed_rows).sum(),
            workers,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "errMsg         :  {}", self.error_message)?;
        writeln!(f, "isExit         :  {}", self.is_exit)?;
        writeln!(f, "sentRows       :  {}", self.sent_rows)?;
        writeln!(f, "unsentRows     :  {}", self.unsent_rows)?;
        writeln!(f, "sendFailedRows :  {}", self.failed_rows)?;
        writeln!(f, "goroutineStatus   :")?;
        for worker in &self.workers {
            writeln!(f, "    {worker}")?;
        }
        Ok(())
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "goroutineIndex: {}, sentRows: {}, unsentRows: {}, sendFailedRows: {}",
            self.index, self.sent_rows, self.unsent_rows, self.failed_rows
        )
    }
}
