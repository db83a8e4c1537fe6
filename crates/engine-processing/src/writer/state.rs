use std::sync::{PoisonError, RwLock};

/// Lifecycle of a [`super::MultiGoroutineTable`]. `Poisoned` and `Closed`
/// are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableState {
    Open,
    /// A batch failed; holds the error text.
    Poisoned(String),
    Closed,
}

#[derive(Debug)]
pub(crate) struct StateCell {
    state: RwLock<TableState>,
}

impl StateCell {
    pub fn new() -> Self {
        StateCell {
            state: RwLock::new(TableState::Open),
        }
    }

    pub fn snapshot(&self) -> TableState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_open(&self) -> bool {
        matches!(self.snapshot(), TableState::Open)
    }

    /// Records the first failure; later ones and a closed table are ignored.
    /// Returns whether this call poisoned the table.
    pub fn poison(&self, message: impl Into<String>) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if *state != TableState::Open {
            return false;
        }
        *state = TableState::Poisoned(message.into());
        true
    }

    /// Moves an open table to `Closed`; a poisoned table keeps its error.
    pub fn close(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if *state == TableState::Open {
            *state = TableState::Closed;
        }
    }

    pub fn error_info(&self) -> String {
        match self.snapshot() {
            TableState::Poisoned(message) => message,
            _ => String::new(),
        }
    }
}
