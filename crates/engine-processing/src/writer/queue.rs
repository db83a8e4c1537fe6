use model::Row;
use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// FIFO of packed rows shared between callers and one worker.
#[derive(Debug, Default)]
pub(crate) struct RowQueue {
    rows: Mutex<VecDeque<Row>>,
}

impl RowQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, row: Row) {
        self.lock().push_back(row);
    }

    pub fn push_all(&self, rows: impl IntoIterator<Item = Row>) {
        self.lock().extend(rows);
    }

    /// Takes every queued row, oldest first.
    pub fn drain(&self) -> Vec<Row> {
        self.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Row>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::Value;

    #[test]
    fn test_drain_keeps_order() {
        let queue = RowQueue::new();
        queue.push(vec![Value::Int(1)]);
        queue.push_all([vec![Value::Int(2)], vec![Value::Int(3)]]);
        assert_eq!(queue.len(), 3);

        let rows = queue.drain();
        assert_eq!(
            rows,
            vec![vec![Value::Int(1)], vec![Value::Int(2)], vec![Value::Int(3)]]
        );
        assert_eq!(queue.len(), 0);
    }
}
