//! # Snapshot cells
//!
//! Pose and target data are produced asynchronously to the control tick. They are shared through a
//! snapshot cell: a single producer publishes whole values, any number of consumers read the most
//! recent value. There is no queueing, the last value wins, and a read always returns a complete
//! record as published (never a mix of two publications).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A value as published into a snapshot cell.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    /// The published value
    pub value: T,

    /// Publication sequence number, starting at 1 for the first publication
    pub seq: u64,

    /// Instant at which the value was published
    pub stamp: Instant,
}

/// The write half of a snapshot cell. There is exactly one writer per cell.
#[derive(Debug)]
pub struct SnapshotWriter<T> {
    cell: Arc<Mutex<Option<Snapshot<T>>>>,
}

/// The read half of a snapshot cell. Readers can be freely cloned.
#[derive(Debug)]
pub struct SnapshotReader<T> {
    cell: Arc<Mutex<Option<Snapshot<T>>>>,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Create a new, empty snapshot cell.
pub fn snapshot_cell<T>() -> (SnapshotWriter<T>, SnapshotReader<T>) {
    let cell = Arc::new(Mutex::new(None));

    (
        SnapshotWriter { cell: cell.clone() },
        SnapshotReader { cell },
    )
}

/// Lock the cell, recovering the data if a previous holder panicked. Values are only ever replaced
/// whole so a poisoned cell still holds a complete record.
fn lock<T>(cell: &Mutex<Option<Snapshot<T>>>) -> MutexGuard<'_, Option<Snapshot<T>>> {
    match cell.lock() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<T> SnapshotWriter<T> {
    /// Publish a new value, replacing the previous one.
    pub fn publish(&mut self, value: T) {
        let mut slot = lock(&self.cell);

        let seq = slot.as_ref().map(|s| s.seq + 1).unwrap_or(1);

        *slot = Some(Snapshot {
            value,
            seq,
            stamp: Instant::now(),
        });
    }

    /// Get a new reader for this cell.
    pub fn reader(&self) -> SnapshotReader<T> {
        SnapshotReader {
            cell: self.cell.clone(),
        }
    }
}

impl<T: Clone> SnapshotReader<T> {
    /// Get a copy of the most recently published snapshot, or `None` if nothing has been published
    /// yet.
    pub fn latest(&self) -> Option<Snapshot<T>> {
        lock(&self.cell).clone()
    }

    /// Get a copy of the most recently published value.
    pub fn latest_value(&self) -> Option<T> {
        lock(&self.cell).as_ref().map(|s| s.value.clone())
    }
}

impl<T> Clone for SnapshotReader<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}
