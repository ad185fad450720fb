use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::consts::consts::SequenceId;
use crate::model::statement::Statement;

use super::storage::{Storage, StorageError, StorageResult};

#[derive(Debug, Clone, PartialEq)]
pub enum ChangeWriteMode {
    /// Appends and fsyncs before the mutation is acknowledged, ~3ms per sync
    Sync,
    /// Appends and lets the OS buffer the write
    Buffered,
    /// Used for testing purposes, skips the log entirely
    Off,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Change {
    pub sequence: SequenceId,
    pub statement: Statement,
}

/// Append-only log of committed mutations. Replayed over the latest snapshot
/// on start-up to rebuild the table.
///
/// Appends happen on the store thread before a mutation is acknowledged, so a
/// storage failure is reported to the caller of that exact statement.
pub struct ChangeLog {
    write_mode: ChangeWriteMode,
    current_sequence: LocalClock,
    size: AtomicUsize,
    storage: Arc<Mutex<dyn Storage + Sync + Send>>,
}

impl ChangeLog {
    pub fn new(
        write_mode: ChangeWriteMode,
        storage: Arc<Mutex<dyn Storage + Sync + Send>>,
    ) -> Self {
        Self {
            write_mode,
            current_sequence: LocalClock::new(),
            size: AtomicUsize::new(0),
            storage,
        }
    }

    pub fn commit(&self, sequence: SequenceId, statement: Statement) -> StorageResult<()> {
        if self.write_mode != ChangeWriteMode::Off {
            let change_json_line = format!(
                "{}\n",
                serde_json::to_string(&Change {
                    sequence,
                    statement,
                })
                .map_err(|e| StorageError::UnableToWriteChange(e.to_string()))?
            );

            let mut storage = self.storage.lock().unwrap();

            storage.change_write(change_json_line.as_bytes())?;

            // https://www.postgresql.org/docs/current/wal-reliability.html
            if self.write_mode == ChangeWriteMode::Sync {
                storage.change_sync()?;
            }
        }

        self.size.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }

    pub fn restore(&self) -> StorageResult<Vec<Change>> {
        let mut changes: Vec<Change> = vec![];

        let changes_data = self.storage.lock().unwrap().change_load()?;

        for change_line in changes_data.split('\n') {
            if change_line.is_empty() {
                continue;
            }

            changes.push(
                serde_json::from_str(change_line)
                    .map_err(|e| StorageError::UnableToDecodePersistedData(e.to_string()))?,
            );
        }

        Ok(changes)
    }

    /// Current state has been snapshotted, the logged changes can be discarded
    pub fn flush_changes(&self) -> StorageResult<usize> {
        let flushed_size = self.size.load(Ordering::SeqCst);

        self.size.store(0, Ordering::SeqCst);

        self.storage.lock().unwrap().change_flush()?;

        Ok(flushed_size)
    }

    pub fn get_increment_current_sequence_id(&self) -> SequenceId {
        self.current_sequence.get_next()
    }

    pub fn get_current_sequence_id(&self) -> SequenceId {
        self.current_sequence.get()
    }

    pub fn set_current_sequence_id(&self, sequence: SequenceId) {
        self.current_sequence.set(sequence.to_number())
    }

    pub fn get_log_size(&self) -> usize {
        self.size.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct LocalClock {
    sequence: AtomicUsize,
}

impl LocalClock {
    pub fn new() -> Self {
        Self {
            sequence: AtomicUsize::new(0),
        }
    }

    // It is unlikely we need `SeqCst`, Acq / Rel should be sufficient
    fn get_next(&self) -> SequenceId {
        SequenceId(self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn get(&self) -> SequenceId {
        SequenceId(self.sequence.load(Ordering::SeqCst))
    }

    fn set(&self, value: usize) {
        self.sequence.store(value, Ordering::SeqCst);
    }
}
