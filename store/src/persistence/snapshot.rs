use std::sync::{Arc, Mutex};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{consts::consts::SequenceId, model::person::Person, store::table::PersonTable};

use super::storage::{ReadBlobState, Storage, StorageError, StorageResult};

#[derive(Debug)]
enum FileType {
    Metadata,
    Snapshot,
}

impl FileType {
    fn as_str(&self) -> &'static str {
        match self {
            FileType::Metadata => "metadata",
            FileType::Snapshot => "snapshot",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Metadata {
    /// Sequence of the last change covered by the snapshot. Changes at or
    /// below this are skipped during replay.
    pub current_sequence_id: SequenceId,
}

pub struct SnapshotManager {
    storage: Arc<Mutex<dyn Storage + Sync + Send>>,
}

impl SnapshotManager {
    pub fn new(storage: Arc<Mutex<dyn Storage + Sync + Send>>) -> Self {
        Self { storage }
    }

    #[tracing::instrument(skip(self, table))]
    pub fn restore_snapshot(&self, table: &mut PersonTable) -> StorageResult<(usize, Metadata)> {
        let records: Vec<Person> = self.read_file(FileType::Snapshot)?;

        let snapshot_count = records.len();

        table.restore_table(records);

        let metadata: Metadata = self.read_file(FileType::Metadata)?;

        Ok((snapshot_count, metadata))
    }

    #[tracing::instrument(skip(self, table))]
    pub fn create_snapshot(
        &self,
        table: &PersonTable,
        sequence_id: SequenceId,
    ) -> StorageResult<()> {
        self.write_file(FileType::Snapshot, table.all_records())?;

        self.write_file(
            FileType::Metadata,
            &Metadata {
                current_sequence_id: sequence_id,
            },
        )?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn read_file<T: DeserializeOwned + Default>(&self, file_path: FileType) -> StorageResult<T> {
        let result = self
            .storage
            .lock()
            .unwrap()
            .read_blob(file_path.as_str().to_string())?;

        match result {
            ReadBlobState::Found(file_contents) => serde_json::from_slice(&file_contents)
                .map_err(|e| StorageError::UnableToDecodePersistedData(e.to_string())),
            ReadBlobState::NotFound => Ok(T::default()),
        }
    }

    #[tracing::instrument(skip(self, data))]
    fn write_file<T: Serialize>(&self, file_path: FileType, data: T) -> StorageResult<()> {
        let serialized_data = serde_json::to_string::<T>(&data)
            .map_err(|e| StorageError::UnableToWriteBlob(e.to_string()))?;

        self.storage
            .lock()
            .unwrap()
            .write_blob(file_path.as_str().to_string(), serialized_data.into_bytes())
    }
}
