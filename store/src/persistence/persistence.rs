use std::sync::{Arc, Mutex};

use crate::store::options::StoreOptions;

use super::{
    changelog::{ChangeLog, ChangeWriteMode},
    snapshot::SnapshotManager,
    storage::{Storage, StorageEngine, StorageResult},
};

// TODO: Do not expose the underlying change log / snapshot manager
pub struct Persistence {
    pub change_log: ChangeLog,
    pub snapshot_manager: SnapshotManager,
    storage: Arc<Mutex<dyn Storage + Sync + Send>>,
}

impl Persistence {
    pub fn new(options: &StoreOptions) -> Self {
        let storage = StorageEngine::get_engine(&options.storage_engine);

        Persistence::with_storage(options.write_mode.clone(), storage)
    }

    /// Seam for tests and alternative engines
    pub fn with_storage(
        write_mode: ChangeWriteMode,
        storage: Arc<Mutex<dyn Storage + Sync + Send>>,
    ) -> Self {
        Self {
            change_log: ChangeLog::new(write_mode, storage.clone()),
            snapshot_manager: SnapshotManager::new(storage.clone()),
            storage,
        }
    }

    pub fn init(&self) -> StorageResult<()> {
        self.storage.lock().unwrap().init()
    }

    pub fn reset(&self) -> StorageResult<()> {
        self.storage.lock().unwrap().reset()
    }
}
