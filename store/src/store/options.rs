use std::path::PathBuf;

use crate::persistence::{changelog::ChangeWriteMode, storage::StorageEngine};

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub restore: bool,
    pub write_mode: ChangeWriteMode,
    pub storage_engine: StorageEngine,
}

// Implements: https://rust-unofficial.github.io/patterns/patterns/creational/builder.html
impl StoreOptions {
    /// Defines whether we should attempt to restore the store from a snapshot
    /// and change log on startup
    pub fn set_restore(mut self, restore: bool) -> Self {
        self.restore = restore;
        self
    }

    /// Defines whether the change log write is fsynced before a mutation is
    /// acknowledged. Durable but slow, ~3ms per sync
    pub fn set_change_write_mode(mut self, write_mode: ChangeWriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }

    pub fn set_storage_engine(mut self, storage_engine: StorageEngine) -> Self {
        self.storage_engine = storage_engine;
        self
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            restore: true,
            write_mode: ChangeWriteMode::Sync,
            storage_engine: StorageEngine::File(PathBuf::from("data")),
        }
    }
}
