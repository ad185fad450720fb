pub mod file;

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use thiserror::Error;

use crate::consts::consts::ErrorString;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Unable to initialize persistence: {0}")]
    UnableToInitializePersistence(ErrorString),

    #[error("Unable to write blob: {0}")]
    UnableToWriteBlob(ErrorString),

    #[error("Unable to read blob: {0}")]
    UnableToReadBlob(ErrorString),

    #[error("Unable to append to the change log: {0}")]
    UnableToWriteChange(ErrorString),

    #[error("Unable to sync the change log to persistent storage: {0}")]
    UnableToSyncChangeLog(ErrorString),

    #[error("Unable to flush the change log: {0}")]
    UnableToFlushChangeLog(ErrorString),

    #[error("Unable to load previous changes: {0}")]
    UnableToLoadPreviousChanges(ErrorString),

    #[error("Unable to decode persisted data: {0}")]
    UnableToDecodePersistedData(ErrorString),
}

pub enum ReadBlobState {
    Found(Vec<u8>),
    /// A blob that was never written, callers fall back to a default
    NotFound,
}

pub trait Storage {
    // Snapshot
    fn write_blob(&self, path: String, bytes: Vec<u8>) -> StorageResult<()>;
    fn read_blob(&self, path: String) -> StorageResult<ReadBlobState>;
    fn init(&self) -> StorageResult<()>;
    fn reset(&mut self) -> StorageResult<()>;

    // Change log
    fn change_write(&mut self, change: &[u8]) -> StorageResult<()>;
    fn change_sync(&self) -> StorageResult<()>;
    fn change_flush(&mut self) -> StorageResult<()>;
    fn change_load(&mut self) -> StorageResult<String>;
}

pub fn io_to_generic_error(error: std::io::Error) -> ErrorString {
    format!("{}", error)
}

#[derive(Debug, Clone)]
pub enum StorageEngine {
    File(PathBuf),
}

impl StorageEngine {
    pub fn get_engine(engine: &StorageEngine) -> Arc<Mutex<dyn Storage + Sync + Send>> {
        match engine {
            StorageEngine::File(base_path) => {
                Arc::new(Mutex::new(file::FileStorage::new(base_path.clone())))
            }
        }
    }
}
