use std::{
    fs::{self, File, OpenOptions},
    io::{Read, Write},
    path::PathBuf,
};

use super::{io_to_generic_error, ReadBlobState, Storage, StorageError, StorageResult};

pub struct FileStorage {
    base_path: PathBuf,
    change_log_path: PathBuf,
    change_log_file: Option<File>,
}

impl FileStorage {
    pub fn new(base_path: PathBuf) -> Self {
        let change_log_path = base_path.join("changes.json");

        Self {
            base_path,
            change_log_path,
            change_log_file: None,
        }
    }

    fn get_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }

    /// Lazily opens the append handle so construction never touches the disk
    fn open_change_log(&mut self) -> StorageResult<&mut File> {
        if self.change_log_file.is_none() {
            fs::create_dir_all(&self.base_path)
                .map_err(|e| StorageError::UnableToInitializePersistence(io_to_generic_error(e)))?;

            let log_file = OpenOptions::new()
                .append(true)
                .create(true)
                .open(&self.change_log_path)
                .map_err(|e| StorageError::UnableToWriteChange(io_to_generic_error(e)))?;

            self.change_log_file = Some(log_file);
        }

        Ok(self
            .change_log_file
            .as_mut()
            .expect("opened directly above"))
    }
}

impl Storage for FileStorage {
    fn write_blob(&self, path: String, bytes: Vec<u8>) -> StorageResult<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.get_path(&path))
            .map_err(|e| StorageError::UnableToWriteBlob(io_to_generic_error(e)))?;

        file.write_all(&bytes)
            .map_err(|e| StorageError::UnableToWriteBlob(io_to_generic_error(e)))
    }

    fn read_blob(&self, path: String) -> StorageResult<ReadBlobState> {
        let mut file = match File::open(self.get_path(&path)) {
            Ok(file) => file,
            Err(err) => match err.kind() {
                std::io::ErrorKind::NotFound => return Ok(ReadBlobState::NotFound),
                _ => return Err(StorageError::UnableToReadBlob(io_to_generic_error(err))),
            },
        };

        let mut buf = Vec::new();

        file.read_to_end(&mut buf)
            .map_err(|e| StorageError::UnableToReadBlob(io_to_generic_error(e)))?;

        Ok(ReadBlobState::Found(buf))
    }

    // Called on store start-up, should be idempotent
    fn init(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.base_path)
            .map_err(|e| StorageError::UnableToInitializePersistence(io_to_generic_error(e)))
    }

    // Called when the store is cleared (via user)
    fn reset(&mut self) -> StorageResult<()> {
        // Drop the append handle before removing the directory underneath it
        self.change_log_file = None;

        if self.base_path.exists() {
            fs::remove_dir_all(&self.base_path)
                .map_err(|e| StorageError::UnableToInitializePersistence(io_to_generic_error(e)))?;
        }

        self.init()
    }

    fn change_write(&mut self, change: &[u8]) -> StorageResult<()> {
        // Buffered OS write, is not 'durable' without a change_sync
        self.open_change_log()?
            .write_all(change)
            .map_err(|e| StorageError::UnableToWriteChange(io_to_generic_error(e)))
    }

    fn change_sync(&self) -> StorageResult<()> {
        if let Some(log_file) = &self.change_log_file {
            log_file
                .sync_all()
                .map_err(|e| StorageError::UnableToSyncChangeLog(io_to_generic_error(e)))?;
        }

        Ok(())
    }

    fn change_flush(&mut self) -> StorageResult<()> {
        self.change_log_file = None;

        match fs::remove_file(&self.change_log_path) {
            Ok(()) => Ok(()),
            // Nothing was ever logged, an absent file is already flushed
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::UnableToFlushChangeLog(io_to_generic_error(
                err,
            ))),
        }
    }

    // File may or may not exist, a missing log is an empty log
    fn change_load(&mut self) -> StorageResult<String> {
        let mut contents = String::new();

        let mut file = match OpenOptions::new().read(true).open(&self.change_log_path) {
            Ok(file) => file,
            Err(err) => match err.kind() {
                std::io::ErrorKind::NotFound => return Ok(contents),
                _ => {
                    return Err(StorageError::UnableToLoadPreviousChanges(
                        io_to_generic_error(err),
                    ))
                }
            },
        };

        file.read_to_string(&mut contents)
            .map_err(|e| StorageError::UnableToLoadPreviousChanges(io_to_generic_error(e)))?;

        Ok(contents)
    }
}
