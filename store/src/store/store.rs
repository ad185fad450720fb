use std::sync::mpsc::Receiver;

use num_format::{Locale, ToFormattedString};

use crate::{
    consts::consts::SequenceId,
    model::statement::Statement,
    persistence::{persistence::Persistence, storage::StorageResult},
};

use super::{
    commands::{Control, StoreCommand, StoreCommandRequest, StoreCommandResponse},
    options::StoreOptions,
    table::{ApplyErrors, PersonTable},
};

/// Owns the record table and persistence. Runs on a dedicated thread and
/// serializes every mutation, which is what keeps concurrent syncs and user
/// toggles from racing on the same identity.
pub struct PersonStore {
    person_table: PersonTable,
    persistence: Persistence,
    command_receiver: Receiver<StoreCommandRequest>,
    options: StoreOptions,
}

impl PersonStore {
    pub fn new(command_receiver: Receiver<StoreCommandRequest>, options: StoreOptions) -> Self {
        let persistence = Persistence::new(&options);

        Self {
            person_table: PersonTable::new(),
            persistence,
            command_receiver,
            options,
        }
    }

    pub fn run(&mut self) {
        if let Err(storage_error) = self.persistence.init() {
            // Reads still work from memory, mutations will surface the failure
            log::warn!("Failed to initialize persistence: {}", storage_error);
        }

        if self.options.restore {
            match self.restore() {
                Ok((snapshot_count, replayed_count)) => {
                    log::info!(
                        "📀 Restore complete [RowsFromSnapshot: {}, ChangesReplayed: {}, CurrentSeq: {}]",
                        snapshot_count.to_formatted_string(&Locale::en),
                        replayed_count.to_formatted_string(&Locale::en),
                        self.persistence.change_log.get_current_sequence_id(),
                    );
                }
                Err(storage_error) => {
                    log::warn!(
                        "Skipping restore, could not load persisted state: {}",
                        storage_error
                    );
                }
            }
        }

        // Process incoming requests from the channel
        loop {
            let StoreCommandRequest { command, resolver } = match self.command_receiver.recv() {
                Ok(request) => request,
                // Every request manager has been dropped, nothing left to serve
                Err(_) => return,
            };

            log::info!("Received command: {}", command.log_format());

            let response = match command {
                StoreCommand::Statement(statement) => self.apply_statement(statement),
                StoreCommand::Control(Control::Shutdown) => {
                    let _ = resolver
                        .send(StoreCommandResponse::control_success("Successfully shutdown store"));

                    return;
                }
                StoreCommand::Control(Control::SnapshotStore) => self.snapshot(),
                StoreCommand::Control(Control::ClearAll) => self.clear_all(),
            };

            // The caller may have timed out and dropped its receiver, a failed
            // send is not an error here
            let _ = resolver.send(response);
        }
    }

    fn apply_statement(&mut self, statement: Statement) -> StoreCommandResponse {
        // Keep the previous record around so a failed log append can be undone
        let previous_record = match &statement {
            Statement::Upsert(person) => {
                Some((person.id(), self.person_table.get(&person.id()).cloned()))
            }
            Statement::ToggleFavourite(id) => {
                Some((id.clone(), self.person_table.get(id).cloned()))
            }
            Statement::Get(_) | Statement::List(_) => None,
        };

        let statement_result = match self.person_table.apply(statement.clone()) {
            Ok(statement_result) => statement_result,
            Err(ApplyErrors::RecordNotFound(id)) => {
                return StoreCommandResponse::RecordNotFound(id.to_string());
            }
        };

        if statement.is_mutation() {
            let sequence_id = self
                .persistence
                .change_log
                .get_increment_current_sequence_id();

            if let Err(storage_error) = self.persistence.change_log.commit(sequence_id, statement) {
                // All-or-nothing per record, the table must not diverge from
                // what was durably logged
                if let Some((id, previous)) = previous_record {
                    self.person_table.restore_record(id, previous);
                }

                return StoreCommandResponse::StorageError(storage_error.to_string());
            }
        }

        StoreCommandResponse::Statement(statement_result)
    }

    fn snapshot(&mut self) -> StoreCommandResponse {
        let sequence_id = self.persistence.change_log.get_current_sequence_id();

        if let Err(storage_error) = self
            .persistence
            .snapshot_manager
            .create_snapshot(&self.person_table, sequence_id)
        {
            return StoreCommandResponse::control_error(&format!(
                "Failed to create snapshot: {}",
                storage_error
            ));
        }

        // Replay skips changes at or below the snapshot's sequence, so a
        // failed flush here leaves the store restorable, just uncompacted
        match self.persistence.change_log.flush_changes() {
            Ok(flushed_count) => StoreCommandResponse::control_success(&format!(
                "Successfully created snapshot, compacted {} changes",
                flushed_count
            )),
            Err(storage_error) => StoreCommandResponse::control_error(&format!(
                "Snapshot written but the change log was not flushed: {}",
                storage_error
            )),
        }
    }

    fn clear_all(&mut self) -> StoreCommandResponse {
        let dropped_count = self.person_table.clear();

        if let Err(storage_error) = self.persistence.reset() {
            return StoreCommandResponse::control_error(&format!(
                "Cleared {} records but storage reset failed: {}",
                dropped_count, storage_error
            ));
        }

        self.persistence
            .change_log
            .set_current_sequence_id(SequenceId(0));

        StoreCommandResponse::control_success(&format!(
            "Successfully cleared store, dropped {} records",
            dropped_count
        ))
    }

    fn restore(&mut self) -> StorageResult<(usize, usize)> {
        let (snapshot_count, metadata) = self
            .persistence
            .snapshot_manager
            .restore_snapshot(&mut self.person_table)?;

        self.persistence
            .change_log
            .set_current_sequence_id(metadata.current_sequence_id.clone());

        let restored_changes = self.persistence.change_log.restore()?;

        let mut replayed_count = 0;

        for change in restored_changes {
            // Changes already covered by the snapshot are skipped, a crash
            // between snapshot and log flush leaves them behind
            if change.sequence <= metadata.current_sequence_id {
                continue;
            }

            self.persistence
                .change_log
                .set_current_sequence_id(change.sequence.clone());

            if let Err(ApplyErrors::RecordNotFound(id)) =
                self.person_table.apply(change.statement)
            {
                log::warn!("Skipping change for unknown record during replay: {}", id);
            }

            replayed_count += 1;
        }

        Ok((snapshot_count, replayed_count))
    }
}

pub mod test_utils {
    use std::path::PathBuf;
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::thread;

    use uuid::Uuid;

    use crate::persistence::changelog::ChangeWriteMode;
    use crate::persistence::storage::StorageEngine;
    use crate::store::commands::StoreCommandRequest;
    use crate::store::options::StoreOptions;
    use crate::store::request_manager::RequestManager;
    use crate::store::store::PersonStore;

    pub fn test_directory() -> PathBuf {
        ["/", "tmp", "persondir", &Uuid::new_v4().to_string()]
            .iter()
            .collect()
    }

    /// In-memory only, no restore and no change log
    pub fn test_options() -> StoreOptions {
        StoreOptions::default()
            .set_storage_engine(StorageEngine::File(test_directory()))
            .set_restore(false)
            .set_change_write_mode(ChangeWriteMode::Off)
    }

    /// Spawns a store thread and hands back the client-side handle
    pub fn spawn_store(options: StoreOptions) -> RequestManager {
        let (command_sender, command_receiver): (
            Sender<StoreCommandRequest>,
            Receiver<StoreCommandRequest>,
        ) = mpsc::channel();

        thread::spawn(move || {
            PersonStore::new(command_receiver, options).run();
        });

        RequestManager::new(command_sender)
    }
}
