use std::{sync::mpsc::Sender, time::Duration};

use thiserror::Error;

use crate::{
    consts::consts::PersonId,
    model::{
        person::Person,
        statement::{ListFilter, Statement, StatementResult, UpsertOutcome},
    },
};

use super::commands::{Control, ControlResponse, StoreCommand, StoreCommandRequest, StoreCommandResponse};

#[derive(Clone)]
pub struct RequestManager {
    command_sender: Sender<StoreCommandRequest>,
}

#[derive(Error, Debug)]
pub enum RequestManagerError {
    #[error("Store took too long to respond to the request")]
    StoreTimeout,

    #[error("Store has shut down")]
    StoreShutdown,

    /// An expected outcome for toggles on unknown identities, distinct from
    /// success but not fatal
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Storage failure, the statement was not applied: {0}")]
    Storage(String),

    #[error("Control command failed: {0}")]
    ControlError(String),
}

/// Goal of the request manager is to provide a simple interface for
/// interacting with the store thread.
///
/// The typed send_* methods cover the statement and control surface; each one
/// sends a command over the channel and blocks on a oneshot for the response.
impl RequestManager {
    pub fn new(command_sender: Sender<StoreCommandRequest>) -> Self {
        Self { command_sender }
    }

    pub fn send_upsert(&self, person: Person) -> Result<UpsertOutcome, RequestManagerError> {
        let statement_result = self.send_statement(Statement::Upsert(person))?;
        Ok(statement_result.upserted())
    }

    /// Applies each upsert in input order. There is no batch atomicity, a
    /// failure part-way through leaves the earlier records applied.
    pub fn send_upsert_all(
        &self,
        persons: Vec<Person>,
    ) -> Result<Vec<UpsertOutcome>, RequestManagerError> {
        persons
            .into_iter()
            .map(|person| self.send_upsert(person))
            .collect()
    }

    pub fn send_get(&self, id: PersonId) -> Result<Option<Person>, RequestManagerError> {
        let statement_result = self.send_statement(Statement::Get(id))?;
        Ok(statement_result.get_single())
    }

    pub fn send_list(&self, filter: ListFilter) -> Result<Vec<Person>, RequestManagerError> {
        let statement_result = self.send_statement(Statement::List(filter))?;
        Ok(statement_result.list())
    }

    pub fn send_toggle_favourite(&self, id: PersonId) -> Result<bool, RequestManagerError> {
        let statement_result = self.send_statement(Statement::ToggleFavourite(id))?;
        Ok(statement_result.toggled())
    }

    /// Sends a shutdown request to the store and returns the store's response
    pub fn send_shutdown_request(&self) -> Result<String, RequestManagerError> {
        self.send_control(Control::Shutdown)
    }

    pub fn send_snapshot_request(&self) -> Result<String, RequestManagerError> {
        self.send_control(Control::SnapshotStore)
    }

    pub fn send_clear_request(&self) -> Result<String, RequestManagerError> {
        self.send_control(Control::ClearAll)
    }

    pub fn send_statement(
        &self,
        statement: Statement,
    ) -> Result<StatementResult, RequestManagerError> {
        match self.send_command(StoreCommand::Statement(statement))? {
            StoreCommandResponse::Statement(statement_result) => Ok(statement_result),
            StoreCommandResponse::RecordNotFound(id) => {
                Err(RequestManagerError::RecordNotFound(id))
            }
            StoreCommandResponse::StorageError(reason) => {
                Err(RequestManagerError::Storage(reason))
            }
            StoreCommandResponse::Control(_) => {
                panic!("Statement should not produce a control response")
            }
        }
    }

    fn send_control(&self, control: Control) -> Result<String, RequestManagerError> {
        match self.send_command(StoreCommand::Control(control))? {
            StoreCommandResponse::Control(ControlResponse::Success(status)) => Ok(status),
            StoreCommandResponse::Control(ControlResponse::Error(reason)) => {
                Err(RequestManagerError::ControlError(reason))
            }
            _ => panic!("Control should not produce a statement response"),
        }
    }

    pub fn send_command(
        &self,
        command: StoreCommand,
    ) -> Result<StoreCommandResponse, RequestManagerError> {
        let (resolver, response_receiver) = oneshot::channel::<StoreCommandResponse>();

        let request = StoreCommandRequest { resolver, command };

        // Sends the request to the store thread, the store will respond on
        // the resolver once it has processed the request
        self.command_sender
            .send(request)
            .map_err(|_| RequestManagerError::StoreShutdown)?;

        match response_receiver.recv_timeout(Duration::from_secs(2)) {
            Ok(response) => Ok(response),
            Err(oneshot::RecvTimeoutError::Timeout) => Err(RequestManagerError::StoreTimeout),
            Err(oneshot::RecvTimeoutError::Disconnected) => Err(RequestManagerError::StoreShutdown),
        }
    }
}
