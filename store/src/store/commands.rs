use crate::model::statement::{Statement, StatementResult};

/// Store commands are how clients interact with the store. Statements carry
/// the reads and writes, controls manage the store itself (shutdown,
/// snapshot, administrative clear).
#[derive(Debug)]
pub enum StoreCommand {
    Statement(Statement),
    Control(Control),
}

impl StoreCommand {
    /// Keeps bulky person records out of the request log line
    pub fn log_format(&self) -> String {
        match self {
            StoreCommand::Statement(Statement::Upsert(person)) => {
                format!("Statement(Upsert({}))", person.id())
            }
            _ => format!("{:?}", self),
        }
    }
}

#[derive(Debug)]
pub enum Control {
    /// Performs a safe shutdown of the store, commands already queued are
    /// processed first, commands after the shutdown are ignored
    Shutdown,
    /// Writes the full record set to disk and compacts the change log,
    /// removing the replay on next startup
    SnapshotStore,
    /// Administrative reset, drops every record and clears storage. Not part
    /// of the normal user flow.
    ClearAll,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StoreCommandResponse {
    Statement(StatementResult),
    /// Statement referenced an identity with no stored record
    RecordNotFound(String),
    /// Persistence failed, the mutation was not applied
    StorageError(String),
    Control(ControlResponse),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ControlResponse {
    Success(String),
    Error(String),
}

impl StoreCommandResponse {
    pub fn control_success(message: &str) -> Self {
        StoreCommandResponse::Control(ControlResponse::Success(message.to_string()))
    }

    pub fn control_error(message: &str) -> Self {
        StoreCommandResponse::Control(ControlResponse::Error(message.to_string()))
    }
}

pub struct StoreCommandRequest {
    pub resolver: oneshot::Sender<StoreCommandResponse>,
    pub command: StoreCommand,
}
