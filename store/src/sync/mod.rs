pub mod coordinator;
pub mod remote;
