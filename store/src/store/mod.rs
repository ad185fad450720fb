pub mod commands;
pub mod options;
pub mod request_manager;
pub mod store;
pub mod table;
