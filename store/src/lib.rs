pub mod consts;
pub mod model;
pub mod persistence;
pub mod store;
pub mod sync;
