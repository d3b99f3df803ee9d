//! Backend HTTP API module.
pub mod error;
pub mod openapi;
pub mod system;
pub mod types;
pub mod users;
