//! HTTP surface of the finedrop upload service.

pub mod error;
pub mod handler;
pub mod handlers;
pub mod progress;
pub mod routes;
pub mod server;
pub mod source;
pub mod state;
