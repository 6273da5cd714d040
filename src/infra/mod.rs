//! Infrastructure adapters and runtime bootstrap.

pub mod browser;
pub mod error;
pub mod manifest;
pub mod server;
pub mod telemetry;
