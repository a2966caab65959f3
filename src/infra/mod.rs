//! Infrastructure adapters: HTTP surface, in-memory data source, telemetry.

pub mod error;
pub mod http;
pub mod memory;
pub mod telemetry;
