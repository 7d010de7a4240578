//! Backend worker: owns the tokio runtime and the WebSocket client.

pub mod commands;
pub mod runtime;
