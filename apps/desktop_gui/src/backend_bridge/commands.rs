//! Backend commands queued from UI to backend worker.

use shared::protocol::CommandEnvelope;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    Connect { server_url: String },
    Send(CommandEnvelope),
}
