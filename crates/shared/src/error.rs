use thiserror::Error;

use crate::protocol::Command;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed server reply: {0}")]
    MalformedReply(#[source] serde_json::Error),
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("unexpected {command} result payload: {source}")]
    Payload {
        command: Command,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode command: {0}")]
    Encode(#[source] serde_json::Error),
}
