use shared::{error::ProtocolError, protocol::Command};
use thiserror::Error;

/// Failure to hand a command to the outbound channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("command channel closed")]
    Closed,
    #[error("command queue is full")]
    Full,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("server url must use ws://, wss://, http:// or https://: {0}")]
    UnsupportedScheme(String),
    #[error("invalid server url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to connect websocket {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: Box<tokio_tungstenite::tungstenite::Error>,
    },
}

/// Reasons an inbound reply could not be applied to the table.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no handler registered for {0}")]
    MissingHandler(Command),
    #[error(transparent)]
    Payload(#[from] ProtocolError),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    ServerUrl(#[from] TransportError),
}
