//! UI/backend events and error modeling for desktop GUI controller.

use client_core::ClientEvent;
use shared::protocol::ServerReply;

#[derive(Debug, Clone)]
pub enum UiEvent {
    Info(String),
    Connected { server_url: String },
    Reply(ServerReply),
    Error(UiError),
    Disconnected,
}

impl From<ClientEvent> for UiEvent {
    fn from(event: ClientEvent) -> Self {
        match event {
            ClientEvent::Connected { server_url } => UiEvent::Connected { server_url },
            ClientEvent::Reply(reply) => UiEvent::Reply(reply),
            ClientEvent::Error(message) => {
                UiEvent::Error(UiError::from_message(UiErrorContext::ServerReply, message))
            }
            ClientEvent::Closed => UiEvent::Disconnected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Protocol,
    Rejected,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Connect,
    SendCommand,
    ServerReply,
}

pub fn classify_connect_failure(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    if lower.contains("server url must use") || lower.contains("invalid server url") {
        format!("Check the server address: {message}")
    } else if lower.contains("failed to connect")
        || lower.contains("connection refused")
        || lower.contains("dns")
        || lower.contains("timed out")
    {
        "User service unreachable; check the URL and that the server is running.".to_string()
    } else {
        format!("Connection error: {message}")
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains(" failed: ")
            && !message_lower.contains("websocket")
        {
            UiErrorCategory::Rejected
        } else if message_lower.contains("malformed")
            || message_lower.contains("unexpected")
            || message_lower.contains("payload")
            || message_lower.contains("encode")
        {
            UiErrorCategory::Protocol
        } else if message_lower.contains("connect")
            || message_lower.contains("websocket")
            || message_lower.contains("closed")
            || message_lower.contains("queue")
            || message_lower.contains("unreachable")
            || message_lower.contains("disconnect")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            category: UiErrorCategory::Rejected,
            context: UiErrorContext::ServerReply,
            message: message.into(),
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
