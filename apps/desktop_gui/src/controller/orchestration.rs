//! Command orchestration helpers from UI actions to backend command queue.

use client_core::{CommandSink, SinkError};
use crossbeam_channel::{Sender, TrySendError};
use shared::protocol::CommandEnvelope;

use crate::backend_bridge::commands::BackendCommand;

/// Command sink that forwards envelopes to the backend worker.
#[derive(Clone)]
pub struct BackendQueue {
    cmd_tx: Sender<BackendCommand>,
}

impl BackendQueue {
    pub fn new(cmd_tx: Sender<BackendCommand>) -> Self {
        Self { cmd_tx }
    }
}

impl CommandSink for BackendQueue {
    fn send_command(&self, envelope: CommandEnvelope) -> Result<(), SinkError> {
        let command = envelope.command();
        match self.cmd_tx.try_send(BackendCommand::Send(envelope)) {
            Ok(()) => {
                tracing::debug!(%command, "queued ui->backend command");
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(SinkError::Full),
            Err(TrySendError::Disconnected(_)) => Err(SinkError::Closed),
        }
    }
}

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) {
    let cmd_name = match &cmd {
        BackendCommand::Connect { .. } => "connect",
        BackendCommand::Send(envelope) => envelope.command().name(),
    };

    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            *status = "UI command queue is full; please retry".to_string();
        }
        Err(TrySendError::Disconnected(_)) => {
            *status = "Backend worker disconnected (possible startup/runtime failure); restart the app"
                .to_string();
        }
    }
}

pub fn describe_sink_error(err: &SinkError) -> String {
    match err {
        SinkError::Full => "UI command queue is full; please retry".to_string(),
        SinkError::Closed => {
            "Backend worker disconnected (possible startup/runtime failure); restart the app"
                .to_string()
        }
    }
}
