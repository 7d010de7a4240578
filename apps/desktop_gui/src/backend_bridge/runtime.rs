//! Runtime bridge between UI command queue and backend event intake.

use std::thread;

use client_core::{ClientEvent, CommandSink, UserClient};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{classify_connect_failure, UiError, UiErrorContext, UiEvent};
use crate::controller::orchestration::describe_sink_error;

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(run_backend(cmd_rx, ui_tx));
    });
}

async fn run_backend(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    let mut client: Option<UserClient> = None;
    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            BackendCommand::Connect { server_url } => {
                if client.is_some() {
                    tracing::warn!("ignoring connect request; already connected");
                    continue;
                }
                match UserClient::connect(&server_url).await {
                    Ok((connected, events)) => {
                        tokio::spawn(forward_events(events, ui_tx.clone()));
                        client = Some(connected);
                    }
                    Err(err) => {
                        tracing::error!("connect failed: {err}");
                        let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                            UiErrorContext::Connect,
                            classify_connect_failure(&err.to_string()),
                        )));
                    }
                }
            }
            BackendCommand::Send(envelope) => {
                let Some(connected) = &client else {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::SendCommand,
                        format!("not connected; {} was not sent", envelope.command()),
                    )));
                    continue;
                };
                if let Err(err) = connected.send_command(envelope) {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::SendCommand,
                        describe_sink_error(&err),
                    )));
                }
            }
        }
    }
    tracing::info!("ui command queue closed; backend worker stopping");
}

async fn forward_events(mut events: broadcast::Receiver<ClientEvent>, ui_tx: Sender<UiEvent>) {
    loop {
        let (event, closed) = match events.recv().await {
            Ok(ClientEvent::Closed) => (UiEvent::Disconnected, true),
            Ok(event) => (UiEvent::from(event), false),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event stream lagged; table may be incomplete");
                (
                    UiEvent::Error(UiError::from_message(
                        UiErrorContext::ServerReply,
                        format!("missed {skipped} server events; the table may be stale"),
                    )),
                    false,
                )
            }
            Err(RecvError::Closed) => break,
        };
        match ui_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => tracing::error!("ui event queue full; dropping event"),
            Err(TrySendError::Disconnected(_)) => break,
        }
        if closed {
            break;
        }
    }
}
