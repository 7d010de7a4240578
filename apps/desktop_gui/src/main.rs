use std::path::PathBuf;

mod backend_bridge;
mod controller;
mod ui;

use anyhow::{anyhow, Context, Result};
use backend_bridge::commands::BackendCommand;
use clap::Parser;
use client_core::{load_settings, load_settings_from};
use controller::events::UiEvent;
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;
use ui::app::{PersistedDesktopSettings, SETTINGS_STORAGE_KEY};
use ui::{DesktopGuiApp, StartupConfig};

#[derive(Parser, Debug)]
#[command(name = "users-gui", about = "Desktop editor for the user directory")]
struct StartupArgs {
    /// Server url; takes precedence over the last used one.
    #[arg(long)]
    server_url: Option<String>,
    /// Settings file to read instead of ./client.toml.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Explicit flag first, then the url remembered from the last session, then
/// settings.
fn resolve_server_url(
    flag: Option<String>,
    persisted: Option<PersistedDesktopSettings>,
    settings_url: String,
) -> String {
    flag.or_else(|| persisted.and_then(|settings| settings.last_server_url))
        .filter(|url| !url.trim().is_empty())
        .unwrap_or(settings_url)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = StartupArgs::parse();
    let settings = match &args.config {
        Some(path) => load_settings_from(path, true),
        None => load_settings(),
    }
    .context("failed to load client settings")?;

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Users")
            .with_inner_size([1024.0, 640.0])
            .with_min_inner_size([720.0, 420.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Users Desktop GUI",
        options,
        Box::new(move |cc| {
            let persisted_settings = cc.storage.and_then(|storage| {
                storage
                    .get_string(SETTINGS_STORAGE_KEY)
                    .and_then(|text| serde_json::from_str::<PersistedDesktopSettings>(&text).ok())
            });
            let server_url =
                resolve_server_url(args.server_url, persisted_settings, settings.server_url);
            tracing::info!(%server_url, "starting desktop gui");
            Ok(Box::new(DesktopGuiApp::bootstrap(
                cmd_tx,
                ui_rx,
                StartupConfig { server_url },
            )))
        }),
    )
    .map_err(|err| anyhow!("desktop gui exited with error: {err}"))
}

#[cfg(test)]
mod tests {
    use client_core::{CommandSink, SinkError};
    use crossbeam_channel::bounded;
    use shared::protocol::CommandEnvelope;

    use super::resolve_server_url;
    use crate::backend_bridge::commands::BackendCommand;
    use crate::controller::events::{
        classify_connect_failure, UiError, UiErrorCategory, UiErrorContext,
    };
    use crate::controller::orchestration::BackendQueue;
    use crate::ui::app::PersistedDesktopSettings;

    #[test]
    fn classifies_backend_disconnect_as_transport_error() {
        let err = UiError::from_message(
            UiErrorContext::SendCommand,
            "Backend worker disconnected (possible startup/runtime failure); restart the app",
        );
        assert_eq!(err.category(), UiErrorCategory::Transport);
    }

    #[test]
    fn classifies_malformed_frame_as_protocol_error() {
        let err = UiError::from_message(
            UiErrorContext::ServerReply,
            "malformed server reply: expected value at line 1 column 1",
        );
        assert_eq!(err.category(), UiErrorCategory::Protocol);
    }

    #[test]
    fn unreachable_server_gets_friendly_message() {
        let message = classify_connect_failure(
            "failed to connect to ws://127.0.0.1:9/ws: IO error: Connection refused",
        );
        assert!(message.contains("unreachable"));
    }

    #[test]
    fn backend_queue_reports_full_and_closed() {
        let (cmd_tx, cmd_rx) = bounded(1);
        let queue = BackendQueue::new(cmd_tx);

        queue
            .send_command(CommandEnvelope::GetUserList)
            .expect("first send fits");
        assert_eq!(
            queue.send_command(CommandEnvelope::GetUserList),
            Err(SinkError::Full)
        );
        assert_eq!(
            cmd_rx.try_recv().expect("queued"),
            BackendCommand::Send(CommandEnvelope::GetUserList)
        );

        drop(cmd_rx);
        assert_eq!(
            queue.send_command(CommandEnvelope::GetUserList),
            Err(SinkError::Closed)
        );
    }

    #[test]
    fn flag_beats_remembered_url() {
        let remembered = PersistedDesktopSettings {
            last_server_url: Some("ws://remembered/ws".to_string()),
        };
        assert_eq!(
            resolve_server_url(
                Some("ws://flag/ws".to_string()),
                Some(remembered.clone()),
                "ws://settings/ws".to_string()
            ),
            "ws://flag/ws"
        );
        assert_eq!(
            resolve_server_url(None, Some(remembered), "ws://settings/ws".to_string()),
            "ws://remembered/ws"
        );
        assert_eq!(
            resolve_server_url(None, None, "ws://settings/ws".to_string()),
            "ws://settings/ws"
        );
    }
}
