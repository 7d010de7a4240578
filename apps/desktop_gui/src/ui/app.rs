use std::time::Duration;

use chrono::{DateTime, Local};
use client_core::{CommandRouter, FormMode, RowAction, SyncError, SyncOutcome, ViewSynchronizer};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use serde::{Deserialize, Serialize};
use shared::domain::UserField;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorCategory, UiErrorContext, UiEvent};
use crate::controller::orchestration::{describe_sink_error, dispatch_backend_command, BackendQueue};

pub const SETTINGS_STORAGE_KEY: &str = "users_desktop_gui_settings";

#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub server_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedDesktopSettings {
    #[serde(default)]
    pub last_server_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

impl ConnectionState {
    fn label(self) -> &'static str {
        match self {
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Disconnected => "Disconnected",
        }
    }

    fn color(self) -> egui::Color32 {
        match self {
            ConnectionState::Connecting => egui::Color32::from_rgb(0xf0, 0xb2, 0x32),
            ConnectionState::Connected => egui::Color32::from_rgb(0x3b, 0xa5, 0x5d),
            ConnectionState::Disconnected => egui::Color32::from_rgb(0xed, 0x42, 0x45),
        }
    }
}

#[derive(Debug, Clone)]
struct StatusBanner {
    error: UiError,
    at: DateTime<Local>,
}

fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Transport",
        UiErrorCategory::Protocol => "Protocol",
        UiErrorCategory::Rejected => "Rejected by server",
        UiErrorCategory::Unknown => "Error",
    }
}

fn context_label(context: UiErrorContext) -> &'static str {
    match context {
        UiErrorContext::BackendStartup => "startup",
        UiErrorContext::Connect => "connect",
        UiErrorContext::SendCommand => "send",
        UiErrorContext::ServerReply => "server reply",
    }
}

pub struct DesktopGuiApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    router: CommandRouter<BackendQueue>,
    sync: ViewSynchronizer,
    server_url: String,
    connection: ConnectionState,
    status: String,
    status_banner: Option<StatusBanner>,
    last_change: Option<DateTime<Local>>,
}

impl DesktopGuiApp {
    /// Builds the app and asks the backend to open the single connection.
    pub fn bootstrap(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        startup: StartupConfig,
    ) -> Self {
        let mut app = Self {
            router: CommandRouter::new(BackendQueue::new(cmd_tx.clone())),
            cmd_tx,
            ui_rx,
            sync: ViewSynchronizer::new(),
            server_url: startup.server_url,
            connection: ConnectionState::Connecting,
            status: "Not connected".to_string(),
            status_banner: None,
            last_change: None,
        };
        dispatch_backend_command(
            &app.cmd_tx,
            BackendCommand::Connect {
                server_url: app.server_url.clone(),
            },
            &mut app.status,
        );
        app
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            self.handle_ui_event(event);
        }
    }

    fn handle_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Info(message) => {
                self.status = message;
            }
            UiEvent::Connected { server_url } => {
                self.connection = ConnectionState::Connected;
                self.status = format!("Connected to {server_url}; loading users");
                self.server_url = server_url;
                self.status_banner = None;
            }
            UiEvent::Reply(reply) => match self.sync.apply(reply) {
                Ok(SyncOutcome::Applied { command, effect }) => {
                    tracing::debug!(%command, ?effect, "applied server reply");
                    self.last_change = Some(Local::now());
                    self.status = format!("{command} acknowledged");
                }
                Ok(SyncOutcome::Ignored { command }) => {
                    tracing::debug!(?command, "ignored server reply");
                }
                Ok(SyncOutcome::Rejected(failure)) => {
                    self.show_error(UiError::rejected(failure.to_string()));
                }
                Err(err) => self.show_sync_error(&err),
            },
            UiEvent::Error(error) => {
                if error.context() == UiErrorContext::Connect {
                    self.connection = ConnectionState::Disconnected;
                }
                self.show_error(error);
            }
            UiEvent::Disconnected => {
                self.connection = ConnectionState::Disconnected;
                self.status = "Connection closed by server".to_string();
            }
        }
    }

    fn show_sync_error(&mut self, err: &SyncError) {
        self.show_error(UiError::from_message(
            UiErrorContext::ServerReply,
            err.to_string(),
        ));
    }

    fn show_error(&mut self, error: UiError) {
        tracing::warn!(
            category = ?error.category(),
            context = ?error.context(),
            "{}",
            error.message()
        );
        self.status = error.message().to_string();
        self.status_banner = Some(StatusBanner {
            error,
            at: Local::now(),
        });
    }

    fn submit_form(&mut self) {
        if let Err(err) = self.router.submit_add_or_update() {
            self.show_error(UiError::from_message(
                UiErrorContext::SendCommand,
                describe_sink_error(&err),
            ));
        }
    }

    /// Rows already shown are refreshed in place by the new list.
    fn reload_users(&mut self) {
        if let Err(err) = self.router.request_user_list() {
            self.show_error(UiError::from_message(
                UiErrorContext::SendCommand,
                describe_sink_error(&err),
            ));
        }
    }

    fn perform_row_action(&mut self, action: RowAction) {
        if let Err(err) = self.router.perform(action, self.sync.table()) {
            self.show_error(UiError::from_message(
                UiErrorContext::SendCommand,
                describe_sink_error(&err),
            ));
        }
    }

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        let mut reload = false;
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Users");
                ui.separator();
                ui.colored_label(self.connection.color(), self.connection.label());
                ui.label(&self.server_url);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let connected = self.connection == ConnectionState::Connected;
                    if ui.add_enabled(connected, egui::Button::new("Reload")).clicked() {
                        reload = true;
                    }
                    if let Some(at) = self.last_change {
                        ui.weak(format!("last change {}", at.format("%H:%M:%S")));
                    }
                });
            });
        });
        if reload {
            self.reload_users();
        }
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        let Some(banner) = &self.status_banner else {
            return;
        };
        let mut dismiss = false;
        egui::Frame::new()
            .fill(egui::Color32::from_rgb(0x5c, 0x1f, 0x22))
            .inner_margin(egui::Margin::same(8))
            .corner_radius(egui::CornerRadius::same(6))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(
                        egui::Color32::WHITE,
                        egui::RichText::new(format!(
                            "{} ({}) at {}",
                            err_label(banner.error.category()),
                            context_label(banner.error.context()),
                            banner.at.format("%H:%M:%S")
                        ))
                        .strong(),
                    );
                    ui.colored_label(egui::Color32::WHITE, banner.error.message());
                    if ui.small_button("Dismiss").clicked() {
                        dismiss = true;
                    }
                });
            });
        if dismiss {
            self.status_banner = None;
        }
        ui.add_space(6.0);
    }

    fn show_form_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("user_form")
            .resizable(false)
            .default_width(300.0)
            .show(ctx, |ui| {
                let mode = self.router.form().mode();
                match mode {
                    FormMode::Add => ui.heading("Add user"),
                    FormMode::Edit => ui.heading("Edit user"),
                };
                if mode == FormMode::Edit {
                    ui.weak(format!("id {}", self.router.form().id()));
                }
                ui.add_space(8.0);

                egui::Grid::new("user_form_fields")
                    .num_columns(2)
                    .spacing([8.0, 6.0])
                    .show(ui, |ui| {
                        for field in UserField::ALL {
                            ui.label(field.label());
                            ui.add(
                                egui::TextEdit::singleline(self.router.form_mut().field_mut(field))
                                    .id_salt(field.name())
                                    .desired_width(180.0),
                            );
                            ui.end_row();
                        }
                    });

                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    let submit_label = match mode {
                        FormMode::Add => "Add",
                        FormMode::Edit => "Save",
                    };
                    let connected = self.connection == ConnectionState::Connected;
                    if ui
                        .add_enabled(connected, egui::Button::new(submit_label))
                        .clicked()
                    {
                        self.submit_form();
                    }
                    if ui.button("Clear form").clicked() {
                        self.router.reset_form();
                    }
                });
            });
    }

    fn show_user_table(&mut self, ctx: &egui::Context) {
        let mut pending_action = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_status_banner(ui);
            ui.label(&self.status);
            ui.separator();

            if self.sync.table().is_empty() {
                ui.weak("No users yet.");
                return;
            }

            let connected = self.connection == ConnectionState::Connected;
            egui::ScrollArea::vertical().show(ui, |ui| {
                egui::Grid::new("user_table")
                    .striped(true)
                    .num_columns(UserField::ALL.len() + 2)
                    .spacing([16.0, 6.0])
                    .show(ui, |ui| {
                        for field in UserField::ALL {
                            ui.strong(field.label());
                        }
                        ui.label("");
                        ui.label("");
                        ui.end_row();

                        for row in self.sync.table().rows() {
                            for field in UserField::ALL {
                                ui.label(row.cell(field));
                            }
                            if ui.button("Edit").clicked() {
                                pending_action = Some(row.edit_action());
                            }
                            if ui
                                .add_enabled(connected, egui::Button::new("Delete"))
                                .clicked()
                            {
                                pending_action = Some(row.delete_action());
                            }
                            ui.end_row();
                        }
                    });
            });
        });

        if let Some(action) = pending_action {
            self.perform_row_action(action);
        }
    }

    pub fn persisted_settings(&self) -> PersistedDesktopSettings {
        PersistedDesktopSettings {
            last_server_url: Some(self.server_url.clone()),
        }
    }
}

impl eframe::App for DesktopGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        self.show_top_bar(ctx);
        self.show_form_panel(ctx);
        self.show_user_table(ctx);

        ctx.request_repaint_after(Duration::from_millis(100));
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if let Ok(serialized) = serde_json::to_string(&self.persisted_settings()) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}
