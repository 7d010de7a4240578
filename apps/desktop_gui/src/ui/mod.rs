//! UI layer for desktop GUI: app shell, form panel, and user table.

pub mod app;

pub use app::{DesktopGuiApp, StartupConfig};
