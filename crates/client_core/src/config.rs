use std::{fs, path::Path};

use serde::Deserialize;
use url::Url;

use crate::error::{SettingsError, TransportError};

pub const DEFAULT_SERVER_URL: &str = "ws://localhost:8000/ws";
pub const DEFAULT_SETTINGS_FILE: &str = "client.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
}

/// Defaults, then `client.toml` in the working directory if present, then
/// environment overrides.
pub fn load_settings() -> Result<Settings, SettingsError> {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE), false)
}

/// Like [`load_settings`] but reads `path`; a missing file is an error when
/// `required` is set.
pub fn load_settings_from(path: &Path, required: bool) -> Result<Settings, SettingsError> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let file_cfg: FileSettings =
                toml::from_str(&raw).map_err(|source| SettingsError::Parse {
                    path: path.display().to_string(),
                    source,
                })?;
            if let Some(v) = file_cfg.server_url {
                settings.server_url = v;
            }
        }
        Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    }

    if let Ok(v) = std::env::var("USERS_SERVER_URL") {
        settings.server_url = v;
    }
    if let Ok(v) = std::env::var("APP__SERVER_URL") {
        settings.server_url = v;
    }

    settings.server_url = normalize_server_url(&settings.server_url)?;
    Ok(settings)
}

/// Accepts ws(s) URLs as-is and rewrites http(s) to the matching ws scheme.
pub fn normalize_server_url(raw: &str) -> Result<String, TransportError> {
    let raw = raw.trim();
    let rewritten = if let Some(rest) = raw.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = raw.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if raw.starts_with("ws://") || raw.starts_with("wss://") {
        raw.to_string()
    } else {
        return Err(TransportError::UnsupportedScheme(raw.to_string()));
    };

    let url = Url::parse(&rewritten).map_err(|source| TransportError::InvalidUrl {
        url: rewritten.clone(),
        source,
    })?;
    Ok(url.to_string())
}
