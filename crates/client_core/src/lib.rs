//! Client-side model of the user directory: the editable form, the command
//! router that turns gestures into envelopes, the row table, the
//! synchronizer that applies server replies, and the WebSocket transport.

pub mod config;
pub mod error;
pub mod form;
pub mod router;
pub mod sync;
pub mod transport;
pub mod view;

pub use config::{load_settings, load_settings_from, normalize_server_url, Settings};
pub use error::{SettingsError, SinkError, SyncError, TransportError};
pub use form::{FormMode, UserForm};
pub use router::{CommandRouter, CommandSink};
pub use sync::{SyncEffect, SyncOutcome, ViewSynchronizer};
pub use transport::{ClientEvent, UserClient};
pub use view::{RowAction, UserRow, UserTable};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
