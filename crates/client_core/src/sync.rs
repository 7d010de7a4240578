//! Inbound path: applies server replies to the [`UserTable`].

use std::collections::HashMap;

use serde_json::Value;
use shared::{
    domain::{UpdatedUser, UserRecord, UserRef},
    protocol::{decode_result, Command, CommandFailure, ServerReply},
};
use tracing::{debug, warn};

use crate::{error::SyncError, view::UserTable};

/// What a handled reply did to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEffect {
    RowsInserted(usize),
    RowUpdated { found: bool },
    RowRemoved { found: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Applied { command: Command, effect: SyncEffect },
    /// Success reply with a missing or unrecognized command name.
    Ignored { command: Option<String> },
    /// The server reported a failed request; the table is unchanged.
    Rejected(CommandFailure),
}

type Handler = fn(&mut UserTable, Value) -> Result<SyncEffect, SyncError>;

/// Owns the table and the command → handler map built at construction.
pub struct ViewSynchronizer {
    table: UserTable,
    handlers: HashMap<Command, Handler>,
}

impl Default for ViewSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewSynchronizer {
    pub fn new() -> Self {
        let handlers = Command::ALL
            .into_iter()
            .map(|command| (command, handler_for(command)))
            .collect();
        Self {
            table: UserTable::new(),
            handlers,
        }
    }

    pub fn table(&self) -> &UserTable {
        &self.table
    }

    pub fn apply(&mut self, reply: ServerReply) -> Result<SyncOutcome, SyncError> {
        match reply {
            ServerReply::Success(outcome) => {
                let Some(command) = outcome.command() else {
                    debug!(command = ?outcome.command, "ignoring reply for unknown command");
                    return Ok(SyncOutcome::Ignored {
                        command: outcome.command,
                    });
                };
                let effect = self.dispatch(command, outcome.result)?;
                Ok(SyncOutcome::Applied { command, effect })
            }
            ServerReply::Failure(failure) => {
                warn!(
                    command = ?failure.command,
                    message = %failure.message,
                    "server rejected request"
                );
                Ok(SyncOutcome::Rejected(failure))
            }
        }
    }

    pub fn dispatch(&mut self, command: Command, result: Value) -> Result<SyncEffect, SyncError> {
        let handler = self
            .handlers
            .get(&command)
            .ok_or(SyncError::MissingHandler(command))?;
        handler(&mut self.table, result)
    }
}

fn handler_for(command: Command) -> Handler {
    match command {
        Command::GetUserList => show_user_list,
        Command::AddUser => user_added,
        Command::UpdateUser => user_updated,
        Command::DeleteUser => user_deleted,
    }
}

/// Records are decoded one by one; a bad record is skipped, not the list.
fn show_user_list(table: &mut UserTable, result: Value) -> Result<SyncEffect, SyncError> {
    let entries: Vec<Value> = decode_result(Command::GetUserList, result)?;
    let mut inserted = 0;
    for (index, entry) in entries.into_iter().enumerate() {
        let record: UserRecord = match serde_json::from_value(entry) {
            Ok(record) => record,
            Err(err) => {
                warn!(index, "skipping unreadable user list entry: {err}");
                continue;
            }
        };
        if table.insert_row(record) {
            inserted += 1;
        } else {
            warn!("user list repeated an id already in the table");
        }
    }
    Ok(SyncEffect::RowsInserted(inserted))
}

fn user_added(table: &mut UserTable, result: Value) -> Result<SyncEffect, SyncError> {
    let record: UserRecord = decode_result(Command::AddUser, result)?;
    let inserted = usize::from(table.insert_row(record));
    Ok(SyncEffect::RowsInserted(inserted))
}

fn user_updated(table: &mut UserTable, result: Value) -> Result<SyncEffect, SyncError> {
    let update: UpdatedUser = decode_result(Command::UpdateUser, result)?;
    let found = table.update_row(&update);
    if !found {
        debug!(user_id = %update.id, "update for a row not in the table");
    }
    Ok(SyncEffect::RowUpdated { found })
}

fn user_deleted(table: &mut UserTable, result: Value) -> Result<SyncEffect, SyncError> {
    let user: UserRef = decode_result(Command::DeleteUser, result)?;
    let found = table.remove_row(&user.id).is_some();
    Ok(SyncEffect::RowRemoved { found })
}

#[cfg(test)]
#[path = "tests/sync_tests.rs"]
mod tests;
