//! Outbound path: turns form and row gestures into command envelopes.

use shared::{
    domain::{UserId, UserRecord},
    protocol::CommandEnvelope,
};
use tokio::sync::mpsc;
use tracing::debug;

use crate::{
    error::SinkError,
    form::UserForm,
    view::{RowAction, UserTable},
};

/// Anything that can carry an envelope towards the server without waiting
/// for an answer.
pub trait CommandSink {
    fn send_command(&self, envelope: CommandEnvelope) -> Result<(), SinkError>;
}

impl CommandSink for mpsc::UnboundedSender<CommandEnvelope> {
    fn send_command(&self, envelope: CommandEnvelope) -> Result<(), SinkError> {
        self.send(envelope).map_err(|_| SinkError::Closed)
    }
}

impl<S: CommandSink + ?Sized> CommandSink for &S {
    fn send_command(&self, envelope: CommandEnvelope) -> Result<(), SinkError> {
        (**self).send_command(envelope)
    }
}

/// Owns the form and forwards user intents to a [`CommandSink`].
pub struct CommandRouter<S> {
    sink: S,
    form: UserForm,
}

impl<S: CommandSink> CommandRouter<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            form: UserForm::new(),
        }
    }

    pub fn form(&self) -> &UserForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut UserForm {
        &mut self.form
    }

    /// Sends `add_user` or `update_user` for the current form and resets it,
    /// whether or not the send succeeded.
    pub fn submit_add_or_update(&mut self) -> Result<(), SinkError> {
        let envelope = self.form.submit();
        self.send(envelope)
    }

    /// Asks the server to delete `id`. The row stays until the server
    /// acknowledges.
    pub fn request_delete(&self, id: UserId) -> Result<(), SinkError> {
        self.send(CommandEnvelope::DeleteUser { id })
    }

    pub fn request_user_list(&self) -> Result<(), SinkError> {
        self.send(CommandEnvelope::GetUserList)
    }

    pub fn reset_form(&mut self) {
        self.form.reset();
    }

    pub fn populate_for_edit(&mut self, record: &UserRecord) {
        self.form.populate_for_edit(record);
    }

    /// Runs a row control against the table's current contents. An edit on
    /// a row that has since disappeared does nothing.
    pub fn perform(&mut self, action: RowAction, table: &UserTable) -> Result<(), SinkError> {
        match action {
            RowAction::Edit(id) => {
                if let Some(record) = table.record(&id) {
                    self.populate_for_edit(record);
                } else {
                    debug!(user_id = %id, "edit requested for a row that is gone");
                }
                Ok(())
            }
            RowAction::Delete(id) => self.request_delete(id),
        }
    }

    fn send(&self, envelope: CommandEnvelope) -> Result<(), SinkError> {
        let command = envelope.command();
        self.sink.send_command(envelope)?;
        debug!(%command, "queued command");
        Ok(())
    }
}
