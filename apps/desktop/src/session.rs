use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use client_core::{ClientEvent, CommandRouter, SyncOutcome, UserClient, ViewSynchronizer};
use serde_json::Value;
use shared::{
    domain::{UserFields, UserId, UserRef},
    protocol::{Command, CommandFailure, ServerReply},
};
use tokio::{
    sync::broadcast::{self, error::RecvError},
    time::{timeout_at, Instant},
};
use tracing::{debug, info, warn};

use crate::render;

/// Acknowledgement a subcommand waits for. The server broadcasts add,
/// update and delete results to every connection, so those are matched on
/// what the result echoes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Awaited {
    UserList,
    Added(UserFields),
    Updated(UserId),
    Deleted(UserId),
}

impl Awaited {
    pub fn command(&self) -> Command {
        match self {
            Awaited::UserList => Command::GetUserList,
            Awaited::Added(_) => Command::AddUser,
            Awaited::Updated(_) => Command::UpdateUser,
            Awaited::Deleted(_) => Command::DeleteUser,
        }
    }

    fn matches(&self, command: Command, result: &Value) -> bool {
        if command != self.command() {
            return false;
        }
        match self {
            Awaited::UserList => true,
            Awaited::Added(fields) => serde_json::from_value::<UserFields>(result.clone())
                .is_ok_and(|echoed| &echoed == fields),
            Awaited::Updated(id) | Awaited::Deleted(id) => {
                serde_json::from_value::<UserRef>(result.clone())
                    .is_ok_and(|echoed| &echoed.id == id)
            }
        }
    }
}

/// One connected CLI run: router for outbound commands, synchronizer for
/// the table, and the transport's event stream.
pub struct Session {
    pub router: CommandRouter<UserClient>,
    pub sync: ViewSynchronizer,
    events: broadcast::Receiver<ClientEvent>,
    wait: Duration,
}

impl Session {
    pub fn new(
        router: CommandRouter<UserClient>,
        events: broadcast::Receiver<ClientEvent>,
        wait: Duration,
    ) -> Self {
        Self {
            router,
            sync: ViewSynchronizer::new(),
            events,
            wait,
        }
    }

    /// Applies every reply until the awaited one lands. Fails on a server
    /// rejection for the same command, on disconnect, or after the wait
    /// budget.
    pub async fn wait_for(&mut self, awaited: Awaited) -> Result<()> {
        let command = awaited.command();
        let deadline = Instant::now() + self.wait;
        loop {
            let event = timeout_at(deadline, self.events.recv())
                .await
                .map_err(|_| anyhow!("timed out waiting for {command} acknowledgement"))?;
            let event = match event {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event stream lagged; table may be incomplete");
                    continue;
                }
                Err(RecvError::Closed) => bail!("connection closed before {command} completed"),
            };
            match self.handle(event)? {
                Progress::Applied(applied, result) if awaited.matches(applied, &result) => {
                    return Ok(())
                }
                Progress::Rejected(failure)
                    if failure.command.as_deref() == Some(command.name()) =>
                {
                    bail!("{failure}")
                }
                Progress::Rejected(failure) => warn!("{failure}"),
                Progress::Applied(..) | Progress::Pending => {}
            }
        }
    }

    /// Reprints the table after every applied reply until the connection
    /// closes or Ctrl-C.
    pub async fn watch(&mut self, json: bool) -> Result<()> {
        loop {
            let event = tokio::select! {
                event = self.events.recv() => event,
                _ = tokio::signal::ctrl_c() => return Ok(()),
            };
            let event = match event {
                Ok(ClientEvent::Closed) | Err(RecvError::Closed) => {
                    info!("server closed the connection");
                    return Ok(());
                }
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event stream lagged; table may be incomplete");
                    continue;
                }
            };
            match self.handle(event)? {
                Progress::Applied(..) => render::print_table(self.sync.table(), json)?,
                Progress::Rejected(failure) => warn!("{failure}"),
                Progress::Pending => {}
            }
        }
    }

    fn handle(&mut self, event: ClientEvent) -> Result<Progress> {
        match event {
            ClientEvent::Connected { server_url } => {
                debug!(%server_url, "connected");
                Ok(Progress::Pending)
            }
            ClientEvent::Reply(reply) => {
                let result = match &reply {
                    ServerReply::Success(outcome) => outcome.result.clone(),
                    ServerReply::Failure(_) => Value::Null,
                };
                self.apply_reply(reply, result)
            }
            ClientEvent::Error(message) => {
                warn!("{message}");
                Ok(Progress::Pending)
            }
            ClientEvent::Closed => bail!("connection closed by server"),
        }
    }

    fn apply_reply(&mut self, reply: ServerReply, result: Value) -> Result<Progress> {
        match self.sync.apply(reply) {
            Ok(SyncOutcome::Applied { command, effect }) => {
                debug!(%command, ?effect, "applied reply");
                Ok(Progress::Applied(command, result))
            }
            Ok(SyncOutcome::Ignored { .. }) => Ok(Progress::Pending),
            Ok(SyncOutcome::Rejected(failure)) => Ok(Progress::Rejected(failure)),
            Err(err) => {
                warn!("could not apply server reply: {err}");
                Ok(Progress::Pending)
            }
        }
    }
}

enum Progress {
    Pending,
    Applied(Command, Value),
    Rejected(CommandFailure),
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn fields(first_name: &str) -> UserFields {
        UserFields {
            first_name: first_name.into(),
            email: "x@y.z".into(),
            ..UserFields::default()
        }
    }

    #[test]
    fn add_ack_must_echo_the_submitted_fields() {
        let awaited = Awaited::Added(fields("Ours"));
        let ours = json!({"id": 3, "first_name": "Ours", "last_name": "", "email": "x@y.z", "password": ""});
        let theirs = json!({"id": 4, "first_name": "Theirs", "last_name": "", "email": "x@y.z", "password": ""});

        assert!(awaited.matches(Command::AddUser, &ours));
        assert!(!awaited.matches(Command::AddUser, &theirs));
        assert!(!awaited.matches(Command::UpdateUser, &ours));
    }

    #[test]
    fn update_and_delete_acks_match_on_id() {
        let updated = Awaited::Updated(UserId::new("7"));
        assert!(updated.matches(Command::UpdateUser, &json!({"id": 7, "first_name": "A"})));
        assert!(!updated.matches(Command::UpdateUser, &json!({"id": 8, "first_name": "A"})));

        let deleted = Awaited::Deleted(UserId::new("7"));
        assert!(deleted.matches(Command::DeleteUser, &json!({"id": "7"})));
        assert!(!deleted.matches(Command::DeleteUser, &json!({"id": "9"})));
        assert!(!deleted.matches(Command::UpdateUser, &json!({"id": "7"})));
    }

    #[test]
    fn any_list_reply_satisfies_the_list_wait() {
        assert!(Awaited::UserList.matches(Command::GetUserList, &json!([])));
    }
}
