use std::{fmt, str::FromStr};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{UserFields, UserId},
    error::ProtocolError,
};

/// Operations understood by the user data service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    GetUserList,
    AddUser,
    UpdateUser,
    DeleteUser,
}

impl Command {
    pub const ALL: [Command; 4] = [
        Command::GetUserList,
        Command::AddUser,
        Command::UpdateUser,
        Command::DeleteUser,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::GetUserList => "get_user_list",
            Command::AddUser => "add_user",
            Command::UpdateUser => "update_user",
            Command::DeleteUser => "delete_user",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|command| command.name() == s)
            .ok_or_else(|| ProtocolError::UnknownCommand(s.to_string()))
    }
}

/// Outbound message naming an operation and its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CommandEnvelope {
    GetUserList,
    AddUser {
        #[serde(flatten)]
        fields: UserFields,
    },
    UpdateUser {
        id: UserId,
        #[serde(flatten)]
        fields: UserFields,
    },
    DeleteUser {
        id: UserId,
    },
}

impl CommandEnvelope {
    pub fn command(&self) -> Command {
        match self {
            CommandEnvelope::GetUserList => Command::GetUserList,
            CommandEnvelope::AddUser { .. } => Command::AddUser,
            CommandEnvelope::UpdateUser { .. } => Command::UpdateUser,
            CommandEnvelope::DeleteUser { .. } => Command::DeleteUser,
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

/// Inbound message: either a completed command with its result or a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerReply {
    #[serde(rename = "ok")]
    Success(CommandOutcome),
    #[serde(rename = "error")]
    Failure(CommandFailure),
}

impl ServerReply {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::MalformedReply)
    }
}

/// Success payload. The command name stays raw so unrelated pushes with
/// unknown names can be skipped instead of failing the whole frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOutcome {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub result: Value,
}

impl CommandOutcome {
    pub fn command(&self) -> Option<Command> {
        self.command.as_deref()?.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandFailure {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.command {
            Some(command) => write!(f, "{command} failed: {}", self.message),
            None => write!(f, "request failed: {}", self.message),
        }
    }
}

/// Decodes a success `result` into the shape `command` produces.
pub fn decode_result<T: DeserializeOwned>(
    command: Command,
    result: Value,
) -> Result<T, ProtocolError> {
    serde_json::from_value(result).map_err(|source| ProtocolError::Payload { command, source })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::{UserField, UserRecord, UserRef};

    fn fields() -> UserFields {
        UserFields {
            first_name: "A".into(),
            last_name: "B".into(),
            email: "a@b.c".into(),
            password: "p".into(),
        }
    }

    #[test]
    fn add_envelope_has_no_id_key() {
        let value = serde_json::to_value(CommandEnvelope::AddUser { fields: fields() })
            .expect("encode");
        assert_eq!(
            value,
            json!({
                "command": "add_user",
                "first_name": "A",
                "last_name": "B",
                "email": "a@b.c",
                "password": "p",
            })
        );
        assert!(value.get("id").is_none());
    }

    #[test]
    fn update_and_delete_envelopes_carry_the_id() {
        let update = serde_json::to_value(CommandEnvelope::UpdateUser {
            id: UserId::new("42"),
            fields: fields(),
        })
        .expect("encode");
        assert_eq!(update["command"], "update_user");
        assert_eq!(update["id"], "42");

        let delete = serde_json::to_value(CommandEnvelope::DeleteUser {
            id: UserId::new("42"),
        })
        .expect("encode");
        assert_eq!(delete, json!({"command": "delete_user", "id": "42"}));
    }

    #[test]
    fn list_request_is_bare() {
        assert_eq!(
            CommandEnvelope::GetUserList.to_json().expect("encode"),
            r#"{"command":"get_user_list"}"#
        );
    }

    #[test]
    fn parses_success_and_error_replies() {
        let ok = ServerReply::parse(
            r#"{"ok":{"command":"add_user","result":{"id":1,"first_name":"A"}}}"#,
        )
        .expect("ok reply");
        let ServerReply::Success(outcome) = ok else {
            panic!("expected success reply");
        };
        assert_eq!(outcome.command(), Some(Command::AddUser));

        let err = ServerReply::parse(
            r#"{"error":{"command":"update_user","message":"bad id"}}"#,
        )
        .expect("error reply");
        let ServerReply::Failure(failure) = err else {
            panic!("expected error reply");
        };
        assert_eq!(failure.to_string(), "update_user failed: bad id");
    }

    #[test]
    fn marker_less_frames_are_rejected() {
        assert!(matches!(
            ServerReply::parse(r#"{"command":"add_user","result":{}}"#),
            Err(ProtocolError::MalformedReply(_))
        ));
        assert!(ServerReply::parse("not json").is_err());
    }

    #[test]
    fn unknown_command_names_do_not_resolve() {
        let outcome = CommandOutcome {
            command: Some("get_user".into()),
            result: Value::Null,
        };
        assert_eq!(outcome.command(), None);
        assert!(matches!(
            "get_user".parse::<Command>(),
            Err(ProtocolError::UnknownCommand(name)) if name == "get_user"
        ));
    }

    #[test]
    fn decodes_list_in_delivered_order() {
        let records: Vec<UserRecord> = decode_result(
            Command::GetUserList,
            json!([{"id": "b", "first_name": "B"}, {"id": "a", "first_name": "A"}]),
        )
        .expect("list");
        let names: Vec<_> = records
            .iter()
            .map(|r| r.get(UserField::FirstName))
            .collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn wrong_result_shape_names_the_command() {
        let err = decode_result::<UserRef>(Command::DeleteUser, json!([1, 2])).expect_err("shape");
        assert!(matches!(
            err,
            ProtocolError::Payload {
                command: Command::DeleteUser,
                ..
            }
        ));
    }
}
