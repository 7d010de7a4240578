use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned user identifier.
///
/// The data service hands out opaque ids; some deployments emit them as JSON
/// strings, others as integers. Both decode to the same textual form so the
/// row key and the outbound `id` field never depend on the wire flavour.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn row_key(&self) -> RowKey {
        RowKey(format!("user_{}", self.0))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawUserId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawUserId::deserialize(deserializer)? {
            RawUserId::Text(text) => Self(text),
            RawUserId::Signed(value) => Self(value.to_string()),
            RawUserId::Unsigned(value) => Self(value.to_string()),
        })
    }
}

/// Key of the row that renders a given user; derived from the id alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey(String);

impl RowKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Editable attributes of a user, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserField {
    FirstName,
    LastName,
    Email,
    Password,
}

impl UserField {
    pub const ALL: [UserField; 4] = [
        UserField::FirstName,
        UserField::LastName,
        UserField::Email,
        UserField::Password,
    ];

    /// Wire and form field name.
    pub fn name(self) -> &'static str {
        match self {
            UserField::FirstName => "first_name",
            UserField::LastName => "last_name",
            UserField::Email => "email",
            UserField::Password => "password",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UserField::FirstName => "First name",
            UserField::LastName => "Last name",
            UserField::Email => "Email",
            UserField::Password => "Password",
        }
    }
}

/// Missing or `null` attributes read as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFields {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub last_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub password: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl UserFields {
    pub fn get(&self, field: UserField) -> &str {
        match field {
            UserField::FirstName => &self.first_name,
            UserField::LastName => &self.last_name,
            UserField::Email => &self.email,
            UserField::Password => &self.password,
        }
    }

    pub fn get_mut(&mut self, field: UserField) -> &mut String {
        match field {
            UserField::FirstName => &mut self.first_name,
            UserField::LastName => &mut self.last_name,
            UserField::Email => &mut self.email,
            UserField::Password => &mut self.password,
        }
    }
}

/// One user as known to the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    #[serde(flatten)]
    pub fields: UserFields,
}

impl UserRecord {
    pub fn new(id: UserId, fields: UserFields) -> Self {
        Self { id, fields }
    }

    pub fn get(&self, field: UserField) -> &str {
        self.fields.get(field)
    }
}

/// Update acknowledgement; only the attributes the server echoed are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserPatch {
    pub fn get(&self, field: UserField) -> Option<&str> {
        match field {
            UserField::FirstName => self.first_name.as_deref(),
            UserField::LastName => self.last_name.as_deref(),
            UserField::Email => self.email.as_deref(),
            UserField::Password => self.password.as_deref(),
        }
    }

    pub fn present_fields(&self) -> impl Iterator<Item = (UserField, &str)> + '_ {
        UserField::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|value| (field, value)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedUser {
    pub id: UserId,
    #[serde(flatten)]
    pub patch: UserPatch,
}

/// Delete acknowledgement; the server echoes only the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: UserId,
}
