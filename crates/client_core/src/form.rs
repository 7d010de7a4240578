//! Editable user form backing the add/edit panel.

use shared::{
    domain::{UserField, UserFields, UserId, UserRecord},
    protocol::CommandEnvelope,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Add,
    Edit,
}

/// Form state: a hidden id plus one text value per [`UserField`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserForm {
    id: String,
    fields: UserFields,
    mode: FormMode,
}

impl UserForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn field(&self, field: UserField) -> &str {
        self.fields.get(field)
    }

    pub fn field_mut(&mut self, field: UserField) -> &mut String {
        self.fields.get_mut(field)
    }

    pub fn set_field(&mut self, field: UserField, value: impl Into<String>) {
        *self.fields.get_mut(field) = value.into();
    }

    /// Current text of every field, without the hidden id.
    pub fn values(&self) -> &UserFields {
        &self.fields
    }

    /// Clears every input, hidden id included, and returns to add mode.
    pub fn reset(&mut self) {
        self.id.clear();
        self.fields = UserFields::default();
        self.mode = FormMode::Add;
    }

    pub fn populate_for_edit(&mut self, record: &UserRecord) {
        self.id = record.id.as_str().to_string();
        for field in UserField::ALL {
            self.set_field(field, record.get(field));
        }
        self.mode = FormMode::Edit;
    }

    /// Builds the envelope for the current contents: `update_user` when the
    /// hidden id is set, `add_user` with no id otherwise.
    pub fn to_envelope(&self) -> CommandEnvelope {
        let fields = self.fields.clone();
        if self.id.is_empty() {
            CommandEnvelope::AddUser { fields }
        } else {
            CommandEnvelope::UpdateUser {
                id: UserId::new(self.id.clone()),
                fields,
            }
        }
    }

    /// Takes the envelope and leaves the form reset.
    pub fn submit(&mut self) -> CommandEnvelope {
        let envelope = self.to_envelope();
        self.reset();
        envelope
    }
}
