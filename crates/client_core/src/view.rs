//! Row model of the visible user table.
//!
//! The table is the only client-side copy of user data. Rows keep insertion
//! order and are addressed by the key derived from the user id.

use std::collections::HashMap;

use shared::domain::{RowKey, UpdatedUser, UserField, UserId, UserRecord};

/// Control rendered in each row. Actions carry the id only; the record is
/// resolved from the table when the action fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAction {
    Edit(UserId),
    Delete(UserId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    key: RowKey,
    record: UserRecord,
}

impl UserRow {
    fn new(record: UserRecord) -> Self {
        Self {
            key: record.id.row_key(),
            record,
        }
    }

    pub fn key(&self) -> &RowKey {
        &self.key
    }

    pub fn id(&self) -> &UserId {
        &self.record.id
    }

    pub fn record(&self) -> &UserRecord {
        &self.record
    }

    /// Cell text, rendered as provided.
    pub fn cell(&self, field: UserField) -> &str {
        self.record.get(field)
    }

    pub fn edit_action(&self) -> RowAction {
        RowAction::Edit(self.record.id.clone())
    }

    pub fn delete_action(&self) -> RowAction {
        RowAction::Delete(self.record.id.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserTable {
    order: Vec<RowKey>,
    rows: HashMap<RowKey, UserRow>,
}

impl UserTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Appends a row for `record`. Returns `false` when a row for the id
    /// already existed; that row is refreshed in place instead.
    pub fn insert_row(&mut self, record: UserRecord) -> bool {
        let row = UserRow::new(record);
        let key = row.key.clone();
        if self.rows.insert(key.clone(), row).is_some() {
            return false;
        }
        self.order.push(key);
        true
    }

    /// Overwrites the cells present in `update`. Returns `false` when no row
    /// matches the id.
    pub fn update_row(&mut self, update: &UpdatedUser) -> bool {
        let Some(row) = self.rows.get_mut(&update.id.row_key()) else {
            return false;
        };
        for (field, value) in update.patch.present_fields() {
            *row.record.fields.get_mut(field) = value.to_string();
        }
        true
    }

    pub fn remove_row(&mut self, id: &UserId) -> Option<UserRow> {
        let key = id.row_key();
        let row = self.rows.remove(&key)?;
        self.order.retain(|existing| existing != &key);
        Some(row)
    }

    pub fn row(&self, id: &UserId) -> Option<&UserRow> {
        self.row_by_key(&id.row_key())
    }

    pub fn row_by_key(&self, key: &RowKey) -> Option<&UserRow> {
        self.rows.get(key)
    }

    /// Current record for `id`, as an edit action should see it.
    pub fn record(&self, id: &UserId) -> Option<&UserRecord> {
        self.row(id).map(UserRow::record)
    }

    /// Rows in display order.
    pub fn rows(&self) -> impl Iterator<Item = &UserRow> + '_ {
        self.order.iter().filter_map(|key| self.rows.get(key))
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::{UserFields, UserPatch};

    use super::*;

    fn record(id: &str, first_name: &str) -> UserRecord {
        UserRecord::new(
            UserId::new(id),
            UserFields {
                first_name: first_name.into(),
                last_name: "L".into(),
                email: format!("{id}@example.com"),
                password: "secret".into(),
            },
        )
    }

    #[test]
    fn rows_keep_insertion_order() {
        let mut table = UserTable::new();
        assert!(table.insert_row(record("3", "C")));
        assert!(table.insert_row(record("1", "A")));
        assert!(table.insert_row(record("2", "B")));

        let ids: Vec<_> = table.rows().map(|row| row.id().as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
        assert_eq!(
            table.row(&UserId::new("1")).map(|row| row.key().as_str()),
            Some("user_1")
        );
    }

    #[test]
    fn duplicate_id_refreshes_without_a_second_row() {
        let mut table = UserTable::new();
        table.insert_row(record("1", "A"));
        table.insert_row(record("2", "B"));
        assert!(!table.insert_row(record("1", "Z")));

        assert_eq!(table.len(), 2);
        let first = table.rows().next().expect("row");
        assert_eq!(first.cell(UserField::FirstName), "Z");
    }

    #[test]
    fn update_on_missing_row_reports_false() {
        let mut table = UserTable::new();
        let update = UpdatedUser {
            id: UserId::new("nope"),
            patch: UserPatch {
                first_name: Some("X".into()),
                ..UserPatch::default()
            },
        };
        assert!(!table.update_row(&update));
        assert!(table.is_empty());
    }

    #[test]
    fn row_actions_carry_only_the_id() {
        let mut table = UserTable::new();
        table.insert_row(record("9", "N"));
        let row = table.rows().next().expect("row");

        assert_eq!(row.edit_action(), RowAction::Edit(UserId::new("9")));
        assert_eq!(row.delete_action(), RowAction::Delete(UserId::new("9")));
    }

    #[test]
    fn remove_keeps_the_remaining_order() {
        let mut table = UserTable::new();
        for (id, name) in [("1", "A"), ("2", "B"), ("3", "C")] {
            table.insert_row(record(id, name));
        }
        let removed = table.remove_row(&UserId::new("2")).expect("removed");
        assert_eq!(removed.cell(UserField::FirstName), "B");
        assert!(table.remove_row(&UserId::new("2")).is_none());

        let ids: Vec<_> = table.rows().map(|row| row.id().as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }
}
