use std::cell::RefCell;

use serde_json::json;
use shared::{
    domain::{UserField, UserFields, UserId, UserRecord},
    protocol::{CommandEnvelope, ServerReply},
};

use super::*;

/// Loopback sink that keeps what was sent for inspection.
#[derive(Default)]
struct Outbox {
    sent: RefCell<Vec<CommandEnvelope>>,
}

impl CommandSink for Outbox {
    fn send_command(&self, envelope: CommandEnvelope) -> Result<(), SinkError> {
        self.sent.borrow_mut().push(envelope);
        Ok(())
    }
}

impl Outbox {
    fn take(&self) -> Vec<serde_json::Value> {
        self.sent
            .borrow_mut()
            .drain(..)
            .map(|envelope| serde_json::to_value(envelope).expect("encode"))
            .collect()
    }
}

fn ok(command: &str, result: serde_json::Value) -> ServerReply {
    ServerReply::parse(&json!({"ok": {"command": command, "result": result}}).to_string())
        .expect("reply")
}

#[test]
fn add_form_to_new_row_scenario() {
    let outbox = Outbox::default();
    let mut router = CommandRouter::new(&outbox);
    let mut sync = ViewSynchronizer::new();

    for (field, value) in [
        (UserField::FirstName, "A"),
        (UserField::LastName, "B"),
        (UserField::Email, "a@b.c"),
        (UserField::Password, "p"),
    ] {
        router.form_mut().set_field(field, value);
    }
    router.submit_add_or_update().expect("submit");

    let sent = outbox.take();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["command"], "add_user");
    assert!(sent[0].get("id").is_none());
    assert_eq!(router.form().mode(), FormMode::Add);

    let reply = ok(
        "add_user",
        json!({"id": 1, "first_name": "A", "last_name": "B", "email": "a@b.c", "password": "p"}),
    );
    sync.apply(reply).expect("apply");

    let rows: Vec<_> = sync.table().rows().collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].key().as_str(), "user_1");
    assert_eq!(router.form().mode(), FormMode::Add);
}

#[test]
fn update_submission_keeps_the_identifier_verbatim() {
    let outbox = Outbox::default();
    let mut router = CommandRouter::new(&outbox);
    router.form_mut().set_id("5a1b2c3d4e5f601234567890");
    router.form_mut().set_field(UserField::FirstName, "Edited");
    router.submit_add_or_update().expect("submit");

    let sent = outbox.take();
    assert_eq!(sent[0]["command"], "update_user");
    assert_eq!(sent[0]["id"], "5a1b2c3d4e5f601234567890");
    assert_eq!(sent[0]["first_name"], "Edited");
}

#[test]
fn server_responses_never_change_the_form_mode() {
    let outbox = Outbox::default();
    let mut router = CommandRouter::new(&outbox);
    let mut sync = ViewSynchronizer::new();
    sync.apply(ok("get_user_list", json!([{"id": "k", "first_name": "K"}])))
        .expect("list");

    let edit = sync.table().rows().next().expect("row").edit_action();
    router.perform(edit, sync.table()).expect("edit");
    assert_eq!(router.form().mode(), FormMode::Edit);

    sync.apply(ok("update_user", json!({"id": "k", "first_name": "K2"})))
        .expect("update");
    sync.apply(ok("delete_user", json!({"id": "k"})))
        .expect("delete");
    assert_eq!(router.form().mode(), FormMode::Edit);
    assert_eq!(router.form().field(UserField::FirstName), "K");

    router.reset_form();
    assert_eq!(router.form().mode(), FormMode::Add);
    assert!(outbox.take().is_empty());
}

#[test]
fn edit_after_update_sees_the_latest_values() {
    let outbox = Outbox::default();
    let mut router = CommandRouter::new(&outbox);
    let mut sync = ViewSynchronizer::new();
    sync.apply(ok(
        "add_user",
        json!({"id": "u", "first_name": "Old", "last_name": "Name", "email": "o@x.io", "password": "pw"}),
    ))
    .expect("add");
    let edit = sync.table().rows().next().expect("row").edit_action();

    sync.apply(ok("update_user", json!({"id": "u", "first_name": "New"})))
        .expect("update");
    router.perform(edit, sync.table()).expect("edit");

    let expected = UserRecord::new(
        UserId::new("u"),
        UserFields {
            first_name: "New".into(),
            last_name: "Name".into(),
            email: "o@x.io".into(),
            password: "pw".into(),
        },
    );
    assert_eq!(router.form().id(), "u");
    assert_eq!(router.form().values(), &expected.fields);
}

#[test]
fn delete_request_waits_for_the_acknowledgement() {
    let outbox = Outbox::default();
    let router = CommandRouter::new(&outbox);
    let mut sync = ViewSynchronizer::new();
    sync.apply(ok("get_user_list", json!([{"id": 3}, {"id": 4}])))
        .expect("list");

    router.request_delete(UserId::new("3")).expect("send");
    assert_eq!(sync.table().len(), 2);
    assert_eq!(outbox.take(), vec![json!({"command": "delete_user", "id": "3"})]);

    sync.apply(ok("delete_user", json!({"id": "3"})))
        .expect("ack");
    let ids: Vec<_> = sync.table().rows().map(|row| row.id().as_str()).collect();
    assert_eq!(ids, vec!["4"]);
}
