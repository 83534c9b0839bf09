//! Tests for [`dbot_core::Update`] decoding from Bot API JSON and the `effective_*` accessors.

use dbot_core::{ChatMemberStatus, ChatType, MessageEntityKind, Update, UpdateKind};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_decode_command_message() {
    let update: Update = serde_json::from_value(json!({
        "update_id": 10,
        "message": {
            "message_id": 5,
            "date": 1_700_000_000,
            "from": {"id": 42, "is_bot": false, "first_name": "Ann", "username": "ann"},
            "chat": {"id": -100, "type": "supergroup", "title": "Devs"},
            "text": "/start@FooBot hello",
            "entities": [{"type": "bot_command", "offset": 0, "length": 13}]
        }
    }))
    .unwrap();

    assert_eq!(update.update_id, 10);
    let message = update.message().expect("message kind");
    assert_eq!(message.chat.chat_type, ChatType::Supergroup);
    assert_eq!(message.entities[0].kind, MessageEntityKind::BotCommand);
    assert_eq!(message.date.timestamp(), 1_700_000_000);
    assert_eq!(update.effective_user().map(|u| u.id), Some(42));
    assert_eq!(update.effective_chat().map(|c| c.id), Some(-100));
}

#[test]
fn test_decode_unknown_kind() {
    let update: Update = serde_json::from_value(json!({
        "update_id": 11,
        "business_message": {"foo": 1}
    }))
    .unwrap();
    assert_eq!(update.kind, UpdateKind::Unknown);
    assert!(update.effective_message().is_none());
}

#[test]
fn test_callback_query_effective_message_and_user() {
    let update: Update = serde_json::from_value(json!({
        "update_id": 12,
        "callback_query": {
            "id": "cb1",
            "from": {"id": 7, "first_name": "Bo"},
            "chat_instance": "x",
            "data": "page:2",
            "message": {"message_id": 3, "chat": {"id": 7, "type": "private"}, "text": "menu"}
        }
    }))
    .unwrap();

    let query = update.callback_query().unwrap();
    assert_eq!(query.data.as_deref(), Some("page:2"));
    assert_eq!(update.effective_user().unwrap().id, 7);
    assert_eq!(update.effective_message().unwrap().text.as_deref(), Some("menu"));
}

#[test]
fn test_my_chat_member_effective_chat() {
    let update: Update = serde_json::from_value(json!({
        "update_id": 13,
        "my_chat_member": {
            "chat": {"id": -5, "type": "group"},
            "from": {"id": 1, "first_name": "Admin"},
            "date": 0,
            "old_chat_member": {"user": {"id": 99, "is_bot": true, "first_name": "Bot"}, "status": "left"},
            "new_chat_member": {"user": {"id": 99, "is_bot": true, "first_name": "Bot"}, "status": "member"}
        }
    }))
    .unwrap();

    let change = update.my_chat_member().unwrap();
    assert!(change.new_chat_member.status.is_present());
    assert_eq!(change.old_chat_member.status, ChatMemberStatus::Left);
    assert_eq!(update.effective_chat().unwrap().id, -5);
    assert!(update.chat_member().is_none());
}

#[test]
fn test_serialize_uses_wire_field_name() {
    let update: Update = serde_json::from_value(json!({
        "update_id": 14,
        "poll": {"id": "p", "question": "?", "options": [], "type": "regular"}
    }))
    .unwrap();
    let value = serde_json::to_value(&update).unwrap();
    assert_eq!(value["update_id"], json!(14));
    assert_eq!(value["poll"]["question"], json!("?"));
    assert!(value.get("message").is_none());
}
