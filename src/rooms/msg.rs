use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identity a client attaches to its joins and messages. Fields other than
/// `id` and `name` are carried along untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Client supplied ids and times may be strings or numbers.
    pub id: Value,
    pub room: String,
    pub text: String,
    pub time: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Summary of the message being replied to, echoed as the client sent it.
    #[serde(default)]
    pub reply_to: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presence {
    pub id: String,
    pub name: String,
    pub status: PresenceStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinPayload {
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// A candidate message as sent by a client. Only `text` is mandatory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub time: Option<Value>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub reply_to: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "room:join")]
    Join(JoinPayload),
    #[serde(rename = "chat:message")]
    Message(SendMessagePayload),
    /// Mail payloads are relayed untouched, so they stay raw JSON.
    #[serde(rename = "mail:send")]
    Mail(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "room:history")]
    History(Vec<Message>),
    #[serde(rename = "chat:message")]
    Message(Message),
    #[serde(rename = "room:presence")]
    Presence(Presence),
    #[serde(rename = "mail:message")]
    Mail(Value),
}

/// Empty strings are treated the same as a missing field.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// JavaScript truthiness for a JSON value.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_omits_missing_user_but_keeps_null_reply() {
        let msg = Message {
            id: "m1".into(),
            room: "general".into(),
            text: "hi".into(),
            time: "10:00".into(),
            user: None,
            reply_to: None,
        };

        let value = serde_json::to_value(ServerEvent::Message(msg)).unwrap();
        assert_eq!(
            value,
            json!({
                "event": "chat:message",
                "data": { "id": "m1", "room": "general", "text": "hi", "time": "10:00", "replyTo": null }
            })
        );
    }

    #[test]
    fn presence_status_is_lowercase() {
        let value = serde_json::to_value(ServerEvent::Presence(Presence {
            id: "u2".into(),
            name: "Bob".into(),
            status: PresenceStatus::Online,
        }))
        .unwrap();

        assert_eq!(value["event"], "room:presence");
        assert_eq!(value["data"]["status"], "online");
    }

    #[test]
    fn decodes_client_events() {
        let join: ClientEvent = serde_json::from_value(json!({
            "event": "room:join",
            "data": { "room": "general", "user": { "id": "u1", "name": "Alice" } }
        }))
        .unwrap();
        let ClientEvent::Join(join) = join else { panic!("expected join") };
        assert_eq!(join.room.as_deref(), Some("general"));
        assert_eq!(join.user.and_then(|u| u.name).as_deref(), Some("Alice"));

        let send: ClientEvent = serde_json::from_value(json!({
            "event": "chat:message",
            "data": { "text": "yo", "replyTo": { "id": "m0", "text": "earlier" } }
        }))
        .unwrap();
        let ClientEvent::Message(send) = send else { panic!("expected message") };
        assert_eq!(send.text.as_deref(), Some("yo"));
        assert!(send.room.is_none());
        assert_eq!(send.reply_to.unwrap()["id"], "m0");

        let mail: ClientEvent = serde_json::from_value(json!({
            "event": "mail:send",
            "data": { "subject": "Hello", "attachments": [] }
        }))
        .unwrap();
        assert!(matches!(mail, ClientEvent::Mail(v) if v["subject"] == "Hello"));
    }

    #[test]
    fn numeric_id_and_time_are_kept() {
        let send: ClientEvent = serde_json::from_value(json!({
            "event": "chat:message",
            "data": { "text": "hi", "id": 1700000000000u64, "time": 1 }
        }))
        .unwrap();
        let ClientEvent::Message(send) = send else { panic!("expected message") };
        assert_eq!(send.id, Some(json!(1700000000000u64)));
        assert_eq!(send.time, Some(json!(1)));
    }

    #[test]
    fn user_keeps_unknown_fields() {
        let raw = json!({ "id": "u1", "name": "A", "avatar": "x.png" });
        let user: User = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(user.extra["avatar"], "x.png");
        assert_eq!(serde_json::to_value(&user).unwrap(), raw);
    }

    #[test]
    fn truthiness_matches_javascript() {
        for falsy in [json!(null), json!(false), json!(""), json!(0), json!(0.0)] {
            assert!(!is_truthy(&falsy), "{falsy} should be falsy");
        }
        for truthy in [json!(true), json!("x"), json!(42), json!([]), json!({})] {
            assert!(is_truthy(&truthy), "{truthy} should be truthy");
        }
    }

    #[test]
    fn unknown_event_is_rejected() {
        let result = serde_json::from_value::<ClientEvent>(json!({ "event": "room:leave", "data": {} }));
        assert!(result.is_err());
    }
}
