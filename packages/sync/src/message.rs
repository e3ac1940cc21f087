//! Wire envelope exchanged with the authority
//!
//! ```text
//! { "clientId": "diagram-1", "action": { "kind": "updateModel", "newRoot": { ... } } }
//! ```

use crate::errors::SyncError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use trellis_editor::Action;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub action: Action,
}

/// Raw payload as delivered by a transport
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Text(String),
    Json(Value),
}

impl From<String> for InboundMessage {
    fn from(text: String) -> Self {
        InboundMessage::Text(text)
    }
}

impl From<&str> for InboundMessage {
    fn from(text: &str) -> Self {
        InboundMessage::Text(text.to_string())
    }
}

impl From<Value> for InboundMessage {
    fn from(value: Value) -> Self {
        InboundMessage::Json(value)
    }
}

impl ActionMessage {
    pub fn new(client_id: impl Into<String>, action: Action) -> Self {
        Self {
            client_id: Some(client_id.into()),
            action,
        }
    }

    /// Decode an inbound payload. Anything that is not `{ clientId?, action: { kind, .. } }`
    /// is rejected.
    pub fn parse(payload: &InboundMessage) -> Result<Self, SyncError> {
        let parsed = match payload {
            InboundMessage::Text(text) => serde_json::from_str(text),
            InboundMessage::Json(value) => Self::deserialize(value),
        };
        parsed.map_err(|e| SyncError::MalformedMessage(e.to_string()))
    }

    /// True when the message targets `client_id`: no id, an empty id, or the same id
    pub fn is_for(&self, client_id: &str) -> bool {
        match self.client_id.as_deref() {
            None | Some("") => true,
            Some(id) => id == client_id,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_text() {
        let message = ActionMessage::parse(
            &r#"{"clientId":"c1","action":{"kind":"allSelected","select":false}}"#.into(),
        )
        .unwrap();

        assert_eq!(message.client_id.as_deref(), Some("c1"));
        assert_eq!(message.action, Action::select_all(false));
    }

    #[test]
    fn test_parse_json_without_client_id() {
        let message = ActionMessage::parse(&json!({ "action": { "kind": "fit" } }).into()).unwrap();

        assert_eq!(message.client_id, None);
        assert_eq!(message.action.kind(), "fit");
        assert!(message.is_for("anyone"));
    }

    #[test]
    fn test_malformed_payloads() {
        for payload in [
            InboundMessage::from("not json"),
            InboundMessage::from(r#"{"clientId":"c1"}"#),
            InboundMessage::from(json!({ "action": { "select": true } })),
            InboundMessage::from(json!(42)),
        ] {
            let err = ActionMessage::parse(&payload).unwrap_err();
            assert!(matches!(err, SyncError::MalformedMessage(_)), "{:?}", payload);
        }
    }

    #[test]
    fn test_is_for() {
        let mut message = ActionMessage::new("c1", Action::Undo);
        assert!(message.is_for("c1"));
        assert!(!message.is_for("c2"));

        message.client_id = Some(String::new());
        assert!(message.is_for("c2"));
    }

    #[test]
    fn test_outgoing_shape() {
        let json = ActionMessage::new("c1", Action::select_all(true)).to_json().unwrap();
        assert_eq!(
            json,
            r#"{"clientId":"c1","action":{"kind":"allSelected","select":true}}"#
        );
    }
}
