//! Webhook event envelope

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// One inbound webhook delivery: the event name plus its JSON payload.
///
/// Read-only once constructed; dispatch hands it to handlers behind an
/// `Arc` and drops it when the delivery has settled.
#[derive(Debug, Clone)]
pub struct Event {
    name: String,
    delivery_id: String,
    payload: Value,
    received_at: DateTime<Utc>,
}

impl Event {
    /// Create an event, synthesizing a delivery id.
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self::with_delivery_id(name, Uuid::now_v7().to_string(), payload)
    }

    /// Create an event carrying the delivery id supplied by the sender.
    pub fn with_delivery_id(
        name: impl Into<String>,
        delivery_id: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            name: name.into(),
            delivery_id: delivery_id.into(),
            payload,
            received_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn delivery_id(&self) -> &str {
        &self.delivery_id
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// The payload's action sub-field, when present.
    pub fn action(&self) -> Option<&str> {
        self.payload.get("action").and_then(|a| a.as_str())
    }

    /// Installation id carried by the payload, used for scoped authentication.
    pub fn installation_id(&self) -> Option<u64> {
        self.payload
            .get("installation")
            .and_then(|i| i.get("id"))
            .and_then(|id| id.as_u64())
    }

    /// Login of the account that triggered the event.
    pub fn sender_login(&self) -> Option<&str> {
        self.payload
            .get("sender")
            .and_then(|s| s.get("login"))
            .and_then(|l| l.as_str())
    }

    /// Account type of the sender (`"User"`, `"Bot"`, `"Organization"`).
    pub fn sender_type(&self) -> Option<&str> {
        self.payload
            .get("sender")
            .and_then(|s| s.get("type"))
            .and_then(|t| t.as_str())
    }

    /// Keys this event is dispatched under: the bare event name and, when
    /// the payload carries an action, the `event.action` pair.
    pub fn dispatch_keys(&self) -> Vec<String> {
        let mut keys = vec![self.name.clone()];
        if let Some(action) = self.action() {
            keys.push(format!("{}.{}", self.name, action));
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dispatch_keys_include_event_action_pair() {
        let event = Event::new("issues", json!({"action": "opened"}));
        assert_eq!(event.dispatch_keys(), vec!["issues", "issues.opened"]);
    }

    #[test]
    fn dispatch_keys_without_action_are_just_the_event_name() {
        let event = Event::new("push", json!({"ref": "refs/heads/main"}));
        assert_eq!(event.dispatch_keys(), vec!["push"]);
    }

    #[test]
    fn installation_id_is_read_from_payload() {
        let event = Event::new("issues", json!({"installation": {"id": 12345}}));
        assert_eq!(event.installation_id(), Some(12345));

        let event = Event::new("issues", json!({}));
        assert_eq!(event.installation_id(), None);
    }

    #[test]
    fn synthesized_delivery_id_is_not_empty() {
        let event = Event::new("push", json!({}));
        assert!(!event.delivery_id().is_empty());
    }

    #[test]
    fn sender_fields_are_read_from_payload() {
        let event = Event::new(
            "issues",
            json!({"sender": {"login": "octocat", "type": "User"}}),
        );
        assert_eq!(event.sender_login(), Some("octocat"));
        assert_eq!(event.sender_type(), Some("User"));
    }
}
