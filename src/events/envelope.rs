//! Backend event payload shapes.
//!
//! The backend has emitted three shapes over time for the same concept:
//! a bare envelope (`event`, `sequence_id`, `timestamp`), an enriched
//! envelope carrying delivery metadata, and a batch log wrapping a list of
//! envelopes between two timestamps. Older `/events` responses were a plain
//! list of envelopes. [`EventPayload`] classifies a raw JSON value into one of
//! these by which fields are present.
//!
//! Only the top-level shape is enforced. Everything below `event` is read
//! defensively and missing values degrade to empty strings.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{ConsoleError, Result};

/// Key of the provenance record inside a raw event.
pub const HOPS_KEY: &str = "hops";

const ENRICHMENT_KEYS: [&str; 5] = ["app_name", "channel", "done", "handler_name", "message_id"];

/// A backend event exactly as it was emitted.
///
/// Held as an opaque JSON value so it can be shown verbatim. Accessors look
/// into `hops` without assuming any level of it exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawEvent(Value);

impl RawEvent {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// The `hops` provenance record, if present and an object.
    pub fn hops(&self) -> Option<&Map<String, Value>> {
        self.0.get(HOPS_KEY)?.as_object()
    }

    fn hops_str(&self, key: &str) -> &str {
        self.hops()
            .and_then(|hops| hops.get(key))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Originating component, or `""`.
    pub fn source(&self) -> &str {
        self.hops_str("source")
    }

    /// Event type name, or `""`.
    pub fn event_name(&self) -> &str {
        self.hops_str("event")
    }

    /// Event action, or `""`.
    pub fn action(&self) -> &str {
        self.hops_str("action")
    }
}

impl From<Value> for RawEvent {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Tri-state `done` marker on enriched envelopes.
///
/// Only the JSON booleans count. `0`, `"false"`, `null` and a missing field
/// are all [`DoneFlag::Unset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DoneFlag {
    True,
    False,
    #[default]
    Unset,
}

impl DoneFlag {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Bool(true)) => Self::True,
            Some(Value::Bool(false)) => Self::False,
            _ => Self::Unset,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
            Self::Unset => "",
        }
    }
}

impl Serialize for DoneFlag {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Fields shared by every envelope shape.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeHeader {
    /// The wrapped event (`null` when the envelope had none).
    pub event: RawEvent,
    /// Pipeline sequence the event belongs to, `""` when absent.
    pub sequence_id: String,
    /// When the event was delivered, as found in the payload.
    pub timestamp: Value,
}

/// Delivery metadata carried by enriched envelopes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub app_name: Option<String>,
    pub channel: Option<String>,
    pub done: DoneFlag,
    pub handler_name: Option<String>,
    pub message_id: Option<String>,
}

/// A single event log entry.
#[derive(Debug, Clone, PartialEq)]
pub enum EventEnvelope {
    /// `{ event, sequence_id, timestamp }`
    Bare(EnvelopeHeader),
    /// A bare envelope plus any of the delivery metadata fields.
    Enriched {
        header: EnvelopeHeader,
        enrichment: Enrichment,
    },
}

impl EventEnvelope {
    pub fn header(&self) -> &EnvelopeHeader {
        match self {
            Self::Bare(header) | Self::Enriched { header, .. } => header,
        }
    }

    pub fn event(&self) -> &RawEvent {
        &self.header().event
    }

    pub fn enrichment(&self) -> Option<&Enrichment> {
        match self {
            Self::Bare(_) => None,
            Self::Enriched { enrichment, .. } => Some(enrichment),
        }
    }

    fn from_object(mut obj: Map<String, Value>) -> Self {
        let enriched = ENRICHMENT_KEYS.iter().any(|key| obj.contains_key(*key));

        let header = EnvelopeHeader {
            event: RawEvent(obj.remove("event").unwrap_or(Value::Null)),
            sequence_id: match obj.remove("sequence_id") {
                Some(Value::String(id)) => id,
                Some(Value::Number(id)) => id.to_string(),
                _ => String::new(),
            },
            timestamp: obj.remove("timestamp").unwrap_or(Value::Null),
        };

        if !enriched {
            return Self::Bare(header);
        }

        let enrichment = Enrichment {
            app_name: take_string(&mut obj, "app_name"),
            channel: take_string(&mut obj, "channel"),
            done: DoneFlag::from_value(obj.get("done")),
            handler_name: take_string(&mut obj, "handler_name"),
            message_id: take_string(&mut obj, "message_id"),
        };

        Self::Enriched { header, enrichment }
    }
}

impl TryFrom<Value> for EventEnvelope {
    type Error = ConsoleError;

    fn try_from(value: Value) -> Result<Self> {
        expect_object(value, "event envelope").map(Self::from_object)
    }
}

/// A time-bounded batch of envelopes as returned by the event log endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchLog {
    pub start_timestamp: Value,
    pub end_timestamp: Value,
    /// Envelopes in the order the backend delivered them.
    pub event_items: Vec<EventEnvelope>,
}

impl BatchLog {
    fn from_object(mut obj: Map<String, Value>) -> Result<Self> {
        let items = match obj.remove("event_items") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(ConsoleError::invalid_payload(format!(
                    "event_items must be an array, got {}",
                    json_kind(&other)
                )));
            }
            None => return Err(ConsoleError::invalid_payload("batch log has no event_items")),
        };

        let event_items = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                expect_object(item, &format!("event_items[{i}]")).map(EventEnvelope::from_object)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            start_timestamp: obj.remove("start_timestamp").unwrap_or(Value::Null),
            end_timestamp: obj.remove("end_timestamp").unwrap_or(Value::Null),
            event_items,
        })
    }
}

impl TryFrom<Value> for BatchLog {
    type Error = ConsoleError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_object(expect_object(value, "batch log")?)
    }
}

/// Any event payload the console knows how to display.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Batch(BatchLog),
    Single(EventEnvelope),
    List(Vec<EventEnvelope>),
}

impl TryFrom<Value> for EventPayload {
    type Error = ConsoleError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(obj) if obj.contains_key("event_items") => {
                BatchLog::from_object(obj).map(Self::Batch)
            }
            Value::Object(obj) => Ok(Self::Single(EventEnvelope::from_object(obj))),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    expect_object(item, &format!("events[{i}]")).map(EventEnvelope::from_object)
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::List),
            other => Err(ConsoleError::invalid_payload(format!(
                "event payload must be an object or an array, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn expect_object(value: Value, what: &str) -> Result<Map<String, Value>> {
    match value {
        Value::Object(obj) => Ok(obj),
        other => Err(ConsoleError::invalid_payload(format!(
            "{what} must be an object, got {}",
            json_kind(&other)
        ))),
    }
}

fn take_string(obj: &mut Map<String, Value>, key: &str) -> Option<String> {
    match obj.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_envelope() {
        let envelope = EventEnvelope::try_from(json!({
            "event": {"hops": {"source": "github", "event": "push"}},
            "sequence_id": "abc123",
            "timestamp": "2023-11-22T10:44:00Z"
        }))
        .unwrap();

        assert!(matches!(envelope, EventEnvelope::Bare(_)));
        assert_eq!(envelope.header().sequence_id, "abc123");
        assert_eq!(envelope.event().source(), "github");
        assert_eq!(envelope.event().event_name(), "push");
        assert_eq!(envelope.event().action(), "");
        assert!(envelope.enrichment().is_none());
    }

    #[test]
    fn test_single_enrichment_field_makes_envelope_enriched() {
        let envelope = EventEnvelope::try_from(json!({
            "event": {},
            "sequence_id": "s1",
            "timestamp": "2023-11-22T10:44:00Z",
            "done": false
        }))
        .unwrap();

        let enrichment = envelope.enrichment().unwrap();
        assert_eq!(enrichment.done, DoneFlag::False);
        assert!(enrichment.app_name.is_none());
    }

    #[test]
    fn test_enriched_envelope_fields() {
        let envelope = EventEnvelope::try_from(json!({
            "event": {"hops": {"source": "hiphops", "event": "task", "action": "deploy"}},
            "sequence_id": "s2",
            "timestamp": "2023-11-22T10:44:00Z",
            "app_name": "k8s",
            "channel": "request",
            "handler_name": "apply",
            "message_id": "deploy_step"
        }))
        .unwrap();

        let enrichment = envelope.enrichment().unwrap();
        assert_eq!(enrichment.app_name.as_deref(), Some("k8s"));
        assert_eq!(enrichment.channel.as_deref(), Some("request"));
        assert_eq!(enrichment.handler_name.as_deref(), Some("apply"));
        assert_eq!(enrichment.message_id.as_deref(), Some("deploy_step"));
        assert_eq!(enrichment.done, DoneFlag::Unset);
    }

    #[test]
    fn test_done_flag_is_strict() {
        assert_eq!(DoneFlag::from_value(Some(&json!(true))), DoneFlag::True);
        assert_eq!(DoneFlag::from_value(Some(&json!(false))), DoneFlag::False);
        assert_eq!(DoneFlag::from_value(Some(&json!(0))), DoneFlag::Unset);
        assert_eq!(DoneFlag::from_value(Some(&json!("false"))), DoneFlag::Unset);
        assert_eq!(DoneFlag::from_value(Some(&Value::Null)), DoneFlag::Unset);
        assert_eq!(DoneFlag::from_value(None), DoneFlag::Unset);
    }

    #[test]
    fn test_raw_event_tolerates_odd_hops() {
        let no_hops = RawEvent::new(json!({"foo": "bar"}));
        assert_eq!(no_hops.source(), "");
        assert!(no_hops.hops().is_none());

        let scalar_hops = RawEvent::new(json!({"hops": "github"}));
        assert_eq!(scalar_hops.event_name(), "");

        let numeric_fields = RawEvent::new(json!({"hops": {"source": 7, "action": null}}));
        assert_eq!(numeric_fields.source(), "");
        assert_eq!(numeric_fields.action(), "");

        let not_an_object = RawEvent::new(json!([1, 2, 3]));
        assert_eq!(not_an_object.source(), "");
    }

    #[test]
    fn test_numeric_sequence_id() {
        let envelope = EventEnvelope::try_from(json!({"event": {}, "sequence_id": 42})).unwrap();
        assert_eq!(envelope.header().sequence_id, "42");
        assert_eq!(envelope.header().timestamp, Value::Null);
    }

    #[test]
    fn test_non_object_envelope_is_invalid() {
        let err = EventEnvelope::try_from(json!("event")).unwrap_err();
        assert!(matches!(err, ConsoleError::InvalidPayload(_)));
        assert!(err.to_string().contains("got string"));
    }

    #[test]
    fn test_payload_classification() {
        let batch = EventPayload::try_from(json!({
            "start_timestamp": "2023-11-22T09:44:00Z",
            "end_timestamp": "2023-11-22T10:44:00Z",
            "event_items": [{"event": {}, "sequence_id": "a", "timestamp": "2023-11-22T10:00:00Z"}]
        }))
        .unwrap();
        assert!(matches!(batch, EventPayload::Batch(ref log) if log.event_items.len() == 1));

        let single = EventPayload::try_from(json!({"event": {}, "sequence_id": "a"})).unwrap();
        assert!(matches!(single, EventPayload::Single(_)));

        let list = EventPayload::try_from(json!([{"event": {}}, {"event": {}}])).unwrap();
        assert!(matches!(list, EventPayload::List(ref items) if items.len() == 2));

        assert!(EventPayload::try_from(json!(12)).is_err());
    }

    #[test]
    fn test_batch_rejects_bad_items() {
        let err = EventPayload::try_from(json!({"event_items": {"a": 1}})).unwrap_err();
        assert!(err.to_string().contains("event_items must be an array"));

        let err = EventPayload::try_from(json!({"event_items": [{"event": {}}, null]})).unwrap_err();
        assert!(err.to_string().contains("event_items[1]"));

        let err = EventPayload::try_from(json!([{"event": {}}, 3])).unwrap_err();
        assert!(err.to_string().contains("events[1]"));
    }

    #[test]
    fn test_batch_log_requires_items() {
        let err = BatchLog::try_from(json!({"start_timestamp": "x"})).unwrap_err();
        assert!(matches!(err, ConsoleError::InvalidPayload(_)));
    }
}
