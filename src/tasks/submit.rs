//! Task run submission.
//!
//! A submission ends in exactly one of two states: accepted, carrying the
//! source event to publish, or rejected, carrying every validation failure.
//! Nothing is built for a rejected submission.

use std::collections::BTreeMap;
use std::io;

use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use serde_json::{Map, Value};
use sha1::{Digest, Sha1};
use tracing::debug;

use super::task::Task;
use super::validate::{ValidationErrors, validate_input};
use crate::error::{ConsoleError, Result};
use crate::events::envelope::{HOPS_KEY, RawEvent, json_kind};

/// `hops.source` stamped on events raised by task runs.
pub const TASK_EVENT_SOURCE: &str = "hiphops";
/// `hops.event` stamped on events raised by task runs.
pub const TASK_EVENT_NAME: &str = "task";

/// Provenance record inserted under `hops`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopsMeta {
    pub source: String,
    pub event: String,
    pub action: String,
    /// Salt that makes otherwise identical input hash differently.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<String>,
}

/// An event ready to be published to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEvent {
    /// Hex SHA-1 of the serialized event.
    pub sequence_id: String,
    pub event: RawEvent,
}

impl SourceEvent {
    /// Stamp `input` with `hops` and derive its sequence id.
    ///
    /// The id is the hex SHA-1 of the serialized event, so identical input
    /// always lands in the same sequence unless `unique` is set. The bytes
    /// hashed are the ones the backend publishes: object keys sorted, `hops`
    /// fields in declaration order, `<`, `>` and `&` escaped.
    pub fn create(mut input: Map<String, Value>, hops: HopsMeta) -> Result<Self> {
        let bytes = event_bytes(&input, &hops)?;
        let sequence_id = hex::encode(Sha1::digest(&bytes));

        input.insert(HOPS_KEY.to_string(), serde_json::to_value(&hops)?);

        Ok(Self {
            sequence_id,
            event: RawEvent::new(Value::Object(input)),
        })
    }

    /// Source event for a run of `task`.
    pub fn for_task(task: &Task, input: Map<String, Value>) -> Result<Self> {
        Self::create(
            input,
            HopsMeta {
                source: TASK_EVENT_SOURCE.to_string(),
                event: TASK_EVENT_NAME.to_string(),
                action: task.name.clone(),
                unique: None,
            },
        )
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum EventField<'a> {
    Hops(&'a HopsMeta),
    Value(&'a Value),
}

fn event_bytes(input: &Map<String, Value>, hops: &HopsMeta) -> Result<Vec<u8>> {
    let fields: BTreeMap<&str, EventField<'_>> = input
        .iter()
        .map(|(key, value)| (key.as_str(), EventField::Value(value)))
        .chain(std::iter::once((HOPS_KEY, EventField::Hops(hops))))
        .collect();

    let mut bytes = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, HtmlSafeFormatter);
    fields.serialize(&mut serializer)?;
    Ok(bytes)
}

/// Compact JSON that also escapes HTML-significant characters and the
/// Unicode line separators.
struct HtmlSafeFormatter;

impl Formatter for HtmlSafeFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            let escaped = match ch {
                '<' => "\\u003c",
                '>' => "\\u003e",
                '&' => "\\u0026",
                '\u{2028}' => "\\u2028",
                '\u{2029}' => "\\u2029",
                _ => continue,
            };
            writer.write_all(&fragment.as_bytes()[start..i])?;
            writer.write_all(escaped.as_bytes())?;
            start = i + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}

/// Terminal state of a task submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Accepted(SourceEvent),
    Rejected {
        task: String,
        errors: ValidationErrors,
    },
}

impl SubmissionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Validate `input` for `task` and, if it passes, build the source event.
///
/// `input` must be a JSON object.
pub fn submit(task: &Task, input: Value) -> Result<SubmissionOutcome> {
    let input = match input {
        Value::Object(input) => input,
        other => {
            return Err(ConsoleError::invalid_payload(format!(
                "task input must be an object, got {}",
                json_kind(&other)
            )));
        }
    };

    let errors = validate_input(task, &input);
    if !errors.is_empty() {
        debug!(
            name: "task.submission.rejected",
            task = %task.name,
            fields = errors.len(),
            "Task input rejected"
        );
        return Ok(SubmissionOutcome::Rejected {
            task: task.name.clone(),
            errors,
        });
    }

    let event = SourceEvent::for_task(task, input)?;
    debug!(
        name: "task.submission.accepted",
        task = %task.name,
        sequence_id = %event.sequence_id,
        "Task input accepted"
    );

    Ok(SubmissionOutcome::Accepted(event))
}

/// Response shape returned to the console after a run is submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRunResponse {
    pub errors: ValidationErrors,
    pub message: String,
    pub sequence_id: String,
}

impl TaskRunResponse {
    pub fn is_accepted(&self) -> bool {
        self.errors.is_empty()
    }
}

impl From<SubmissionOutcome> for TaskRunResponse {
    fn from(outcome: SubmissionOutcome) -> Self {
        match outcome {
            SubmissionOutcome::Accepted(event) => Self {
                errors: ValidationErrors::new(),
                message: "OK".to_string(),
                sequence_id: event.sequence_id,
            },
            SubmissionOutcome::Rejected { task, errors } => Self {
                errors,
                message: format!("Invalid inputs for {task}"),
                sequence_id: String::new(),
            },
        }
    }
}
