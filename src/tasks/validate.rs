//! Task input validation.
//!
//! Every param is checked and every failure is kept, so a user can fix all
//! fields of a form in one pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::param::{Param, ParamKind};
use super::task::Task;

pub const INVALID_REQUIRED: &str = "Required";
pub const INVALID_NOT_STRING: &str = "Should be a string";
pub const INVALID_NOT_TEXT: &str = "Should be text";
pub const INVALID_NOT_NUMBER: &str = "Should be a number";
pub const INVALID_NOT_BOOL: &str = "Should be a boolean";

/// Validation messages keyed by param name.
///
/// Empty means the input was accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message for `field`, keeping earlier ones.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with at least one message.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }
}

/// Check `input` against the task's params.
///
/// A key that is present is type-checked even when its value is `null`;
/// only a missing key counts as not provided. Keys that match no param are
/// ignored.
pub fn validate_input(task: &Task, input: &Map<String, Value>) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    for param in &task.params {
        match input.get(param.name()) {
            None if param.is_required() => errors.push(param.name(), INVALID_REQUIRED),
            None => {}
            Some(value) => {
                if let Some(message) = type_mismatch(param, value) {
                    errors.push(param.name(), message);
                }
            }
        }
    }

    errors
}

fn type_mismatch(param: &Param, value: &Value) -> Option<&'static str> {
    match param.kind {
        ParamKind::String { .. } => (!value.is_string()).then_some(INVALID_NOT_STRING),
        ParamKind::Text { .. } => (!value.is_string()).then_some(INVALID_NOT_TEXT),
        ParamKind::Number { .. } => (!value.is_number()).then_some(INVALID_NOT_NUMBER),
        ParamKind::Bool { .. } => (!value.is_boolean()).then_some(INVALID_NOT_BOOL),
    }
}
