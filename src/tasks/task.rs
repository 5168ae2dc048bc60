//! Task metadata and the task catalog.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::param::{Param, RawParam, title_case};
use super::submit::{SubmissionOutcome, submit};
use crate::error::{ConsoleError, Result};
use crate::events::envelope::json_kind;

/// A runnable task and its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTask")]
pub struct Task {
    pub display_name: String,
    /// Unique key of the task.
    pub name: String,
    pub summary: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    /// Inputs in declaration order.
    pub params: Vec<Param>,
}

/// List-view projection of a [`Task`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub display_name: String,
    pub name: String,
    pub emoji: String,
}

impl Task {
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|param| param.name() == name)
    }

    /// See [`to_summary`].
    pub fn summary_view(&self) -> TaskSummary {
        to_summary(self)
    }
}

/// Drop everything but the fields a task list shows.
pub fn to_summary(task: &Task) -> TaskSummary {
    TaskSummary {
        display_name: task.display_name.clone(),
        name: task.name.clone(),
        emoji: task.emoji.clone().unwrap_or_default(),
    }
}

impl From<&Task> for TaskSummary {
    fn from(task: &Task) -> Self {
        to_summary(task)
    }
}

/// Task as it appears on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTask {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub params: Option<Vec<RawParam>>,
}

impl TryFrom<RawTask> for Task {
    type Error = ConsoleError;

    fn try_from(raw: RawTask) -> Result<Self> {
        if raw.name.trim().is_empty() {
            return Err(ConsoleError::invalid_payload("task name must not be empty"));
        }

        let params = raw
            .params
            .unwrap_or_default()
            .into_iter()
            .map(Param::try_from)
            .collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::new();
        if let Some(dup) = params.iter().find(|param| !seen.insert(param.name())) {
            return Err(ConsoleError::InvalidParam {
                name: dup.name().to_string(),
                reason: format!("duplicate param name in task {}", raw.name),
            });
        }

        Ok(Self {
            display_name: raw
                .display_name
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| title_case(&raw.name)),
            name: raw.name,
            summary: raw.summary.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            emoji: raw.emoji.filter(|emoji| !emoji.is_empty()),
            params,
        })
    }
}

/// The set of tasks the backend exposes, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskCatalog {
    tasks: Vec<Task>,
}

impl TaskCatalog {
    /// Build a catalog, rejecting duplicate task names.
    pub fn new(tasks: Vec<Task>) -> Result<Self> {
        let mut seen = HashSet::new();
        if let Some(dup) = tasks.iter().find(|task| !seen.insert(task.name.as_str())) {
            return Err(ConsoleError::DuplicateTask(dup.name.clone()));
        }

        Ok(Self { tasks })
    }

    /// Build a catalog from a task list payload.
    pub fn from_value(value: Value) -> Result<Self> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(ConsoleError::invalid_payload(format!(
                    "task list must be an array, got {}",
                    json_kind(&other)
                )));
            }
        };

        let tasks = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                if !item.is_object() {
                    return Err(ConsoleError::invalid_payload(format!(
                        "tasks[{i}] must be an object, got {}",
                        json_kind(&item)
                    )));
                }
                let raw: RawTask = serde_json::from_value(item)?;
                Task::try_from(raw)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(name: "tasks.catalog.loaded", tasks = tasks.len(), "Loaded task catalog");

        Self::new(tasks)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Summaries in catalog order.
    pub fn summaries(&self) -> Vec<TaskSummary> {
        self.tasks.iter().map(to_summary).collect()
    }

    pub fn get(&self, name: &str) -> Result<&Task> {
        self.tasks
            .iter()
            .find(|task| task.name == name)
            .ok_or_else(|| ConsoleError::UnknownTask(name.to_string()))
    }

    /// Validate `input` against the named task.
    pub fn submit(&self, name: &str, input: Value) -> Result<SubmissionOutcome> {
        submit(self.get(name)?, input)
    }
}
