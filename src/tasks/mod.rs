//! Task schema model.
//!
//! Tasks are the runnable units the console lists and launches. Each task
//! declares typed [`Param`]s; a submission is validated against them and
//! either accepted (yielding the source event to publish) or rejected with
//! every failure collected per field.
//!
//! # Example
//!
//! ```rust
//! use hops_console::tasks::{TaskCatalog, TaskRunResponse};
//!
//! let catalog = TaskCatalog::from_value(serde_json::json!([
//!     {"name": "scale", "params": [{"name": "replicas", "type": "number", "required": true}]}
//! ]))
//! .unwrap();
//!
//! let outcome = catalog.submit("scale", serde_json::json!({})).unwrap();
//! let response = TaskRunResponse::from(outcome);
//! assert_eq!(response.errors.get("replicas").unwrap(), ["Required"]);
//! ```

pub mod param;
pub mod submit;
pub mod task;
pub mod validate;

pub use param::{
    Param, ParamConstraints, ParamDescription, ParamKind, ParamMeta, ParamType, describe_param,
};
pub use submit::{HopsMeta, SourceEvent, SubmissionOutcome, TaskRunResponse, submit};
pub use task::{Task, TaskCatalog, TaskSummary, to_summary};
pub use validate::{ValidationErrors, validate_input};
