//! Hops Console
//!
//! Data-normalization core of the operations console for a workflow and
//! automation backend. The console lists runnable tasks, launches them with
//! user-supplied parameters and shows the events flowing through the
//! backend's pipelines.
//!
//! # Architecture
//!
//! - **Event projection**: classifies the backend's evolving event payload
//!   shapes and projects them into uniform display rows
//! - **Task schema**: typed task parameters, input validation and run
//!   submission responses
//!
//! Transport, routing and rendering live outside this crate; it takes
//! already-fetched JSON and returns plain serializable values.
//!
//! # Modules
//!
//! - [`events`]: Event envelopes, display rows and time formatting
//! - [`tasks`]: Task and param model, validation and submission
//! - [`config`]: Layered configuration for the command-line harness
//! - [`error`]: Error types

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::implicit_hasher)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]

pub mod config;
pub mod error;
pub mod events;
pub mod tasks;

pub use error::{ConsoleError, Result};
