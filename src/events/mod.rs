//! Event log normalization.
//!
//! Raw payloads from the backend's event endpoints arrive in several
//! historical shapes. This module classifies them ([`EventPayload`]) and
//! projects them into the fixed [`DisplayRow`] shape the console renders.
//!
//! # Example
//!
//! ```rust
//! use hops_console::events::{EventProjector, Projection};
//!
//! let projector = EventProjector::default();
//! let projection = projector
//!     .project_value(serde_json::json!({
//!         "event": {"hops": {"source": "github", "event": "pr_merged"}},
//!         "sequence_id": "abc123",
//!         "timestamp": "2023-11-22T10:44:00Z"
//!     }))
//!     .unwrap();
//!
//! let row = &projection.rows()[0];
//! assert_eq!(row.event, "pr_merged");
//! assert_eq!(row.action, "");
//! ```

pub mod envelope;
pub mod projector;
pub mod row;
pub mod time;

pub use envelope::{
    BatchLog, DoneFlag, Enrichment, EnvelopeHeader, EventEnvelope, EventPayload, RawEvent,
};
pub use projector::EventProjector;
pub use row::{BatchView, DisplayRow, Projection, RowEnrichment};
pub use time::{Clock, DisplayLocale, FixedClock, SystemClock, TimeFormatter};
