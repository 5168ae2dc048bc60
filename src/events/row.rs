//! Display-ready shapes handed to the rendering layer.

use serde::Serialize;

use super::envelope::{DoneFlag, RawEvent};

/// One row of the event log table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRow {
    /// Delivery time, formatted for the configured locale.
    pub timestamp: String,
    /// The envelope's `sequence_id`.
    pub event_id: String,
    pub event: String,
    pub source: String,
    pub action: String,
    /// Present only for enriched envelopes.
    #[serde(flatten)]
    pub enrichment: Option<RowEnrichment>,
    /// The original event, untouched.
    #[serde(rename = "JSON")]
    pub json: RawEvent,
}

/// Delivery metadata columns, empty strings standing in for missing values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowEnrichment {
    pub app_name: String,
    pub channel: String,
    pub done: DoneFlag,
    pub handler_name: String,
    pub message_id: String,
}

/// A projected batch log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchView {
    /// How long ago the batch window started ("5 minutes ago").
    pub ago: String,
    pub rows: Vec<DisplayRow>,
}

/// Result of projecting an [`EventPayload`](super::EventPayload).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Projection {
    Batch(BatchView),
    Row(DisplayRow),
    Rows(Vec<DisplayRow>),
}

impl Projection {
    pub fn rows(&self) -> &[DisplayRow] {
        match self {
            Self::Batch(view) => &view.rows,
            Self::Row(row) => std::slice::from_ref(row),
            Self::Rows(rows) => rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(enrichment: Option<RowEnrichment>) -> DisplayRow {
        DisplayRow {
            timestamp: "11/22/2023, 10:44:00 AM".to_string(),
            event_id: "abc123".to_string(),
            event: "pr_merged".to_string(),
            source: "github".to_string(),
            action: String::new(),
            enrichment,
            json: RawEvent::new(json!({"hops": {"source": "github"}})),
        }
    }

    #[test]
    fn test_bare_row_serialization() {
        let value = serde_json::to_value(row(None)).unwrap();
        assert_eq!(
            value,
            json!({
                "timestamp": "11/22/2023, 10:44:00 AM",
                "eventId": "abc123",
                "event": "pr_merged",
                "source": "github",
                "action": "",
                "JSON": {"hops": {"source": "github"}}
            })
        );
    }

    #[test]
    fn test_enriched_row_serialization() {
        let enrichment = RowEnrichment {
            app_name: "k8s".to_string(),
            done: DoneFlag::False,
            ..RowEnrichment::default()
        };
        let value = serde_json::to_value(row(Some(enrichment))).unwrap();
        assert_eq!(value["appName"], "k8s");
        assert_eq!(value["done"], "false");
        assert_eq!(value["channel"], "");
        assert_eq!(value["messageId"], "");
    }

    #[test]
    fn test_projection_rows() {
        let single = Projection::Row(row(None));
        assert_eq!(single.rows().len(), 1);

        let batch = Projection::Batch(BatchView {
            ago: "just now".to_string(),
            rows: vec![row(None), row(None)],
        });
        assert_eq!(batch.rows().len(), 2);
    }
}
