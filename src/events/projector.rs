//! Projection of event payloads into display rows.

use serde_json::Value;
use tracing::debug;

use super::envelope::{BatchLog, EventEnvelope, EventPayload};
use super::row::{BatchView, DisplayRow, Projection, RowEnrichment};
use super::time::TimeFormatter;
use crate::error::Result;

/// Turns any supported event payload into [`DisplayRow`]s.
///
/// Projection never fails on missing or oddly typed nested fields; those
/// become empty strings. Only the top-level shape is checked, when a raw
/// value is classified by [`EventProjector::project_value`].
#[derive(Debug, Clone, Default)]
pub struct EventProjector {
    formatter: TimeFormatter,
    row_limit: Option<usize>,
}

impl EventProjector {
    #[must_use]
    pub fn new(formatter: TimeFormatter) -> Self {
        Self {
            formatter,
            row_limit: None,
        }
    }

    /// Keep at most `limit` rows per projection, in delivery order.
    #[must_use]
    pub fn with_row_limit(mut self, limit: usize) -> Self {
        self.row_limit = Some(limit);
        self
    }

    pub fn formatter(&self) -> &TimeFormatter {
        &self.formatter
    }

    /// Project a single bare or enriched envelope.
    pub fn project_one(&self, envelope: &EventEnvelope) -> DisplayRow {
        let header = envelope.header();
        let event = &header.event;

        DisplayRow {
            timestamp: self.formatter.format_timestamp(&header.timestamp),
            event_id: header.sequence_id.clone(),
            event: event.event_name().to_string(),
            source: event.source().to_string(),
            action: event.action().to_string(),
            enrichment: envelope.enrichment().map(|enrichment| RowEnrichment {
                app_name: enrichment.app_name.clone().unwrap_or_default(),
                channel: enrichment.channel.clone().unwrap_or_default(),
                done: enrichment.done,
                handler_name: enrichment.handler_name.clone().unwrap_or_default(),
                message_id: enrichment.message_id.clone().unwrap_or_default(),
            }),
            json: event.clone(),
        }
    }

    /// Project envelopes in the order given.
    pub fn project_list(&self, envelopes: &[EventEnvelope]) -> Vec<DisplayRow> {
        envelopes
            .iter()
            .take(self.row_limit.unwrap_or(usize::MAX))
            .map(|envelope| self.project_one(envelope))
            .collect()
    }

    /// Project a batch log. `ago` is computed once from its start time.
    pub fn project_batch(&self, batch: &BatchLog) -> BatchView {
        BatchView {
            ago: self.relative_age(&batch.start_timestamp),
            rows: self.project_list(&batch.event_items),
        }
    }

    /// Relative phrase for a timestamp, measured now.
    pub fn relative_age(&self, timestamp: &Value) -> String {
        self.formatter.relative_age(timestamp)
    }

    pub fn project(&self, payload: &EventPayload) -> Projection {
        match payload {
            EventPayload::Batch(batch) => Projection::Batch(self.project_batch(batch)),
            EventPayload::Single(envelope) => Projection::Row(self.project_one(envelope)),
            EventPayload::List(envelopes) => Projection::Rows(self.project_list(envelopes)),
        }
    }

    /// Classify a raw payload and project it.
    pub fn project_value(&self, value: Value) -> Result<Projection> {
        let payload = EventPayload::try_from(value)?;
        let projection = self.project(&payload);

        debug!(
            name: "events.projected",
            rows = projection.rows().len(),
            "Projected event payload"
        );

        Ok(projection)
    }
}
