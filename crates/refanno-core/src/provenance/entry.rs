use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::AnnotationState;

/// Timestamp layout used in history entries (second precision, UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Format `at` the way history entries store it.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Format `at` with a caller-supplied strftime pattern.
///
/// Returns `None` when the pattern contains items chrono cannot render.
#[must_use]
pub fn format_timestamp_with(at: DateTime<Utc>, pattern: &str) -> Option<String> {
    use std::fmt::Write;

    let mut out = String::new();
    write!(out, "{}", at.format(pattern)).ok()?;
    Some(out)
}

/// One immutable provenance record.
///
/// Serialized as the REF tuple `[label, state, timestamp, annotator]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    label: String,
    state: AnnotationState,
    annotator: String,
    timestamp: String,
}

impl HistoryEntry {
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        state: AnnotationState,
        annotator: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            state,
            annotator: annotator.into(),
            timestamp: timestamp.into(),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub const fn state(&self) -> &AnnotationState {
        &self.state
    }

    #[must_use]
    pub fn annotator(&self) -> &str {
        &self.annotator
    }

    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Same label and state as `other`, regardless of who or when.
    #[must_use]
    pub fn same_verdict(&self, label: &str, state: &AnnotationState) -> bool {
        self.label == label && &self.state == state
    }
}

#[derive(Serialize, Deserialize)]
struct WireEntry(String, AnnotationState, String, String);

impl Serialize for HistoryEntry {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireEntry(
            self.label.clone(),
            self.state.clone(),
            self.timestamp.clone(),
            self.annotator.clone(),
        )
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for HistoryEntry {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let WireEntry(label, state, timestamp, annotator) = WireEntry::deserialize(deserializer)?;
        Ok(Self {
            label,
            state,
            annotator,
            timestamp,
        })
    }
}
