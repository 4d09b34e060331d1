//! Provenance: history entries, the append-only log, and entities.

pub mod entity;
pub mod entry;
pub mod log;

pub use entity::Entity;
pub use entry::{HistoryEntry, TIMESTAMP_FORMAT, format_timestamp, format_timestamp_with};
pub use log::{AppendReason, ProvenanceLog, Verdict};
