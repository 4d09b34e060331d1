//! refanno-core library.
//!
//! Span annotation engine for REF (Rich Entity Format) documents: per
//! paragraph span lists with overlap rejection, an append-only provenance
//! log per annotation, and snapshot-based undo/redo.
//!
//! # Conventions
//!
//! - **Errors**: engine operations return [`error::AnnotateError`]; document
//!   I/O returns [`document::DocumentError`]; configuration loading uses
//!   `anyhow::Result`. Missing targets are no-ops, not errors.
//! - **Logging**: `tracing` macros (`info!` for load/export, `debug!` for
//!   every mutation, `warn!` for recoverable oddities).
//! - **Offsets**: half-open `[start, end)` UTF-16 code-unit offsets into
//!   the paragraph text.

pub mod config;
pub mod document;
pub mod error;
pub mod model;
pub mod provenance;
pub mod session;
pub mod span;
pub mod tokenizer;
pub mod version;

pub use document::{DocumentError, ParagraphRecord, RefDocument};
pub use error::{AnnotateError, ErrorCode};
pub use session::AnnotationSession;
