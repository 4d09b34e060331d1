//! Snapshot-based undo/redo.

pub mod manager;
pub mod snapshot;

pub use manager::{DEFAULT_MAX_STACK_SIZE, VersionControl};
pub use snapshot::{Freeze, FrozenBlock, FrozenSpan, FrozenToken, ManagerSnapshot, Snapshot};
