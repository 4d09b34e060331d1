//! Bounded undo/redo stacks over explicit sets of paragraph models.
//!
//! Callers capture a snapshot with [`VersionControl::add_undo`] *before*
//! mutating. Undo and redo swap the live models with the top snapshot of the
//! respective stack, pushing the current state onto the other one.
//!
//! | Operation | Restores | Opposite stack receives |
//! |---|---|---|
//! | `undo` | newest undo snapshot | current state |
//! | `redo` | newest redo snapshot | current state |
//! | `undo_all` | oldest undo snapshot | current state, then every consumed snapshot except the restored one, newest first |
//! | `redo_all` | oldest-pushed redo snapshot | same, mirrored |
//!
//! `undo_all` leaves the stacks exactly as repeated `undo` calls would.

use std::collections::VecDeque;

use tracing::debug;

use super::snapshot::Snapshot;
use crate::error::AnnotateError;
use crate::span::TokenManager;

/// Default bound on each stack.
pub const DEFAULT_MAX_STACK_SIZE: usize = 50;

// ---------------------------------------------------------------------------
// VersionControl
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionControl {
    undo: VecDeque<Snapshot>,
    redo: VecDeque<Snapshot>,
    max_stack_size: usize,
}

impl Default for VersionControl {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STACK_SIZE)
    }
}

impl VersionControl {
    /// Stacks holding at most `max_stack_size` snapshots each (minimum 1).
    #[must_use]
    pub fn new(max_stack_size: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: VecDeque::new(),
            max_stack_size: max_stack_size.max(1),
        }
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[must_use]
    pub fn undo_count(&self) -> usize {
        self.undo.len()
    }

    #[must_use]
    pub fn redo_count(&self) -> usize {
        self.redo.len()
    }

    #[must_use]
    pub const fn max_stack_size(&self) -> usize {
        self.max_stack_size
    }

    /// Change the bound, dropping the oldest snapshots that no longer fit.
    pub fn set_max_stack_size(&mut self, size: usize) {
        self.max_stack_size = size.max(1);
        self.trim();
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Record the state of `models` before an edit. Clears the redo stack.
    pub fn add_undo(&mut self, models: &[TokenManager], active: usize) {
        self.undo.push_back(Snapshot::capture(models, active));
        self.redo.clear();
        self.trim();
        debug!(undo = self.undo.len(), "undo snapshot recorded");
    }

    /// Step back one snapshot. Returns `false` when there is nothing to undo.
    ///
    /// # Errors
    ///
    /// [`AnnotateError::SerializationMismatch`] when the snapshot does not
    /// fit `models`; stacks and models are left unchanged.
    pub fn undo(
        &mut self,
        models: &mut [TokenManager],
        active: &mut usize,
    ) -> Result<bool, AnnotateError> {
        let Some(target) = self.undo.back() else {
            return Ok(false);
        };
        let prepared = target.prepare(models)?;
        let current = Snapshot::capture(models, *active);

        self.undo.pop_back();
        self.redo.push_back(current);
        prepared.apply(models, active);
        self.trim();
        debug!(undo = self.undo.len(), redo = self.redo.len(), "undo");
        Ok(true)
    }

    /// Step forward one snapshot. Returns `false` when there is nothing to redo.
    ///
    /// # Errors
    ///
    /// Same as [`Self::undo`].
    pub fn redo(
        &mut self,
        models: &mut [TokenManager],
        active: &mut usize,
    ) -> Result<bool, AnnotateError> {
        let Some(target) = self.redo.back() else {
            return Ok(false);
        };
        let prepared = target.prepare(models)?;
        let current = Snapshot::capture(models, *active);

        self.redo.pop_back();
        self.undo.push_back(current);
        prepared.apply(models, active);
        self.trim();
        debug!(undo = self.undo.len(), redo = self.redo.len(), "redo");
        Ok(true)
    }

    /// Restore the oldest undo snapshot in one step.
    ///
    /// # Errors
    ///
    /// Same as [`Self::undo`].
    pub fn undo_all(
        &mut self,
        models: &mut [TokenManager],
        active: &mut usize,
    ) -> Result<bool, AnnotateError> {
        let moved = rewind(&mut self.undo, &mut self.redo, models, active)?;
        if moved > 0 {
            self.trim();
            debug!(steps = moved, redo = self.redo.len(), "undo all");
        }
        Ok(moved > 0)
    }

    /// Restore the furthest redo snapshot in one step.
    ///
    /// # Errors
    ///
    /// Same as [`Self::undo`].
    pub fn redo_all(
        &mut self,
        models: &mut [TokenManager],
        active: &mut usize,
    ) -> Result<bool, AnnotateError> {
        let moved = rewind(&mut self.redo, &mut self.undo, models, active)?;
        if moved > 0 {
            self.trim();
            debug!(steps = moved, undo = self.undo.len(), "redo all");
        }
        Ok(moved > 0)
    }

    fn trim(&mut self) {
        while self.undo.len() > self.max_stack_size {
            self.undo.pop_front();
        }
        while self.redo.len() > self.max_stack_size {
            self.redo.pop_front();
        }
    }
}

/// Drain `from` entirely, restoring its bottom snapshot and pushing the
/// current state plus the intermediate snapshots onto `to` so that `to`
/// ends up as if each step had been taken individually. Returns the number
/// of steps taken.
fn rewind(
    from: &mut VecDeque<Snapshot>,
    to: &mut VecDeque<Snapshot>,
    models: &mut [TokenManager],
    active: &mut usize,
) -> Result<usize, AnnotateError> {
    let Some(target) = from.front() else {
        return Ok(0);
    };
    let prepared = target.prepare(models)?;
    let steps = from.len();

    to.push_back(Snapshot::capture(models, *active));
    while from.len() > 1 {
        if let Some(snapshot) = from.pop_back() {
            to.push_back(snapshot);
        }
    }
    from.clear();
    prepared.apply(models, active);
    Ok(steps)
}
