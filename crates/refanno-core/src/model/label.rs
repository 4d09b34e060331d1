//! Label registry: the flat id/name/color table blocks point into.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AnnotateError;

/// Default palette, cycled by label count.
pub const DEFAULT_PALETTE: [&str; 19] = [
    "red-11",
    "blue-11",
    "light-green-11",
    "deep-orange-11",
    "pink-11",
    "light-blue-11",
    "lime-11",
    "brown-11",
    "purple-11",
    "cyan-11",
    "yellow-11",
    "grey-11",
    "deep-purple-11",
    "teal-11",
    "amber-11",
    "blue-grey-11",
    "indigo-11",
    "green-11",
    "orange-11",
];

/// A named annotation class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label {
    pub id: u32,
    pub name: String,
    pub color: String,
}

impl Label {
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
        }
    }

    /// A label referenced by persisted history but absent from the registry.
    ///
    /// Carries the name so the provenance log keeps comparing against it;
    /// id `0` is never handed out by [`LabelRegistry::add`].
    #[must_use]
    pub fn detached(name: impl Into<String>) -> Self {
        Self::new(0, name, "grey-11")
    }

    #[must_use]
    pub const fn is_detached(&self) -> bool {
        self.id == 0
    }
}

/// Registry of the labels available in a document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelRegistry {
    labels: Vec<Label>,
    current: Option<usize>,
    palette: Vec<String>,
}

impl LabelRegistry {
    /// Create a registry pre-populated with `labels`; the first becomes current.
    #[must_use]
    pub fn new(labels: Vec<Label>) -> Self {
        let current = if labels.is_empty() { None } else { Some(0) };
        Self {
            labels,
            current,
            palette: Vec::new(),
        }
    }

    /// Override the colour palette used for new labels.
    #[must_use]
    pub fn with_palette(mut self, palette: Vec<String>) -> Self {
        self.palette = palette;
        self
    }

    #[must_use]
    pub fn all(&self) -> &[Label] {
        &self.labels
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Case-insensitive existence check.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.labels
            .iter()
            .any(|label| label.name.eq_ignore_ascii_case(name))
    }

    /// Exact-name lookup.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&Label> {
        self.labels.iter().find(|label| label.name == name)
    }

    /// Resolve `name`, falling back to a detached label.
    ///
    /// Empty names resolve to `None` (an unlabeled placeholder block).
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Label> {
        if name.is_empty() {
            return None;
        }
        match self.get_by_name(name) {
            Some(label) => Some(label.clone()),
            None => {
                tracing::warn!(label = name, "label not in registry; keeping detached copy");
                Some(Label::detached(name))
            }
        }
    }

    /// Add a label with the next id and a palette colour.
    ///
    /// # Errors
    ///
    /// [`AnnotateError::LabelExists`] if a label with the same name
    /// (ignoring ASCII case) is already registered.
    pub fn add(&mut self, name: &str) -> Result<&Label, AnnotateError> {
        if self.contains(name) {
            return Err(AnnotateError::LabelExists(name.to_string()));
        }
        let id = u32::try_from(self.labels.len() + 1).unwrap_or(u32::MAX);
        let color = self.next_color();
        self.labels.push(Label::new(id, name, color));
        if self.labels.len() == 1 {
            self.current = Some(0);
        }
        debug!(label = name, id, "label added");
        Ok(&self.labels[self.labels.len() - 1])
    }

    /// Remove the label called `name`. Returns the removed label, if any.
    pub fn remove(&mut self, name: &str) -> Option<Label> {
        let idx = self.labels.iter().position(|label| label.name == name)?;
        let removed = self.labels.remove(idx);
        self.current = match self.current {
            Some(cur) if cur == idx => None,
            Some(cur) if cur > idx => Some(cur - 1),
            other => other,
        };
        debug!(label = name, "label removed");
        Some(removed)
    }

    /// The label new blocks are drawn with.
    #[must_use]
    pub fn current(&self) -> Option<&Label> {
        self.current.and_then(|idx| self.labels.get(idx))
    }

    /// Select the label new blocks are drawn with.
    ///
    /// # Errors
    ///
    /// [`AnnotateError::UnknownLabel`] if no label has that exact name.
    pub fn set_current(&mut self, name: &str) -> Result<(), AnnotateError> {
        let idx = self
            .labels
            .iter()
            .position(|label| label.name == name)
            .ok_or_else(|| AnnotateError::UnknownLabel(name.to_string()))?;
        self.current = Some(idx);
        Ok(())
    }

    fn next_color(&self) -> String {
        let n = self.labels.len();
        if self.palette.is_empty() {
            DEFAULT_PALETTE[n % DEFAULT_PALETTE.len()].to_string()
        } else {
            self.palette[n % self.palette.len()].clone()
        }
    }
}
