//! REF (Rich Entity Format) documents.
//!
//! A REF document carries the label table and one record per paragraph:
//!
//! ```json
//! {
//!   "classes": [{"id": 1, "name": "PER", "color": "red-11"}],
//!   "annotations": [
//!     [null, "Ada met Bob", {"entities": [
//!       [null, 0, 3, [["PER", "Accepted", "2024-01-01T00:00:00Z", "ana"]]]
//!     ]}]
//!   ]
//! }
//! ```
//!
//! Both top-level keys are optional on input, so a bare label file or a bare
//! annotation file parses too.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AnnotateError, ErrorCode};
use crate::model::{Label, LabelRegistry};
use crate::provenance::Entity;
use crate::span::TokenManager;
use crate::tokenizer::{TokenSpan, span_tokenize};

static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\r\n|\n|\r){2,}").expect("blank-run pattern compiles"));
static LINE_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\n|\r").expect("line-break pattern compiles"));

/// Errors raised while reading or writing REF documents.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("malformed REF document: {0}")]
    Json(#[from] serde_json::Error),

    /// A persisted entity does not fit its paragraph.
    #[error("paragraph {paragraph}, entity {entity}: {source}")]
    Entity {
        paragraph: usize,
        entity: usize,
        #[source]
        source: AnnotateError,
    },
}

impl DocumentError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Json(_) => ErrorCode::DocumentParseError,
            Self::Entity { source, .. } => source.code(),
        }
    }
}

/// One paragraph: optional id, raw text and its persisted entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphRecord {
    pub id: Option<String>,
    pub text: String,
    pub entities: Vec<Entity>,
}

#[derive(Serialize, Deserialize)]
struct EntityList {
    #[serde(default)]
    entities: Vec<Entity>,
}

#[derive(Serialize, Deserialize)]
struct WireParagraph(Option<String>, String, EntityList);

impl Serialize for ParagraphRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireParagraph(
            self.id.clone(),
            self.text.clone(),
            EntityList {
                entities: self.entities.clone(),
            },
        )
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ParagraphRecord {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let WireParagraph(id, text, list) = WireParagraph::deserialize(deserializer)?;
        Ok(Self {
            id,
            text,
            entities: list.entities,
        })
    }
}

impl ParagraphRecord {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            entities: Vec::new(),
        }
    }

    #[must_use]
    pub fn tokens(&self) -> Vec<TokenSpan> {
        span_tokenize(&self.text)
    }

    /// Tokenize the text and replay the persisted entities as manual imports.
    ///
    /// # Errors
    ///
    /// The first entity whose range does not fit the paragraph, as
    /// `(entity index, error)`.
    pub fn build_manager(
        &self,
        labels: &LabelRegistry,
    ) -> Result<TokenManager, (usize, AnnotateError)> {
        let mut manager = TokenManager::new(&self.tokens());
        for (idx, entity) in self.entities.iter().enumerate() {
            manager
                .import_entity(entity, labels)
                .map_err(|err| (idx, err))?;
        }
        Ok(manager)
    }
}

/// A paragraph's position and text, as shown to an annotator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSentence<'a> {
    pub id: usize,
    pub text: &'a str,
}

/// Labels plus annotated paragraphs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefDocument {
    #[serde(default)]
    pub classes: Vec<Label>,
    #[serde(default)]
    pub annotations: Vec<ParagraphRecord>,
}

impl RefDocument {
    /// Split plain text into paragraphs, one per line.
    ///
    /// Runs of line breaks collapse to one; blank lines are dropped.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let collapsed = BLANK_RUN_RE.replace_all(text, "\n");
        let annotations: Vec<ParagraphRecord> = LINE_BREAK_RE
            .split(&collapsed)
            .filter(|line| !line.trim().is_empty())
            .map(ParagraphRecord::new)
            .collect();
        info!(paragraphs = annotations.len(), "plain text document loaded");
        Self {
            classes: Vec::new(),
            annotations,
        }
    }

    /// # Errors
    ///
    /// [`DocumentError::Json`] when `json` is not a REF document.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let doc: Self = serde_json::from_str(json)?;
        info!(
            paragraphs = doc.annotations.len(),
            classes = doc.classes.len(),
            entities = doc.entity_count(),
            "REF document loaded"
        );
        Ok(doc)
    }

    /// # Errors
    ///
    /// [`DocumentError::Json`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[must_use]
    pub fn input_sentences(&self) -> Vec<InputSentence<'_>> {
        self.annotations
            .iter()
            .enumerate()
            .map(|(id, paragraph)| InputSentence {
                id,
                text: &paragraph.text,
            })
            .collect()
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.annotations.iter().map(|p| p.entities.len()).sum()
    }

    /// A registry over this document's classes.
    #[must_use]
    pub fn label_registry(&self) -> LabelRegistry {
        LabelRegistry::new(self.classes.clone())
    }

    /// One span model per paragraph, with persisted entities replayed.
    ///
    /// # Errors
    ///
    /// [`DocumentError::Entity`] for the first entity that does not fit.
    pub fn build_managers(
        &self,
        labels: &LabelRegistry,
    ) -> Result<Vec<TokenManager>, DocumentError> {
        self.annotations
            .iter()
            .enumerate()
            .map(|(paragraph, record)| {
                record
                    .build_manager(labels)
                    .map_err(|(entity, source)| DocumentError::Entity {
                        paragraph,
                        entity,
                        source,
                    })
            })
            .collect()
    }
}
