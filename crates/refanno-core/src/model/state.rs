use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::{fmt, str::FromStr};

/// Review state of a token, block or entity.
///
/// The engine only special-cases `Candidate`, `Suggested` and `Rejected`.
/// Reviewers may assign any other state string; those round-trip through
/// [`AnnotationState::Reviewer`] unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AnnotationState {
    /// Initial, unreviewed draft.
    #[default]
    Candidate,
    /// Machine-proposed annotation.
    Suggested,
    /// Confirmed by a reviewer.
    Accepted,
    /// Explicitly dismissed; retained for audit.
    Rejected,
    /// Free-form reviewer-assigned state (`Reviewed`, `Disputed`, ...).
    Reviewer(String),
}

impl AnnotationState {
    pub const CANDIDATE: &'static str = "Candidate";
    pub const SUGGESTED: &'static str = "Suggested";
    pub const ACCEPTED: &'static str = "Accepted";
    pub const REJECTED: &'static str = "Rejected";

    /// Wire representation used in history entries.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Candidate => Self::CANDIDATE,
            Self::Suggested => Self::SUGGESTED,
            Self::Accepted => Self::ACCEPTED,
            Self::Rejected => Self::REJECTED,
            Self::Reviewer(s) => s,
        }
    }

    /// `Candidate` or `Suggested`: nobody has ruled on this span yet.
    #[must_use]
    pub const fn is_unreviewed(&self) -> bool {
        matches!(self, Self::Candidate | Self::Suggested)
    }

    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected)
    }
}

impl fmt::Display for AnnotationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnotationState {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            Self::CANDIDATE => Self::Candidate,
            Self::SUGGESTED => Self::Suggested,
            Self::ACCEPTED => Self::Accepted,
            Self::REJECTED => Self::Rejected,
            other => Self::Reviewer(other.to_string()),
        })
    }
}

impl From<&str> for AnnotationState {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(state) => state,
            Err(never) => match never {},
        }
    }
}

// Custom serde: serialize as the bare state string.
impl Serialize for AnnotationState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AnnotationState {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}
