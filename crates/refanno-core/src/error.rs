use std::fmt;

/// Machine-readable error codes for tooling that needs to branch on failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InvalidRange,
    LabelExists,
    UnknownLabel,
    DocumentParseError,
    SerializationMismatch,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InvalidRange => "E2001",
            Self::LabelExists => "E2002",
            Self::UnknownLabel => "E2003",
            Self::DocumentParseError => "E3001",
            Self::SerializationMismatch => "E4001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidRange => "Invalid span range",
            Self::LabelExists => "Label already exists",
            Self::UnknownLabel => "Unknown label",
            Self::DocumentParseError => "Annotation document parse error",
            Self::SerializationMismatch => "Snapshot does not match live span models",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .refanno/config.toml and retry."),
            Self::InvalidRange => {
                Some("Select at least one character that overlaps a token in the paragraph.")
            }
            Self::LabelExists => Some("Label names are compared case-insensitively."),
            Self::UnknownLabel => Some("Add the label to the registry before selecting it."),
            Self::DocumentParseError => {
                Some("Check that the file follows the REF layout: classes + annotations.")
            }
            Self::SerializationMismatch => Some(
                "Restore snapshots into the same set of paragraphs they were captured from.",
            ),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised by the annotation engine.
///
/// Missing targets (removing a block that is not there, restoring an unknown
/// start offset) are not errors; those operations are no-ops.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnnotateError {
    /// Zero-length selection.
    #[error("empty range [{start}, {end}): a block must cover at least one character")]
    EmptyRange { start: usize, end: usize },

    /// Selection reaches past the last token of the paragraph.
    #[error("range [{start}, {end}) is outside the paragraph extent 0..{extent}")]
    OutOfBounds {
        start: usize,
        end: usize,
        extent: usize,
    },

    /// Selection only covers whitespace between tokens.
    #[error("range [{start}, {end}) does not cover any token")]
    NoTokensCovered { start: usize, end: usize },

    #[error("label '{0}' already exists")]
    LabelExists(String),

    #[error("label '{0}' does not exist")]
    UnknownLabel(String),

    /// A snapshot was restored into models with a different shape.
    #[error("snapshot mismatch: {0}")]
    SerializationMismatch(String),
}

impl AnnotateError {
    /// Map this error onto its stable [`ErrorCode`].
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::EmptyRange { .. } | Self::OutOfBounds { .. } | Self::NoTokensCovered { .. } => {
                ErrorCode::InvalidRange
            }
            Self::LabelExists(_) => ErrorCode::LabelExists,
            Self::UnknownLabel(_) => ErrorCode::UnknownLabel,
            Self::SerializationMismatch(_) => ErrorCode::SerializationMismatch,
        }
    }

    /// Returns `true` for the `InvalidRange` family.
    #[must_use]
    pub const fn is_invalid_range(&self) -> bool {
        matches!(self.code(), ErrorCode::InvalidRange)
    }
}

#[cfg(test)]
mod tests {
    use super::{AnnotateError, ErrorCode};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::InvalidRange,
            ErrorCode::LabelExists,
            ErrorCode::UnknownLabel,
            ErrorCode::DocumentParseError,
            ErrorCode::SerializationMismatch,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::SerializationMismatch.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn range_errors_share_one_code() {
        let errors = [
            AnnotateError::EmptyRange { start: 3, end: 3 },
            AnnotateError::OutOfBounds {
                start: 0,
                end: 40,
                extent: 18,
            },
            AnnotateError::NoTokensCovered { start: 3, end: 4 },
        ];
        for err in errors {
            assert!(err.is_invalid_range(), "{err} should be InvalidRange");
        }
        assert!(!AnnotateError::UnknownLabel("PER".into()).is_invalid_range());
    }
}
