//! Error and warning types for document conversion.

use std::fmt;

/// Fatal conversion error for a single document.
///
/// A failure aborts the conversion of the document it belongs to and nothing
/// else; batch callers keep going with the next document.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The Markdown event stream could not be folded into a node tree.
    #[error("parse failure: {reason}")]
    ParseFailure {
        /// What the tree builder tripped over.
        reason: String,
    },

    /// Rendered markup and placeholder registry disagree.
    ///
    /// Always a renderer bug: some backend dropped text that carried a
    /// token, or produced a token that was never registered.
    #[error(
        "placeholder mismatch: {} token(s) missing from output, {} unknown token(s)",
        .missing.len(),
        .unknown.len()
    )]
    PlaceholderMismatch {
        /// Literals whose tokens never reached the rendered output.
        missing: Vec<char>,
        /// Token-shaped sequences in the output with no registered original.
        unknown: Vec<String>,
    },
}

impl ConvertError {
    pub(crate) fn parse(reason: impl Into<String>) -> Self {
        Self::ParseFailure {
            reason: reason.into(),
        }
    }
}

/// Non-fatal conversion diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Warning {
    /// A construct with no faithful equivalent in the target dialect.
    UnsupportedConstruct {
        /// Human-readable name of the construct.
        construct: String,
        /// How it was rendered instead.
        fallback: String,
    },

    /// Front matter that is not valid YAML; the block was kept as body text.
    MalformedFrontMatter {
        /// Parser message.
        reason: String,
    },
}

impl Warning {
    pub(crate) fn unsupported(construct: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self::UnsupportedConstruct {
            construct: construct.into(),
            fallback: fallback.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedConstruct {
                construct,
                fallback,
            } => write!(f, "unsupported {construct}, rendered as {fallback}"),
            Self::MalformedFrontMatter { reason } => {
                write!(f, "malformed front matter kept as text: {reason}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_mismatch_message_counts() {
        let err = ConvertError::PlaceholderMismatch {
            missing: vec!['*', '_'],
            unknown: vec![],
        };
        assert_eq!(
            err.to_string(),
            "placeholder mismatch: 2 token(s) missing from output, 0 unknown token(s)"
        );
    }

    #[test]
    fn test_warning_display() {
        let warning = Warning::unsupported("nested blockquote", "unwrapped quote content");
        assert_eq!(
            warning.to_string(),
            "unsupported nested blockquote, rendered as unwrapped quote content"
        );
    }
}
