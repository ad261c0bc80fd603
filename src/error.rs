//! Error types for the mapping editor
//!
//! Every failure surfaces a specific reason to the caller. None of these
//! are fatal: the mapping store is always left in its last-known-good state.

use std::path::PathBuf;

/// Rejected assignment input (bad channel, number, type, layer or control)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssignError {
    #[error("MIDI channel must be a number between 1 and 16 (got '{0}')")]
    InvalidChannel(String),

    #[error("CC number/note must be a number between 0 and 127 (got '{0}')")]
    InvalidNumber(String),

    #[error("Unknown MIDI function type '{0}' (expected Note, CC, Program Change or Pitch Bend)")]
    InvalidFunctionType(String),

    #[error("Layer must be a number between 1 and 4 (got '{0}')")]
    InvalidLayer(String),

    #[error("Unknown control '{0}'")]
    UnknownControl(String),
}

/// Structural failure while decoding a mapping document
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("XML syntax error at byte {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("Document has no <MIDIConfiguration> root element")]
    MissingRoot,

    #[error("Document ended before <{0}> was closed")]
    UnclosedElement(String),

    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Invalid layer number '{0}' (must be 1-4)")]
    InvalidLayer(String),

    #[error("Unknown control id '{0}'")]
    UnknownControl(String),

    #[error("Malformed function token '{token}': {reason}")]
    InvalidFunction { token: String, reason: String },

    #[error("Invalid assignment for control '{control}': {source}")]
    InvalidAssignment {
        control: String,
        #[source]
        source: AssignError,
    },

    #[error("Control '{control}': function token '{token}' disagrees with its type/channel/number attributes")]
    ConflictingFunction { control: String, token: String },
}

impl ParseError {
    /// Whether the error concerns a single `<Control>` entry rather than
    /// the document as a whole (only those may be skipped on load)
    pub fn is_entry_level(&self) -> bool {
        matches!(
            self,
            ParseError::UnknownControl(_)
                | ParseError::InvalidFunction { .. }
                | ParseError::InvalidAssignment { .. }
                | ParseError::ConflictingFunction { .. }
                | ParseError::MissingAttribute {
                    element: "Control",
                    ..
                }
        )
    }
}

/// Error type for editor session operations
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Assign(#[from] AssignError),

    #[error("Failed to load configuration: {0}")]
    Parse(#[from] ParseError),

    #[error("Failed to encode mapping document: {0}")]
    Encode(#[from] quick_xml::Error),

    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Another save or load is already in progress")]
    Busy,

    #[error("No file selected; save with an explicit path first")]
    NoDocument,
}

impl EditorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EditorError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_level_classification() {
        assert!(ParseError::UnknownControl("dial_9".into()).is_entry_level());
        assert!(ParseError::MissingAttribute {
            element: "Control",
            attribute: "id"
        }
        .is_entry_level());

        assert!(!ParseError::MissingRoot.is_entry_level());
        assert!(!ParseError::InvalidLayer("7".into()).is_entry_level());
        assert!(!ParseError::MissingAttribute {
            element: "Layer",
            attribute: "number"
        }
        .is_entry_level());
    }

    #[test]
    fn test_messages_name_the_bad_value() {
        let err = AssignError::InvalidChannel("0".into());
        assert!(err.to_string().contains("'0'"));

        let err = EditorError::io(
            "/tmp/missing.xml",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.to_string().contains("/tmp/missing.xml"));
    }
}
