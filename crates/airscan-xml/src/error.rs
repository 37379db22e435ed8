//! Error types for XML reading, writing and reformatting.

use thiserror::Error;

/// Result type alias for airscan-xml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
///
/// Callers usually only need to know whether the document itself was bad
/// or whether a single value inside an otherwise valid document was bad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The byte buffer is not a well-formed XML document.
    MalformedInput,
    /// A node's text does not parse as the requested typed value.
    MalformedValue,
    /// Formatted output could not be produced or delivered.
    Output,
}

/// Errors that can occur while reading, writing or reformatting XML.
#[derive(Debug, Error)]
pub enum Error {
    /// XML syntax error from quick-xml.
    #[error("XML syntax error: {message}{}", .position.as_ref().map(|p| format!(" at byte {}", p)).unwrap_or_default())]
    XmlSyntax {
        message: String,
        /// Byte offset where the error occurred.
        position: Option<u64>,
    },

    /// Unexpected end of input.
    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEof {
        /// What was expected when EOF was encountered.
        expected: String,
    },

    /// Invalid XML structure.
    #[error("Invalid XML structure: {message}")]
    InvalidStructure { message: String },

    /// Empty document (no root element).
    #[error("Empty XML document: no root element found")]
    EmptyDocument,

    /// Multiple root elements.
    #[error("Invalid XML: multiple root elements")]
    MultipleRoots,

    /// Node text is not a valid value of the requested type.
    #[error("{name}: invalid numerical value {value:?}")]
    InvalidValue {
        /// Qualified (substituted) name of the node.
        name: String,
        /// The offending text, empty if the node had none.
        value: String,
    },

    /// Reformatting produced no output.
    #[error("Formatted XML output is empty")]
    EmptyOutput,

    /// Output sink failure.
    #[error("Failed to write XML output: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::XmlSyntax { .. }
            | Error::UnexpectedEof { .. }
            | Error::InvalidStructure { .. }
            | Error::EmptyDocument
            | Error::MultipleRoots => ErrorKind::MalformedInput,
            Error::InvalidValue { .. } => ErrorKind::MalformedValue,
            Error::EmptyOutput | Error::Io(_) => ErrorKind::Output,
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlSyntax {
            message: err.to_string(),
            position: None,
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlSyntax {
            message: format!("Attribute error: {}", err),
            position: None,
        }
    }
}
