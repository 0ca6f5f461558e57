//! Error types for permission set operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading, assembling or writing permission sets.
#[derive(Debug, Error)]
pub enum PermsetError {
    /// File I/O error
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// XML parsing error
    #[error("XML error in {origin}: {message}")]
    ParseXml {
        origin: String,
        message: String,
        #[source]
        source: quick_xml::de::DeError,
    },

    /// XML serialization error
    #[error("Failed to serialize {element}: {source}")]
    WriteXml {
        element: &'static str,
        #[source]
        source: quick_xml::se::SeError,
    },

    /// The document has a section that cannot be written back
    #[error("{origin} contains <{element}>, which permkit does not preserve; refusing to rewrite it")]
    UnsupportedElement { origin: String, element: String },

    /// The field definition file does not exist
    #[error("Field not found: {object}/{field}")]
    FieldNotFound { object: String, field: String },

    /// The object folder does not exist in the metadata directory
    #[error("Couldn't find object {object} in {dir:?}")]
    ObjectNotFound { object: String, dir: PathBuf },
}

impl PermsetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PermsetError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(origin: impl Into<String>, source: quick_xml::de::DeError) -> Self {
        PermsetError::ParseXml {
            origin: origin.into(),
            message: source.to_string(),
            source,
        }
    }
}

/// Result type for permission set operations.
pub type PermsetResult<T> = Result<T, PermsetError>;
