// crates/areadb-core/src/error.rs

//! # Errors
//!
//! One error enum for the whole crate. Extraction and codec failures abort
//! the single operation that raised them; nothing is partially applied.
//!
//! Two outcomes that callers may think of as "errors" are deliberately not
//! variants here:
//! - a lookup miss is `Option::None` from [`crate::BoundarySearch::lookup`];
//! - a partial import is reported by [`crate::Normalized::warning`] while the
//!   import itself succeeds.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AreaError>;

#[derive(Debug, Error)]
pub enum AreaError {
    /// No usable placemark/polygon, or a geometry that violates the grammar.
    #[error("malformed geometry in {context}: {reason}")]
    MalformedGeometry { context: String, reason: String },

    /// The ring that should be reduced to a bounding box has no positions.
    #[error("empty outer ring in {context}")]
    EmptyRing { context: String },

    /// An encoder that needs at least one feature was handed none.
    #[error("cannot export an empty feature collection as {format}")]
    EmptyCollection { format: &'static str },

    /// Requested format/capability combination is not available.
    #[error("format {format} is not supported: {reason}")]
    UnsupportedFormat { format: String, reason: String },

    /// A coordinate that is missing, not a number, or not finite.
    #[error("invalid coordinate value: {value:?}")]
    InvalidCoordinate { value: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("binary cache error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl AreaError {
    pub(crate) fn malformed(context: impl Into<String>, reason: impl Into<String>) -> Self {
        AreaError::MalformedGeometry {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(format: impl Into<String>, reason: impl Into<String>) -> Self {
        AreaError::UnsupportedFormat {
            format: format.into(),
            reason: reason.into(),
        }
    }

    /// Re-label the context of extraction errors with the file they came from.
    ///
    /// Other variants pass through unchanged.
    pub fn in_file(self, file_name: &str) -> Self {
        match self {
            AreaError::MalformedGeometry { reason, .. } => AreaError::MalformedGeometry {
                context: file_name.to_string(),
                reason,
            },
            AreaError::EmptyRing { .. } => AreaError::EmptyRing {
                context: file_name.to_string(),
            },
            AreaError::InvalidCoordinate { value } => AreaError::MalformedGeometry {
                context: file_name.to_string(),
                reason: format!("invalid coordinate value {value:?}"),
            },
            AreaError::Xml(e) => AreaError::MalformedGeometry {
                context: file_name.to_string(),
                reason: format!("XML error: {e}"),
            },
            other => other,
        }
    }
}
