//! Error types for the form model.
//!
//! `FormError` is what library consumers see; `MarkupError` and
//! `MappingError` are the specific failures of the two transform stages and
//! convert into it.

use thiserror::Error;

/// Failure while turning raw submission data into a nested structure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MappingError {
    /// A field that must be a scalar held an object or array.
    #[error("field '{field}' has unexpected type: expected {expected}, found {found}")]
    UnexpectedType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The payload carried no `data` object.
    #[error("submission payload has no data object")]
    MissingData,

    /// Binding-specific rejection.
    #[error("mapping rejected submission: {0}")]
    Rejected(String),
}

/// Failure while reading markup back into a structure or typed form.
#[derive(Debug, Error)]
pub enum MarkupError {
    /// Markup is not well-formed.
    #[error("markup parsing failed: {0}")]
    Parse(#[from] roxmltree::Error),

    /// The document root does not belong to the requested form.
    #[error("unexpected root element <{found}>, expected <{expected}>")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },

    /// A child element the typed form does not declare.
    #[error("form <{form}> has no field <{element}>")]
    UnexpectedElement { form: &'static str, element: String },

    /// A numeric field whose text is not a number.
    #[error("field <{field}> is not a valid number: '{value}'")]
    InvalidNumber { field: String, value: String },

    /// A scalar field that holds child elements.
    #[error("field <{field}> holds nested elements")]
    UnexpectedNesting { field: String },
}

/// Main error type for the form model.
#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Markup(#[from] MarkupError),
}

/// Result type alias for form operations.
pub type Result<T> = std::result::Result<T, FormError>;
