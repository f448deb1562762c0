//! Error types shared by every layer of the data core.
//!
//! Configuration-class errors (unknown dataset, unknown field, values outside
//! a category domain) fail the call. An empty filter result is never an error;
//! see [`crate::chart::EmptyResultNotice`].

use thiserror::Error;

/// Errors raised by the registry, the filter engine and the view builder.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A dataset name that is not one of the five fixed datasets.
    #[error("unknown dataset '{0}'")]
    UnknownDataset(String),

    /// A predicate or view references a field absent from the dataset schema.
    #[error("unknown field '{field}' in dataset '{dataset}'")]
    UnknownField { dataset: String, field: String },

    /// A literal outside the finite domain of a category field.
    #[error("'{value}' is not a valid value for {field} in dataset '{dataset}'")]
    UnknownCategory {
        dataset: String,
        field: String,
        value: String,
    },

    /// A field is bound to an operation its type does not support.
    #[error("field '{field}' in dataset '{dataset}' is {found}, expected {expected}")]
    TypeMismatch {
        dataset: String,
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Range bounds that cannot match anything by construction.
    #[error("invalid range [{low}, {high}] for field '{field}'")]
    InvalidRange { field: String, low: f64, high: f64 },

    /// Fixture data that does not fit its schema.
    #[error("invalid fixture for dataset '{dataset}': {message}")]
    Fixture { dataset: String, message: String },

    /// Textual predicate that could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
}

impl Error {
    pub(crate) fn unknown_field(dataset: &str, field: &str) -> Self {
        Error::UnknownField {
            dataset: dataset.to_string(),
            field: field.to_string(),
        }
    }

    pub(crate) fn fixture(dataset: &str, message: impl Into<String>) -> Self {
        Error::Fixture {
            dataset: dataset.to_string(),
            message: message.into(),
        }
    }

    /// Returns true for errors caused by a bad dataset, field or value reference.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, Error::Fixture { .. } | Error::Parse(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::fixture("<document>", err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_field_names_dataset_and_field() {
        let err = Error::unknown_field("festivals", "Budget");
        assert_eq!(
            err.to_string(),
            "unknown field 'Budget' in dataset 'festivals'"
        );
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_json_errors_become_fixture_errors() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Fixture { .. }));
        assert!(!err.is_configuration_error());
    }
}
