//! Traversal errors.
use displaydoc::Display;
use thiserror::Error;

use crate::graphql;
use crate::graphql::ErrorExtension;
use crate::json_ext::Object;
use crate::json_ext::Path;

/// Errors that abort a traversal.
///
/// A traversal is all-or-nothing: when one of these is returned, neither typed data nor
/// records were produced. Server errors and empty envelopes are not represented here, they
/// are successful results without data.
#[derive(Error, Display, Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum ExecutionError {
    /// cannot return null for non-nullable field '{response_key}' at {path}
    FieldMissingOrNull {
        /// Response key of the field.
        response_key: String,
        /// Path of the field in the response data.
        path: Path,
    },

    /// cannot coerce value at {path} to {expected}: {reason}
    TypeMismatch {
        /// Path of the value in the response data.
        path: Path,
        /// The declared type.
        expected: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// expected {expected} at {path}
    InvalidShape {
        /// Path of the value in the response data.
        path: Path,
        /// The expected kind of JSON value.
        expected: String,
    },

    /// cannot execute an empty selection set
    EmptySelectionSet,

    /// selection processing recursion limit({limit}) exceeded
    RecursionLimitExceeded {
        /// The configured limit.
        limit: usize,
    },

    /// response was malformed: {reason}
    MalformedResponse {
        /// The reason the body could not be read.
        reason: String,
    },
}

impl ExecutionError {
    /// Returns the path of the faulty value, if the error relates to one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ExecutionError::FieldMissingOrNull { path, .. }
            | ExecutionError::TypeMismatch { path, .. }
            | ExecutionError::InvalidShape { path, .. } => Some(path),
            ExecutionError::EmptySelectionSet
            | ExecutionError::RecursionLimitExceeded { .. }
            | ExecutionError::MalformedResponse { .. } => None,
        }
    }

    /// Convert the execution error to a GraphQL error.
    pub fn to_graphql_error(&self) -> graphql::Error {
        let mut extensions = self.custom_extension_details().unwrap_or_default();
        extensions.insert("code", self.extension_code().into());

        graphql::Error {
            message: self.to_string(),
            locations: Vec::new(),
            path: self.path().cloned(),
            extensions,
        }
    }
}

impl ErrorExtension for ExecutionError {
    fn extension_code(&self) -> String {
        match self {
            ExecutionError::FieldMissingOrNull { .. } => "FIELD_MISSING_OR_NULL",
            ExecutionError::TypeMismatch { .. } => "TYPE_MISMATCH",
            ExecutionError::InvalidShape { .. } => "INVALID_SHAPE",
            ExecutionError::EmptySelectionSet => "EMPTY_SELECTION_SET",
            ExecutionError::RecursionLimitExceeded { .. } => "RECURSION_LIMIT_EXCEEDED",
            ExecutionError::MalformedResponse { .. } => "MALFORMED_RESPONSE",
        }
        .to_string()
    }

    fn custom_extension_details(&self) -> Option<Object> {
        let mut obj = Object::new();
        match self {
            ExecutionError::TypeMismatch { expected, .. }
            | ExecutionError::InvalidShape { expected, .. } => {
                obj.insert("type", expected.clone().into());
            }
            ExecutionError::FieldMissingOrNull { response_key, .. } => {
                obj.insert("field", response_key.clone().into());
            }
            _ => (),
        }

        (!obj.is_empty()).then_some(obj)
    }
}
