//! Types related to GraphQL responses and results.

use std::fmt;

use indexmap::IndexSet;
use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map as JsonMap;

use crate::cache::CacheKey;
use crate::json_ext::Object;
use crate::json_ext::Path;
use crate::json_ext::Value;

/// A location in the GraphQL document of the originating request.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

/// A [GraphQL error](https://spec.graphql.org/October2021/#sec-Errors)
/// as may be found in the `errors` field of a GraphQL response.
///
/// Converted to (or from) JSON with serde.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Error {
    /// The error message.
    pub message: String,

    /// The locations of the error in the GraphQL document of the originating request.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub locations: Vec<Location>,

    /// If this is a field error, the JSON path to that field in the response data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Path>,

    /// The optional GraphQL extensions for this error.
    #[serde(default, skip_serializing_if = "Object::is_empty")]
    pub extensions: Object,
}

#[buildstructor::buildstructor]
impl Error {
    /// Returns a builder that builds a GraphQL [`Error`] from its components.
    ///
    /// Builder methods:
    ///
    /// * `.message(impl Into<`[`String`]`>)`
    ///   Required.
    ///   Sets [`Error::message`].
    ///
    /// * `.location(impl Into<`[`Location`]`>)`
    ///   Optional, may be called multiple times.
    ///   Adds one item at the end of [`Error::locations`].
    ///
    /// * `.path(impl Into<`[`Path`]`>)`
    ///   Optional.
    ///   Sets [`Error::path`].
    ///
    /// * `.extension(impl Into<`[`ByteString`]`>, impl Into<`[`Value`]`>)`
    ///   Optional, may be called multiple times.
    ///   Adds one item to the [`Error::extensions`] map.
    ///
    /// * `.build()`
    ///   Finishes the builder and returns a GraphQL [`Error`].
    #[builder(visibility = "pub")]
    fn new(
        message: String,
        locations: Vec<Location>,
        path: Option<Path>,
        // Skip the `Object` type alias in order to use buildstructor’s map special-casing
        extensions: JsonMap<ByteString, Value>,
    ) -> Self {
        Self {
            message,
            locations,
            path,
            extensions,
        }
    }

    /// Decodes one entry of a response's `errors` array.
    ///
    /// Only `message` is required to be meaningful: a missing message becomes empty, and
    /// `locations` or `path` entries that do not have the expected shape are dropped.
    pub(crate) fn from_object(mut object: Object) -> Error {
        let message = match object.remove("message") {
            Some(Value::String(s)) => s.as_str().to_string(),
            _ => String::new(),
        };
        let locations = object
            .remove("locations")
            .and_then(|value| match serde_json_bytes::from_value(value) {
                Ok(locations) => Some(locations),
                Err(error) => {
                    failfast_debug!("dropping malformed error locations: {}", error);
                    None
                }
            })
            .unwrap_or_default();
        let path = object
            .remove("path")
            .and_then(|value| match serde_json_bytes::from_value(value) {
                Ok(path) => Some(path),
                Err(error) => {
                    failfast_debug!("dropping malformed error path: {}", error);
                    None
                }
            });
        let extensions = match object.remove("extensions") {
            Some(Value::Object(extensions)) => extensions,
            _ => Object::default(),
        };

        Error {
            message,
            locations,
            path,
            extensions,
        }
    }
}

/// Displays (only) the error message.
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

/// Trait used to get extension type from an error
pub(crate) trait ErrorExtension
where
    Self: Sized,
{
    fn extension_code(&self) -> String;

    fn custom_extension_details(&self) -> Option<Object> {
        None
    }
}

/// Where the data of a [`GraphQLResult`] came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Server,
    Cache,
}

/// The outcome of parsing a GraphQL response for one operation.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphQLResult<Data> {
    /// The typed data; `None` when the response carried errors or no data.
    pub data: Option<Data>,

    /// The errors returned by the server, if any.
    pub errors: Option<Vec<Error>>,

    /// Where the data came from.
    pub source: ResultSource,

    /// Every cache key the data touched, in visit order; `None` when no data was parsed.
    pub dependent_keys: Option<IndexSet<CacheKey>>,
}

impl<Data> GraphQLResult<Data> {
    /// A result with neither data nor errors.
    pub(crate) fn empty(source: ResultSource) -> Self {
        Self {
            data: None,
            errors: None,
            source,
            dependent_keys: None,
        }
    }

    pub(crate) fn from_errors(errors: Vec<Error>, source: ResultSource) -> Self {
        Self {
            data: None,
            errors: Some(errors),
            source,
            dependent_keys: None,
        }
    }

    pub(crate) fn from_data(
        data: Data,
        dependent_keys: IndexSet<CacheKey>,
        source: ResultSource,
    ) -> Self {
        Self {
            data: Some(data),
            errors: None,
            source,
            dependent_keys: Some(dependent_keys),
        }
    }

    /// Returns true if the server reported errors.
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|errors| !errors.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json_bytes::json;

    use super::*;

    fn object(value: Value) -> Object {
        match value {
            Value::Object(object) => object,
            _ => unreachable!(),
        }
    }

    #[test]
    fn error_from_object() {
        let error = Error::from_object(object(json!({
            "message": "Name for character with ID 1002 could not be fetched.",
            "locations": [{ "line": 6, "column": 7 }],
            "path": ["hero", "heroFriends", 1, "name"],
            "extensions": { "code": "CAN_NOT_FETCH_BY_ID" }
        })));

        assert_eq!(
            error,
            Error::builder()
                .message("Name for character with ID 1002 could not be fetched.")
                .location(Location { line: 6, column: 7 })
                .path(Path::from("hero/heroFriends/1/name"))
                .extension("code", "CAN_NOT_FETCH_BY_ID")
                .build()
        );
    }

    #[test]
    fn error_from_object_drops_malformed_fields() {
        let error = Error::from_object(object(json!({
            "message": "boom",
            "locations": "line 1",
            "path": { "hero": 1 }
        })));

        assert_eq!(error.message, "boom");
        assert!(error.locations.is_empty());
        assert_eq!(error.path, None);
        assert_eq!(error.to_string(), "boom");
    }

    #[test]
    fn error_serialization_skips_empty_fields() {
        let error = Error::builder().message("boom").build();
        assert_eq!(
            serde_json_bytes::to_value(&error).unwrap(),
            json!({ "message": "boom" })
        );
    }

    #[test]
    fn result_source_serialization() {
        assert_eq!(
            serde_json_bytes::to_value(ResultSource::Server).unwrap(),
            json!("server")
        );
    }
}
