//! JSON types shared by the executor and its accumulators.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// A JSON value, as found in a GraphQL response body.
pub type Value = serde_json_bytes::Value;

/// A JSON object, with its keys kept in insertion order.
pub type Object = serde_json_bytes::Map<serde_json_bytes::ByteString, Value>;

/// A GraphQL path element that is composed of strings or numbers.
/// e.g `/book/3/name`
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathElement {
    /// An index path element.
    Index(usize),

    /// A key path element.
    Key(String),
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathElement::Index(index) => write!(f, "{index}"),
            PathElement::Key(key) => write!(f, "{key}"),
        }
    }
}

/// A path into a response, from the root `data` object.
///
/// Serialized as a GraphQL error path: an array of strings and integers.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(pub Vec<PathElement>);

impl Path {
    pub fn empty() -> Path {
        Path(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathElement> {
        self.0.iter()
    }

    pub fn push(&mut self, element: PathElement) {
        self.0.push(element)
    }
}

impl<T> From<T> for Path
where
    T: AsRef<str>,
{
    /// Parses a `/` separated path, where numeric segments become indexes.
    fn from(s: T) -> Self {
        Self(
            s.as_ref()
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(|segment| match segment.parse::<usize>() {
                    Ok(index) => PathElement::Index(index),
                    Err(_) => PathElement::Key(segment.to_string()),
                })
                .collect(),
        )
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for element in self.iter() {
            write!(f, "/{element}")?;
        }
        Ok(())
    }
}
