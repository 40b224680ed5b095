//! Identity of normalized objects and of the fields stored in their records
use std::borrow::Borrow;
use std::fmt;

use itertools::Itertools;
use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;

use crate::json_ext::Object;
use crate::json_ext::Value;

/// Identifies one logical object across responses.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of an object reached from this one without an identity of its own.
    pub(crate) fn child(&self, segment: impl fmt::Display, separator: &str) -> CacheKey {
        CacheKey(format!("{}{separator}{segment}", self.0))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for CacheKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// Gives stable identity to response objects.
///
/// Called once per visited object with the object's fields as found in the response. Returning
/// `None` makes the object fall back to a key derived from its position in the response.
/// Implementations must be pure: the same object always yields the same identifier.
pub trait CacheKeyResolver: Send + Sync {
    fn cache_key(&self, object: &Object) -> Option<String>;
}

impl<F> CacheKeyResolver for F
where
    F: Fn(&Object) -> Option<String> + Send + Sync,
{
    fn cache_key(&self, object: &Object) -> Option<String> {
        self(object)
    }
}

/// Derives the key of a nested object: its resolved identity if any, its path key otherwise.
pub(crate) fn object_cache_key(
    resolver: Option<&dyn CacheKeyResolver>,
    object: &Object,
    path_key: CacheKey,
) -> CacheKey {
    match resolver.and_then(|resolver| resolver.cache_key(object)) {
        Some(key) => CacheKey(key),
        None => {
            tracing::trace!(key = %path_key, "no identity for object, using its path as cache key");
            path_key
        }
    }
}

/// Key of a field inside a record.
///
/// Fields without arguments are stored under their response key. Arguments are part of the
/// field's identity, so they are hashed into the key: `hero(<hash>)`. The hash does not depend
/// on the order in which object arguments are listed.
pub(crate) fn field_storage_key(response_key: &str, arguments: &Object) -> String {
    if arguments.is_empty() {
        return response_key.to_string();
    }

    let mut digest = blake3::Hasher::new();
    hash(&mut digest, arguments.iter());
    format!("{response_key}({})", digest.finalize().to_hex())
}

/// Hashes elements of a serde_json_bytes::Value::Object when yielded via `map.iter()`.
fn hash<'a, I>(state: &mut blake3::Hasher, fields: I)
where
    I: Iterator<Item = (&'a ByteString, &'a Value)>,
{
    fields.sorted_by(|a, b| a.0.cmp(b.0)).for_each(|(k, v)| {
        state.update(k.as_str().as_bytes());
        state.update(":".as_bytes());
        hash_value(state, v);
        state.update(",".as_bytes());
    });
}

fn hash_value(state: &mut blake3::Hasher, value: &Value) {
    match value {
        Value::Object(obj) => {
            state.update("{".as_bytes());
            hash(state, obj.iter());
            state.update("}".as_bytes());
        }
        Value::Array(values) => {
            state.update("[".as_bytes());
            for value in values {
                hash_value(state, value);
                state.update(",".as_bytes());
            }
            state.update("]".as_bytes());
        }
        _ => {
            state.update(value.to_string().as_bytes());
        }
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
    fn storage_key_without_arguments() {
        assert_eq!(field_storage_key("hero", &Object::new()), "hero");
    }

    #[test]
    fn storage_key_is_order_independent() {
        let a = field_storage_key(
            "hero",
            &object(json!({ "episode": "JEDI", "filter": { "a": 1, "b": [1, "2"] } })),
        );
        let b = field_storage_key(
            "hero",
            &object(json!({ "filter": { "b": [1, "2"], "a": 1 }, "episode": "JEDI" })),
        );
        assert_eq!(a, b);
        assert!(a.starts_with("hero("));
        assert!(a.ends_with(')'));
    }

    #[test]
    fn storage_key_depends_on_argument_values() {
        let string = field_storage_key("node", &object(json!({ "id": "1" })));
        let number = field_storage_key("node", &object(json!({ "id": 1 })));
        let other = field_storage_key("node", &object(json!({ "id": "2" })));
        assert_ne!(string, number);
        assert_ne!(string, other);

        let list = field_storage_key("nodes", &object(json!({ "ids": ["1", "2"] })));
        let reversed = field_storage_key("nodes", &object(json!({ "ids": ["2", "1"] })));
        assert_ne!(list, reversed);
    }

    #[test]
    fn object_key_prefers_resolver() {
        let resolver = |object: &Object| {
            object
                .get("id")
                .and_then(|id| id.as_str())
                .map(|id| format!("Character:{id}"))
        };
        let fallback = CacheKey::new("QUERY_ROOT").child("hero", ".");
        assert_eq!(fallback.as_str(), "QUERY_ROOT.hero");

        let with_id = object(json!({ "id": "2001", "name": "R2-D2" }));
        let without_id = object(json!({ "name": "R2-D2" }));
        assert_eq!(
            object_cache_key(Some(&resolver), &with_id, fallback.clone()).as_str(),
            "Character:2001"
        );
        assert_eq!(
            object_cache_key(Some(&resolver), &without_id, fallback.clone()),
            fallback
        );
        assert_eq!(object_cache_key(None, &with_id, fallback.clone()), fallback);
    }
}
