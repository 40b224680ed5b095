//! Cache keys and the normalized records a traversal produces.
//!
//! Storing records, and merging them with previously cached ones, is left to the caller.

mod cache_key;
mod record;

pub(crate) use cache_key::field_storage_key;
pub(crate) use cache_key::object_cache_key;
pub use cache_key::CacheKey;
pub use cache_key::CacheKeyResolver;
pub use record::Record;
pub use record::RecordSet;
pub use record::RecordValue;
