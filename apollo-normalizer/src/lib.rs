//! Decodes, normalizes and tracks the dependencies of GraphQL responses in a single traversal.
//!
//! A [`GraphQLResponse`] is walked once against the selection set of its operation. The walk
//! drives three accumulators at the same time: a [`SelectionSetMapper`] producing the typed
//! data, a [`ResultNormalizer`] producing a flat [`RecordSet`] keyed by [`CacheKey`], and a
//! [`DependencyTracker`] collecting every cache key the response touched.

#![cfg_attr(feature = "failfast", allow(unreachable_code))]
#![warn(unreachable_pub)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

macro_rules! failfast_debug {
    ($($tokens:tt)+) => {{
        tracing::debug!($($tokens)+);
        #[cfg(feature = "failfast")]
        panic!(
            "failfast triggered. \
            Please remove the feature failfast if you don't want to see these panics"
        );
    }};
}

pub mod json_ext;

pub mod cache;
pub mod configuration;
pub mod error;
pub mod execution;
pub mod graphql;
mod response;
pub mod spec;

pub use cache::CacheKey;
pub use cache::CacheKeyResolver;
pub use cache::Record;
pub use cache::RecordSet;
pub use cache::RecordValue;
pub use configuration::Configuration;
pub use error::ExecutionError;
pub use execution::DependencyTracker;
pub use execution::Executor;
pub use execution::ResultNormalizer;
pub use execution::SelectionSetMapper;
pub use graphql::GraphQLResult;
pub use graphql::ResultSource;
pub use response::GraphQLResponse;
pub use spec::GraphQLOperation;
pub use spec::Operation;
pub use spec::OperationKind;
