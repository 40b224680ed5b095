use std::fmt;
use std::marker::PhantomData;

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::CacheKey;
use crate::json_ext::Object;
use crate::spec::Selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "Query",
            OperationKind::Mutation => "Mutation",
            OperationKind::Subscription => "Subscription",
        }
    }

    /// The cache key of the root object of operations of this kind.
    ///
    /// Root keys are fixed so that every operation of a kind shares the same root record.
    pub fn root_cache_key(&self) -> CacheKey {
        match self {
            OperationKind::Query => CacheKey::new("QUERY_ROOT"),
            OperationKind::Mutation => CacheKey::new("MUTATION_ROOT"),
            OperationKind::Subscription => CacheKey::new("SUBSCRIPTION_ROOT"),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A client operation whose response can be decoded and normalized.
///
/// Usually implemented by generated code, with `Data` the generated response type.
pub trait GraphQLOperation {
    /// The typed data of a successful response.
    type Data: DeserializeOwned;

    fn operation_kind(&self) -> OperationKind;

    fn operation_name(&self) -> Option<&str> {
        None
    }

    /// The selections made on the root type.
    fn selection_set(&self) -> &[Selection];

    /// The variables the operation was sent with.
    fn variables(&self) -> &Object;

    fn root_cache_key(&self) -> CacheKey {
        self.operation_kind().root_cache_key()
    }
}

/// An operation described at runtime.
pub struct Operation<Data> {
    kind: OperationKind,
    name: Option<String>,
    selection_set: Vec<Selection>,
    variables: Object,
    _data: PhantomData<fn() -> Data>,
}

impl<Data> Operation<Data> {
    pub fn new(kind: OperationKind, selection_set: Vec<Selection>) -> Self {
        Self {
            kind,
            name: None,
            selection_set,
            variables: Object::new(),
            _data: PhantomData,
        }
    }

    pub fn query(selection_set: Vec<Selection>) -> Self {
        Self::new(OperationKind::Query, selection_set)
    }

    pub fn mutation(selection_set: Vec<Selection>) -> Self {
        Self::new(OperationKind::Mutation, selection_set)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_variables(mut self, variables: Object) -> Self {
        self.variables = variables;
        self
    }
}

impl<Data> fmt::Debug for Operation<Data> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("selection_set", &self.selection_set)
            .field("variables", &self.variables)
            .finish()
    }
}

impl<Data> Clone for Operation<Data> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            name: self.name.clone(),
            selection_set: self.selection_set.clone(),
            variables: self.variables.clone(),
            _data: PhantomData,
        }
    }
}

impl<Data> GraphQLOperation for Operation<Data>
where
    Data: DeserializeOwned,
{
    type Data = Data;

    fn operation_kind(&self) -> OperationKind {
        self.kind
    }

    fn operation_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn selection_set(&self) -> &[Selection] {
        &self.selection_set
    }

    fn variables(&self) -> &Object {
        &self.variables
    }
}
