use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;

use crate::json_ext::Value;

/// Converts a custom scalar value as received from the server, or explains why it can't.
pub type ScalarCoercion = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;

/// The declared type of a field, as described by the selection set.
///
/// Scalars carry their own coercion rule so that decoding does not need a schema.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// Object, interface or union type {0}; the field has a nested selection set
    Named(String),
    /// List type {0}
    List(Box<FieldType>),
    /// Non null type {0}
    NonNull(Box<FieldType>),
    /// String
    String,
    /// Int
    Int,
    /// Float
    Float,
    /// Id
    Id,
    /// Boolean
    Boolean,
    /// Enum type with its allowed values
    Enum(EnumType),
    /// Custom scalar, opaque to this crate
    Custom(CustomScalar),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub values: IndexSet<String>,
}

impl EnumType {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone)]
pub struct CustomScalar {
    pub name: String,
    pub coercion: Option<ScalarCoercion>,
}

impl CustomScalar {
    /// A custom scalar whose values are passed through as received.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            coercion: None,
        }
    }

    pub fn with_coercion<F>(name: impl Into<String>, coercion: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            coercion: Some(Arc::new(coercion)),
        }
    }

    pub(crate) fn coerce(&self, value: &Value) -> Result<Value, String> {
        match &self.coercion {
            Some(coercion) => coercion(value),
            None => Ok(value.clone()),
        }
    }
}

impl fmt::Debug for CustomScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomScalar")
            .field("name", &self.name)
            .field("coercion", &self.coercion.is_some())
            .finish()
    }
}

impl PartialEq for CustomScalar {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Named(ty) => write!(f, "{ty}"),
            FieldType::List(ty) => write!(f, "[{ty}]"),
            FieldType::NonNull(ty) => write!(f, "{ty}!"),
            FieldType::String => write!(f, "String"),
            FieldType::Int => write!(f, "Int"),
            FieldType::Float => write!(f, "Float"),
            FieldType::Id => write!(f, "ID"),
            FieldType::Boolean => write!(f, "Boolean"),
            FieldType::Enum(enum_type) => write!(f, "{}", enum_type.name),
            FieldType::Custom(scalar) => write!(f, "{}", scalar.name),
        }
    }
}

impl FieldType {
    pub fn non_null(self) -> FieldType {
        FieldType::NonNull(Box::new(self))
    }

    pub fn list(self) -> FieldType {
        FieldType::List(Box::new(self))
    }

    /// return the type with list and non null wrappers removed
    ///
    /// Example if we get the field `list: [User!]!`, it will return `User`
    pub fn named_type(&self) -> &FieldType {
        match self {
            FieldType::List(inner) | FieldType::NonNull(inner) => inner.named_type(),
            _ => self,
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, FieldType::NonNull(_))
    }

    /// Returns true for object, interface and union types, which need a selection set.
    pub fn is_composite(&self) -> bool {
        matches!(self.named_type(), FieldType::Named(_))
    }
}
