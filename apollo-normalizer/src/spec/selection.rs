use indexmap::IndexMap;
use serde_json_bytes::ByteString;

use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::spec::FieldType;
use crate::spec::TYPENAME;

/// One entry of a selection set.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Field(Field),
    InlineFragment(InlineFragment),
}

impl From<Field> for Selection {
    fn from(field: Field) -> Self {
        Selection::Field(field)
    }
}

impl From<InlineFragment> for Selection {
    fn from(fragment: InlineFragment) -> Self {
        Selection::InlineFragment(fragment)
    }
}

/// A field selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: ByteString,
    pub alias: Option<ByteString>,
    pub arguments: IndexMap<String, InputValue>,
    pub field_type: FieldType,
    pub selection_set: Option<Vec<Selection>>,
    pub include_skip: IncludeSkip,
}

impl Field {
    pub fn new(name: impl Into<ByteString>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            alias: None,
            arguments: IndexMap::new(),
            field_type,
            selection_set: None,
            include_skip: IncludeSkip::default(),
        }
    }

    pub fn alias(mut self, alias: impl Into<ByteString>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn argument(mut self, name: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    pub fn selection_set<I, S>(mut self, selections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Selection>,
    {
        self.selection_set = Some(selections.into_iter().map(Into::into).collect());
        self
    }

    pub fn include_skip(mut self, include_skip: IncludeSkip) -> Self {
        self.include_skip = include_skip;
        self
    }

    /// The key of this field in the response: its alias if there is one, its name otherwise.
    pub fn response_key(&self) -> &ByteString {
        self.alias.as_ref().unwrap_or(&self.name)
    }

    /// Evaluates the arguments against the operation variables.
    pub(crate) fn resolve_arguments(&self, variables: &Object) -> Object {
        self.arguments
            .iter()
            .map(|(name, value)| (ByteString::from(name.as_str()), value.evaluate(variables)))
            .collect()
    }
}

/// An inline fragment, applied when the object's `__typename` matches.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineFragment {
    /// `None` applies the fragment to any object, like `... @include(if: $x) { }`
    pub type_condition: Option<String>,
    /// Object types implementing the type condition when it is an interface or a union
    pub possible_types: Vec<String>,
    pub selection_set: Vec<Selection>,
    pub include_skip: IncludeSkip,
}

impl InlineFragment {
    pub fn on<I, S>(type_condition: impl Into<String>, selections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Selection>,
    {
        Self {
            type_condition: Some(type_condition.into()),
            possible_types: Vec::new(),
            selection_set: selections.into_iter().map(Into::into).collect(),
            include_skip: IncludeSkip::default(),
        }
    }

    pub fn untyped<I, S>(selections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Selection>,
    {
        Self {
            type_condition: None,
            possible_types: Vec::new(),
            selection_set: selections.into_iter().map(Into::into).collect(),
            include_skip: IncludeSkip::default(),
        }
    }

    pub fn possible_types<I, S>(mut self, possible_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.possible_types = possible_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn include_skip(mut self, include_skip: IncludeSkip) -> Self {
        self.include_skip = include_skip;
        self
    }

    /// Checks the fragment's type condition against the object's `__typename`.
    ///
    /// A typed fragment is only applied when the response tells us the concrete type.
    pub(crate) fn applies_to(&self, object: &Object) -> bool {
        let Some(type_condition) = &self.type_condition else {
            return true;
        };
        match object.get(TYPENAME).and_then(|value| value.as_str()) {
            Some(typename) => {
                typename == type_condition.as_str()
                    || self.possible_types.iter().any(|ty| ty.as_str() == typename)
            }
            None => false,
        }
    }
}

/// A field argument value, literal or bound to an operation variable.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Literal(Value),
    Variable(String),
    List(Vec<InputValue>),
    Object(IndexMap<String, InputValue>),
}

impl InputValue {
    pub fn variable(name: impl Into<String>) -> Self {
        InputValue::Variable(name.into())
    }

    /// Substitutes variables. A variable missing from the operation evaluates to null.
    pub(crate) fn evaluate(&self, variables: &Object) -> Value {
        match self {
            InputValue::Literal(value) => value.clone(),
            InputValue::Variable(name) => {
                variables.get(name.as_str()).cloned().unwrap_or_default()
            }
            InputValue::List(values) => Value::Array(
                values
                    .iter()
                    .map(|value| value.evaluate(variables))
                    .collect(),
            ),
            InputValue::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(name, value)| (ByteString::from(name.as_str()), value.evaluate(variables)))
                    .collect(),
            ),
        }
    }
}

macro_rules! impl_literal_input_value {
    ($($ty: ty),+) => {
        $(
            impl From<$ty> for InputValue {
                fn from(value: $ty) -> Self {
                    InputValue::Literal(value.into())
                }
            }
        )+
    };
}

impl_literal_input_value!(Value, &str, String, bool, i32, i64, f64);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IncludeSkip {
    include: Condition,
    skip: Condition,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Condition {
    Yes,
    No,
    Variable(String),
}

impl Default for IncludeSkip {
    fn default() -> Self {
        Self {
            include: Condition::Yes,
            skip: Condition::No,
        }
    }
}

impl IncludeSkip {
    pub fn new(include: Condition, skip: Condition) -> Self {
        Self { include, skip }
    }

    /// `@include(if: ...)`
    pub fn include(condition: Condition) -> Self {
        Self {
            include: condition,
            skip: Condition::No,
        }
    }

    /// `@skip(if: ...)`
    pub fn skip(condition: Condition) -> Self {
        Self {
            include: Condition::Yes,
            skip: condition,
        }
    }

    pub(crate) fn should_skip(&self, variables: &Object) -> bool {
        // A missing or non boolean variable keeps the default behaviour of each directive
        self.skip.eval(variables).unwrap_or(false) || !self.include.eval(variables).unwrap_or(true)
    }
}

impl Condition {
    pub fn variable(name: impl Into<String>) -> Self {
        Condition::Variable(name.into())
    }

    pub(crate) fn eval(&self, variables: &Object) -> Option<bool> {
        match self {
            Condition::Yes => Some(true),
            Condition::No => Some(false),
            Condition::Variable(variable_name) => variables
                .get(variable_name.as_str())
                .and_then(|v| v.as_bool()),
        }
    }
}
