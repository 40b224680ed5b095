use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::cache::CacheKey;
use crate::error::ExecutionError;
use crate::execution::FieldEntries;
use crate::execution::FieldInfo;
use crate::execution::GraphQLResultAccumulator;
use crate::json_ext::Object;
use crate::json_ext::Path;
use crate::json_ext::Value;
use crate::spec::FieldType;

/// Builds the typed data of a response.
///
/// Scalars are checked against their declared type and objects only keep the selected fields,
/// keyed by response key. The root object is then deserialized into `T`.
pub struct SelectionSetMapper<T> {
    _data: PhantomData<fn() -> T>,
}

impl<T> SelectionSetMapper<T> {
    pub fn new() -> Self {
        Self { _data: PhantomData }
    }
}

impl<T> Default for SelectionSetMapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for SelectionSetMapper<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionSetMapper").finish()
    }
}

impl<T> GraphQLResultAccumulator for SelectionSetMapper<T>
where
    T: DeserializeOwned,
{
    type PartialResult = Value;
    type FinalResult = T;

    fn accumulate_scalar(
        &mut self,
        value: &Value,
        info: &FieldInfo<'_>,
    ) -> Result<Value, ExecutionError> {
        let field_type = info.field_type.named_type();
        coerce_scalar(value, field_type).map_err(|reason| ExecutionError::TypeMismatch {
            path: info.path.clone(),
            expected: field_type.to_string(),
            reason,
        })
    }

    fn accumulate_null(&mut self, _info: &FieldInfo<'_>) -> Result<Value, ExecutionError> {
        Ok(Value::Null)
    }

    fn accumulate_list(
        &mut self,
        elements: Vec<Value>,
        _info: &FieldInfo<'_>,
    ) -> Result<Value, ExecutionError> {
        Ok(Value::Array(elements))
    }

    fn accumulate_object(
        &mut self,
        fields: FieldEntries<Value>,
        _key: &CacheKey,
        _info: &FieldInfo<'_>,
    ) -> Result<Value, ExecutionError> {
        Ok(Value::Object(into_object(fields)))
    }

    fn finish(self, fields: FieldEntries<Value>, _key: &CacheKey) -> Result<T, ExecutionError> {
        serde_json_bytes::from_value(Value::Object(into_object(fields))).map_err(|error| {
            ExecutionError::TypeMismatch {
                path: Path::empty(),
                expected: std::any::type_name::<T>().to_string(),
                reason: error.to_string(),
            }
        })
    }
}

fn into_object(fields: FieldEntries<Value>) -> Object {
    fields
        .into_iter()
        .map(|(response_key, entry)| (response_key, entry.value))
        .collect()
}

/// <https://spec.graphql.org/October2021/#sec-Scalars.Result-Coercion-and-Serialization>
///
/// Values are not converted between JSON types, except integer IDs which become strings.
fn coerce_scalar(value: &Value, field_type: &FieldType) -> Result<Value, String> {
    match field_type {
        FieldType::Int => match value.as_i64() {
            Some(int) if i32::try_from(int).is_ok() => Ok(value.clone()),
            Some(_) => Err(format!("{value} overflows Int")),
            None => Err(format!("{value} is not an Int")),
        },
        FieldType::Float => {
            if value.is_number() {
                Ok(value.clone())
            } else {
                Err(format!("{value} is not a Float"))
            }
        }
        FieldType::String => {
            if value.is_string() {
                Ok(value.clone())
            } else {
                Err(format!("{value} is not a String"))
            }
        }
        FieldType::Boolean => {
            if value.is_boolean() {
                Ok(value.clone())
            } else {
                Err(format!("{value} is not a Boolean"))
            }
        }
        FieldType::Id => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(number) if number.is_i64() || number.is_u64() => {
                Ok(Value::String(number.to_string().into()))
            }
            _ => Err(format!("{value} is not an ID")),
        },
        FieldType::Enum(enum_type) => match value.as_str() {
            Some(s) if enum_type.values.contains(s) => Ok(value.clone()),
            Some(_) => Err(format!("{value} is not a value of the enum")),
            None => Err(format!("{value} is not an enum value")),
        },
        FieldType::Custom(scalar) => scalar.coerce(value),
        FieldType::Named(_) | FieldType::List(_) | FieldType::NonNull(_) => {
            Err(format!("{value} is not a leaf value"))
        }
    }
}
