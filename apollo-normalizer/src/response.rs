use bytes::Bytes;

use crate::cache::CacheKeyResolver;
use crate::cache::RecordSet;
use crate::error::ExecutionError;
use crate::execution::DependencyTracker;
use crate::execution::Executor;
use crate::execution::ResultNormalizer;
use crate::execution::SelectionSetMapper;
use crate::execution::zip3;
use crate::graphql;
use crate::graphql::GraphQLResult;
use crate::graphql::ResultSource;
use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::spec::GraphQLOperation;

/// A response received from the server for an operation.
#[derive(Clone, Debug)]
pub struct GraphQLResponse<Op> {
    operation: Op,
    body: Object,
    executor: Executor,
}

impl<Op> GraphQLResponse<Op>
where
    Op: GraphQLOperation,
{
    pub fn new(operation: Op, body: Object) -> Self {
        Self {
            operation,
            body,
            executor: Executor::default(),
        }
    }

    /// Create a [`GraphQLResponse`] from the supplied [`Bytes`].
    ///
    /// This will return an error if the bytes are not a JSON object.
    pub fn from_bytes(operation: Op, b: Bytes) -> Result<Self, ExecutionError> {
        let value = Value::from_bytes(b).map_err(|error| ExecutionError::MalformedResponse {
            reason: error.to_string(),
        })?;
        match value {
            Value::Object(body) => Ok(Self::new(operation, body)),
            _ => Err(ExecutionError::MalformedResponse {
                reason: "expected a JSON object".to_string(),
            }),
        }
    }

    /// Parses with a differently configured executor.
    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    pub fn operation(&self) -> &Op {
        &self.operation
    }

    pub fn body(&self) -> &Object {
        &self.body
    }

    /// Decodes the response data and normalizes it into records, in a single traversal.
    ///
    /// A response carrying `errors` is not traversed: its errors are returned without data or
    /// records. A response with neither errors nor a `data` object gives an empty result.
    #[tracing::instrument(skip_all, level = "trace", fields(operation.kind = %self.operation.operation_kind()))]
    pub async fn parse_result(
        &self,
        cache_key_resolver: Option<&dyn CacheKeyResolver>,
    ) -> Result<(GraphQLResult<Op::Data>, Option<RecordSet>), ExecutionError> {
        if let Some(errors) = self.errors() {
            tracing::debug!(
                errors = errors.len(),
                "response has errors, data is not parsed"
            );
            return Ok((
                GraphQLResult::from_errors(errors, ResultSource::Server),
                None,
            ));
        }

        let data = match self.body.get("data") {
            Some(data @ Value::Object(_)) => data,
            data => {
                tracing::debug!(
                    has_data = data.is_some(),
                    "response has neither errors nor a data object"
                );
                return Ok((GraphQLResult::empty(ResultSource::Server), None));
            }
        };

        let (data, records, dependent_keys) = self
            .executor
            .execute(
                self.operation.selection_set(),
                data,
                self.operation.root_cache_key(),
                self.operation.variables(),
                cache_key_resolver,
                zip3(
                    SelectionSetMapper::<Op::Data>::new(),
                    ResultNormalizer::new(),
                    DependencyTracker::new(),
                ),
            )
            .await?;

        Ok((
            GraphQLResult::from_data(data, dependent_keys, ResultSource::Server),
            Some(records),
        ))
    }

    /// The top level `errors`, if it is a list of error objects.
    fn errors(&self) -> Option<Vec<graphql::Error>> {
        let Some(Value::Array(errors)) = self.body.get("errors") else {
            return None;
        };
        errors
            .iter()
            .map(|error| match error {
                Value::Object(error) => Some(graphql::Error::from_object(error.clone())),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexSet;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json_bytes::json;
    use tracing_test::traced_test;

    use super::*;
    use crate::cache::CacheKey;
    use crate::cache::RecordValue;
    use crate::json_ext::Path;
    use crate::spec::Field;
    use crate::spec::FieldType;
    use crate::spec::Operation;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Person {
        id: String,
        name: String,
    }

    fn person_query() -> Operation<Person> {
        Operation::query(vec![
            Field::new("id", FieldType::Id.non_null()).into(),
            Field::new("name", FieldType::String.non_null()).into(),
        ])
    }

    fn body(value: Value) -> Object {
        match value {
            Value::Object(object) => object,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn errors_short_circuit() {
        let response = GraphQLResponse::new(
            person_query(),
            body(json!({
                "errors": [{ "message": "boom", "path": ["name"], "locations": "nowhere" }],
                "data": { "id": "1", "name": "Ann" }
            })),
        );

        let (result, records) = response.parse_result(None).await.unwrap();
        assert_eq!(result.data, None);
        assert_eq!(result.dependent_keys, None);
        assert_eq!(result.source, ResultSource::Server);
        assert!(records.is_none());

        let errors = result.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "boom");
        assert_eq!(errors[0].path, Some(Path::from("name")));
        assert!(errors[0].locations.is_empty());
        assert!(logs_contain("response has errors, data is not parsed"));
    }

    #[tokio::test]
    async fn empty_envelope() {
        let response = GraphQLResponse::new(person_query(), Object::new());
        let (result, records) = response.parse_result(None).await.unwrap();
        assert_eq!(result, GraphQLResult::empty(ResultSource::Server));
        assert!(records.is_none());

        let response = GraphQLResponse::new(person_query(), body(json!({ "data": null })));
        let (result, records) = response.parse_result(None).await.unwrap();
        assert!(!result.has_errors());
        assert_eq!(result.data, None);
        assert!(records.is_none());
    }

    #[tokio::test]
    async fn scalar_round_trip() {
        let response = GraphQLResponse::from_bytes(
            person_query(),
            Bytes::from_static(br#"{"data":{"id":"1","name":"Ann"}}"#),
        )
        .unwrap();

        let (result, records) = response.parse_result(None).await.unwrap();
        assert_eq!(
            result.data,
            Some(Person {
                id: "1".to_string(),
                name: "Ann".to_string()
            })
        );
        assert_eq!(result.errors, None);
        assert_eq!(
            result.dependent_keys,
            Some(IndexSet::from([CacheKey::new("QUERY_ROOT")]))
        );

        let records = records.unwrap();
        assert_eq!(records.len(), 1);
        let root = records.get("QUERY_ROOT").unwrap();
        assert_eq!(root.get("id"), Some(&RecordValue::Scalar(json!("1"))));
        assert_eq!(root.get("name"), Some(&RecordValue::Scalar(json!("Ann"))));
    }

    #[tokio::test]
    async fn identity_merge() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Data {
            first: Partial,
            second: Partial,
        }
        #[derive(Deserialize, Debug, PartialEq)]
        struct Partial {
            id: String,
            name: Option<String>,
            height: Option<f64>,
        }

        let operation = Operation::<Data>::query(vec![
            Field::new("person", FieldType::Named("Person".to_string()))
                .alias("first")
                .selection_set([
                    Field::new("id", FieldType::Id.non_null()),
                    Field::new("name", FieldType::String),
                ])
                .into(),
            Field::new("person", FieldType::Named("Person".to_string()))
                .alias("second")
                .selection_set([
                    Field::new("id", FieldType::Id.non_null()),
                    Field::new("height", FieldType::Float),
                ])
                .into(),
        ]);
        let response = GraphQLResponse::new(
            operation,
            body(json!({
                "data": {
                    "first": { "id": "1", "name": "Ann" },
                    "second": { "id": "1", "height": 1.6 }
                }
            })),
        );
        let resolver = |object: &Object| {
            object
                .get("id")
                .and_then(|id| id.as_str())
                .map(|id| format!("Person:{id}"))
        };

        let (result, records) = response.parse_result(Some(&resolver)).await.unwrap();
        let records = records.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            serde_json_bytes::to_value(records.get("Person:1").unwrap()).unwrap(),
            json!({ "id": "1", "name": "Ann", "height": 1.6 })
        );

        let dependent_keys = result.dependent_keys.unwrap();
        assert_eq!(
            dependent_keys.into_iter().collect::<Vec<_>>(),
            vec![CacheKey::new("Person:1"), CacheKey::new("QUERY_ROOT")]
        );
        let data = result.data.unwrap();
        assert_eq!(data.first.name.as_deref(), Some("Ann"));
        assert_eq!(data.second.height, Some(1.6));
    }

    #[tokio::test]
    async fn non_nullable_null_fails() {
        let response = GraphQLResponse::new(
            person_query(),
            body(json!({ "data": { "id": "1", "name": null } })),
        );
        let error = response.parse_result(None).await.unwrap_err();
        assert_eq!(
            error,
            ExecutionError::FieldMissingOrNull {
                response_key: "name".to_string(),
                path: Path::from("name"),
            }
        );
    }

    #[tokio::test]
    async fn absent_fields() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Profile {
            id: String,
            nick: Option<String>,
        }
        let operation = || {
            Operation::<Profile>::query(vec![
                Field::new("id", FieldType::Id.non_null()).into(),
                Field::new("nick", FieldType::String).into(),
            ])
        };

        let response = GraphQLResponse::new(operation(), body(json!({ "data": { "id": "1" } })));
        let (result, records) = response.parse_result(None).await.unwrap();
        assert_eq!(
            result.data,
            Some(Profile {
                id: "1".to_string(),
                nick: None
            })
        );
        assert_eq!(
            records.unwrap().get("QUERY_ROOT").unwrap().get("nick"),
            Some(&RecordValue::Scalar(Value::Null))
        );

        let response =
            GraphQLResponse::new(operation(), body(json!({ "data": { "nick": "x" } })));
        let error = response.parse_result(None).await.unwrap_err();
        assert_eq!(
            error,
            ExecutionError::FieldMissingOrNull {
                response_key: "id".to_string(),
                path: Path::from("id"),
            }
        );
    }

    #[test]
    fn malformed_bodies() {
        let error =
            GraphQLResponse::from_bytes(person_query(), Bytes::from_static(b"{\"data\":"))
                .unwrap_err();
        assert!(matches!(error, ExecutionError::MalformedResponse { .. }));

        let error = GraphQLResponse::from_bytes(person_query(), Bytes::from_static(b"[]"))
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "response was malformed: expected a JSON object"
        );
    }
}
