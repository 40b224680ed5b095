use indexmap::IndexSet;

use crate::cache::CacheKey;
use crate::error::ExecutionError;
use crate::execution::FieldEntries;
use crate::execution::FieldInfo;
use crate::execution::GraphQLResultAccumulator;
use crate::json_ext::Value;

/// Collects the key of every object visited, root included.
///
/// A cached result built from a response has to be refreshed when any of these keys changes.
#[derive(Clone, Debug, Default)]
pub struct DependencyTracker {
    dependent_keys: IndexSet<CacheKey>,
}

impl DependencyTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GraphQLResultAccumulator for DependencyTracker {
    type PartialResult = ();
    type FinalResult = IndexSet<CacheKey>;

    fn accumulate_scalar(
        &mut self,
        _value: &Value,
        _info: &FieldInfo<'_>,
    ) -> Result<(), ExecutionError> {
        Ok(())
    }

    fn accumulate_null(&mut self, _info: &FieldInfo<'_>) -> Result<(), ExecutionError> {
        Ok(())
    }

    fn accumulate_list(
        &mut self,
        _elements: Vec<()>,
        _info: &FieldInfo<'_>,
    ) -> Result<(), ExecutionError> {
        Ok(())
    }

    fn accumulate_object(
        &mut self,
        _fields: FieldEntries<()>,
        key: &CacheKey,
        _info: &FieldInfo<'_>,
    ) -> Result<(), ExecutionError> {
        self.dependent_keys.insert(key.clone());
        Ok(())
    }

    fn finish(
        mut self,
        _fields: FieldEntries<()>,
        key: &CacheKey,
    ) -> Result<IndexSet<CacheKey>, ExecutionError> {
        self.dependent_keys.insert(key.clone());
        Ok(self.dependent_keys)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json_bytes::json;

    use super::*;
    use crate::execution::Executor;
    use crate::execution::ResultNormalizer;
    use crate::execution::zip;
    use crate::json_ext::Object;
    use crate::spec::Field;
    use crate::spec::FieldType;
    use crate::spec::Selection;

    #[tokio::test]
    async fn same_object_is_tracked_once() {
        let resolver = |object: &Object| {
            object
                .get("id")
                .and_then(|id| id.as_str())
                .map(|id| format!("Character:{id}"))
        };
        let selections: Vec<Selection> = ["r2", "artoo"]
            .into_iter()
            .map(|alias| {
                Field::new("hero", FieldType::Named("Character".to_string()))
                    .alias(alias)
                    .selection_set([Field::new("id", FieldType::Id)])
                    .into()
            })
            .collect();

        let (keys, records) = Executor::default()
            .execute(
                &selections,
                &json!({ "r2": { "id": "2001" }, "artoo": { "id": "2001" } }),
                CacheKey::new("QUERY_ROOT"),
                &Object::new(),
                Some(&resolver),
                zip(DependencyTracker::new(), ResultNormalizer::new()),
            )
            .await
            .unwrap();

        assert_eq!(
            keys,
            IndexSet::from([CacheKey::new("Character:2001"), CacheKey::new("QUERY_ROOT")])
        );
        assert!(records.keys().all(|key| keys.contains(key)));
    }

    #[tokio::test]
    async fn scalars_only_depend_on_the_root() {
        let keys = Executor::default()
            .execute(
                &[Selection::from(Field::new("name", FieldType::String))],
                &json!({ "name": "Han" }),
                CacheKey::new("MUTATION_ROOT"),
                &Object::new(),
                None,
                DependencyTracker::new(),
            )
            .await
            .unwrap();
        assert_eq!(keys, IndexSet::from([CacheKey::new("MUTATION_ROOT")]));
    }
}
