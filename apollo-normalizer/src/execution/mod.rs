//! Single pass traversal of response data against a selection set.

use indexmap::IndexMap;
use serde_json_bytes::ByteString;

use crate::cache::CacheKey;
use crate::cache::CacheKeyResolver;
use crate::cache::field_storage_key;
use crate::cache::object_cache_key;
use crate::configuration::Configuration;
use crate::error::ExecutionError;
use crate::json_ext::Object;
use crate::json_ext::Path;
use crate::json_ext::PathElement;
use crate::json_ext::Value;
use crate::spec::Field;
use crate::spec::FieldType;
use crate::spec::Selection;

mod accumulator;
mod dependency_tracker;
mod mapper;
mod normalizer;

pub use accumulator::FieldEntries;
pub use accumulator::FieldEntry;
pub use accumulator::GraphQLResultAccumulator;
pub use accumulator::Zip2;
pub use accumulator::Zip3;
pub use accumulator::zip;
pub use accumulator::zip3;
pub use dependency_tracker::DependencyTracker;
pub use mapper::SelectionSetMapper;
pub use normalizer::ResultNormalizer;

/// What the executor knows about the value being accumulated.
#[derive(Clone, Copy, Debug)]
pub struct FieldInfo<'a> {
    /// Alias of the field, or its name.
    pub response_key: &'a str,
    pub field_name: &'a str,
    /// Arguments of the field, with variables substituted.
    pub arguments: &'a Object,
    /// Declared type of the value. For list elements this is the element type.
    pub field_type: &'a FieldType,
    /// Location of the value in the response data.
    pub path: &'a Path,
    /// Key of the field in a normalized record.
    pub storage_key: &'a str,
}

/// Walks response data once, feeding every value to an accumulator.
#[derive(Clone, Debug, Default)]
pub struct Executor {
    configuration: Configuration,
}

impl Executor {
    pub fn new(configuration: Configuration) -> Self {
        Self { configuration }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Completes `root` against `selections` and returns what the accumulator built.
    ///
    /// Objects get their cache key from `cache_key_resolver` when it returns one, otherwise
    /// from their position below `root_key`. The traversal stops at the first error and no
    /// output is produced.
    #[tracing::instrument(skip_all, level = "trace")]
    pub async fn execute<A>(
        &self,
        selections: &[Selection],
        root: &Value,
        root_key: CacheKey,
        variables: &Object,
        cache_key_resolver: Option<&dyn CacheKeyResolver>,
        mut accumulator: A,
    ) -> Result<A::FinalResult, ExecutionError>
    where
        A: GraphQLResultAccumulator,
    {
        if selections.is_empty() {
            return Err(ExecutionError::EmptySelectionSet);
        }
        let Value::Object(root) = root else {
            return Err(ExecutionError::InvalidShape {
                path: Path::empty(),
                expected: "object".to_string(),
            });
        };

        let fields = Traversal {
            separator: &self.configuration.normalization.path_separator,
            recursion_limit: self.configuration.recursion_limit,
            variables,
            resolver: cache_key_resolver,
            accumulator: &mut accumulator,
        }
        .execute_fields(&[selections], root, &root_key, &Path::empty(), 0)?;

        accumulator.finish(fields, &root_key)
    }
}

/// State of one traversal.
struct Traversal<'a, A> {
    separator: &'a str,
    recursion_limit: usize,
    variables: &'a Object,
    resolver: Option<&'a dyn CacheKeyResolver>,
    accumulator: &'a mut A,
}

impl<A> Traversal<'_, A>
where
    A: GraphQLResultAccumulator,
{
    /// Completes the fields selected on `object` by every selection set in `selection_sets`.
    ///
    /// Selections are assumed to be valid: fields sharing a response key are completed with
    /// the name, type and arguments of the first of them.
    fn execute_fields(
        &mut self,
        selection_sets: &[&[Selection]],
        object: &Object,
        key: &CacheKey,
        path: &Path,
        depth: usize,
    ) -> Result<FieldEntries<A::PartialResult>, ExecutionError> {
        let mut grouped: IndexMap<&ByteString, Vec<&Field>> = IndexMap::new();
        for selection_set in selection_sets {
            self.collect_fields(selection_set, object, &mut grouped);
        }

        let mut entries = FieldEntries::with_capacity(grouped.len());
        for (response_key, fields) in grouped {
            let Some(field) = fields.first() else {
                continue;
            };
            if fields.iter().any(|other| {
                other.name != field.name
                    || other.field_type != field.field_type
                    || other.arguments != field.arguments
            }) {
                tracing::debug!(
                    response_key = response_key.as_str(),
                    "fields sharing a response key conflict, completing the first one"
                );
            }
            let arguments = field.resolve_arguments(self.variables);
            let storage_key = field_storage_key(response_key.as_str(), &arguments);
            let mut field_path = path.clone();
            field_path.push(PathElement::Key(response_key.as_str().to_string()));
            let info = FieldInfo {
                response_key: response_key.as_str(),
                field_name: field.name.as_str(),
                arguments: &arguments,
                field_type: &field.field_type,
                path: &field_path,
                storage_key: &storage_key,
            };

            // fields sharing a response key have their sub selections merged
            let nested: Vec<&[Selection]> = fields
                .iter()
                .filter_map(|field| field.selection_set.as_deref())
                .collect();

            let value = self.complete_value(
                &field.field_type,
                object.get(response_key.as_str()),
                &info,
                &nested,
                key.child(response_key.as_str(), self.separator),
                depth,
            )?;
            entries.insert(
                response_key.clone(),
                FieldEntry {
                    storage_key: storage_key.clone(),
                    value,
                },
            );
        }

        Ok(entries)
    }

    /// Flattens a selection set for `object`, grouping fields by response key.
    fn collect_fields<'s>(
        &self,
        selection_set: &'s [Selection],
        object: &Object,
        grouped: &mut IndexMap<&'s ByteString, Vec<&'s Field>>,
    ) {
        for selection in selection_set {
            match selection {
                Selection::Field(field) => {
                    if field.include_skip.should_skip(self.variables) {
                        continue;
                    }
                    grouped.entry(field.response_key()).or_default().push(field);
                }
                Selection::InlineFragment(fragment) => {
                    if fragment.include_skip.should_skip(self.variables)
                        || !fragment.applies_to(object)
                    {
                        continue;
                    }
                    self.collect_fields(&fragment.selection_set, object, grouped);
                }
            }
        }
    }

    /// Completes `value` against `field_type`.
    ///
    /// `path_key` is the cache key an object found here gets when the resolver has no
    /// identity for it.
    fn complete_value(
        &mut self,
        field_type: &FieldType,
        value: Option<&Value>,
        info: &FieldInfo<'_>,
        selection_sets: &[&[Selection]],
        path_key: CacheKey,
        depth: usize,
    ) -> Result<A::PartialResult, ExecutionError> {
        let info = FieldInfo {
            field_type,
            ..*info
        };

        match (field_type, value) {
            (FieldType::NonNull(_), None | Some(Value::Null)) => {
                Err(ExecutionError::FieldMissingOrNull {
                    response_key: info.response_key.to_string(),
                    path: info.path.clone(),
                })
            }
            (FieldType::NonNull(inner_type), Some(value)) => self.complete_value(
                inner_type,
                Some(value),
                &info,
                selection_sets,
                path_key,
                depth,
            ),
            (_, None | Some(Value::Null)) => self.accumulator.accumulate_null(&info),

            (FieldType::List(inner_type), Some(Value::Array(values))) => {
                let mut elements = Vec::with_capacity(values.len());
                for (index, element) in values.iter().enumerate() {
                    let mut element_path = info.path.clone();
                    element_path.push(PathElement::Index(index));
                    let element_info = FieldInfo {
                        path: &element_path,
                        ..info
                    };
                    elements.push(self.complete_value(
                        inner_type,
                        Some(element),
                        &element_info,
                        selection_sets,
                        path_key.child(index, self.separator),
                        depth,
                    )?);
                }
                self.accumulator.accumulate_list(elements, &info)
            }
            (FieldType::List(_), Some(_)) => Err(ExecutionError::InvalidShape {
                path: info.path.clone(),
                expected: "list".to_string(),
            }),

            (FieldType::Named(_), Some(Value::Object(object))) => {
                let depth = depth + 1;
                if depth > self.recursion_limit {
                    return Err(ExecutionError::RecursionLimitExceeded {
                        limit: self.recursion_limit,
                    });
                }
                let key = object_cache_key(self.resolver, object, path_key);
                let fields =
                    self.execute_fields(selection_sets, object, &key, info.path, depth)?;
                self.accumulator.accumulate_object(fields, &key, &info)
            }
            (FieldType::Named(type_name), Some(_)) => Err(ExecutionError::InvalidShape {
                path: info.path.clone(),
                expected: format!("object of type {type_name}"),
            }),

            (_, Some(value)) => self.accumulator.accumulate_scalar(value, &info),
        }
    }
}
