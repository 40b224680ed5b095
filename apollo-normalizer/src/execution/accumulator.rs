use indexmap::IndexMap;
use serde_json_bytes::ByteString;

use crate::cache::CacheKey;
use crate::error::ExecutionError;
use crate::execution::FieldInfo;
use crate::json_ext::Value;

/// A completed field of an object, as handed to [`GraphQLResultAccumulator::accumulate_object`].
#[derive(Clone, Debug, PartialEq)]
pub struct FieldEntry<S> {
    /// Key of the field in a normalized record.
    pub storage_key: String,
    /// What the accumulator produced for the field's value.
    pub value: S,
}

/// Completed fields of an object keyed by response key, in selection order.
pub type FieldEntries<S> = IndexMap<ByteString, FieldEntry<S>>;

/// Builds one output from the values visited by the [`Executor`](crate::Executor).
///
/// The executor walks the response depth first and calls back for every value once it is
/// complete: leaves first, then the list or object that contains them, then `finish` for the
/// root object. What is returned for a value is handed back when its parent completes.
///
/// Any error aborts the traversal.
pub trait GraphQLResultAccumulator {
    /// Intermediate result for one value.
    type PartialResult;
    /// Result of the whole traversal.
    type FinalResult;

    fn accumulate_scalar(
        &mut self,
        value: &Value,
        info: &FieldInfo<'_>,
    ) -> Result<Self::PartialResult, ExecutionError>;

    fn accumulate_null(&mut self, info: &FieldInfo<'_>)
    -> Result<Self::PartialResult, ExecutionError>;

    fn accumulate_list(
        &mut self,
        elements: Vec<Self::PartialResult>,
        info: &FieldInfo<'_>,
    ) -> Result<Self::PartialResult, ExecutionError>;

    /// Called for every object below the root, with the key it was given.
    fn accumulate_object(
        &mut self,
        fields: FieldEntries<Self::PartialResult>,
        key: &CacheKey,
        info: &FieldInfo<'_>,
    ) -> Result<Self::PartialResult, ExecutionError>;

    /// Called once for the root object.
    fn finish(
        self,
        fields: FieldEntries<Self::PartialResult>,
        key: &CacheKey,
    ) -> Result<Self::FinalResult, ExecutionError>;
}

macro_rules! zip_accumulators {
    // one empty collection per zipped accumulator, element types are inferred
    (@with_capacity $idx:tt $collection:ident, $capacity:expr) => {
        $collection::with_capacity($capacity)
    };
    ($(#[$meta:meta])* $name:ident { $($acc:ident => $idx:tt),+ }) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default)]
        pub struct $name<$($acc),+>($(pub $acc),+);

        impl<$($acc),+> GraphQLResultAccumulator for $name<$($acc),+>
        where
            $($acc: GraphQLResultAccumulator),+
        {
            type PartialResult = ($(<$acc as GraphQLResultAccumulator>::PartialResult,)+);
            type FinalResult = ($(<$acc as GraphQLResultAccumulator>::FinalResult,)+);

            fn accumulate_scalar(
                &mut self,
                value: &Value,
                info: &FieldInfo<'_>,
            ) -> Result<Self::PartialResult, ExecutionError> {
                Ok(($(self.$idx.accumulate_scalar(value, info)?,)+))
            }

            fn accumulate_null(
                &mut self,
                info: &FieldInfo<'_>,
            ) -> Result<Self::PartialResult, ExecutionError> {
                Ok(($(self.$idx.accumulate_null(info)?,)+))
            }

            fn accumulate_list(
                &mut self,
                elements: Vec<Self::PartialResult>,
                info: &FieldInfo<'_>,
            ) -> Result<Self::PartialResult, ExecutionError> {
                let mut lists = ($(zip_accumulators!(@with_capacity $idx Vec, elements.len()),)+);
                for element in elements {
                    $(lists.$idx.push(element.$idx);)+
                }
                Ok(($(self.$idx.accumulate_list(lists.$idx, info)?,)+))
            }

            fn accumulate_object(
                &mut self,
                fields: FieldEntries<Self::PartialResult>,
                key: &CacheKey,
                info: &FieldInfo<'_>,
            ) -> Result<Self::PartialResult, ExecutionError> {
                let mut entries = ($(zip_accumulators!(@with_capacity $idx FieldEntries, fields.len()),)+);
                for (response_key, entry) in fields {
                    $(
                        entries.$idx.insert(
                            response_key.clone(),
                            FieldEntry {
                                storage_key: entry.storage_key.clone(),
                                value: entry.value.$idx,
                            },
                        );
                    )+
                }
                Ok(($(self.$idx.accumulate_object(entries.$idx, key, info)?,)+))
            }

            fn finish(
                self,
                fields: FieldEntries<Self::PartialResult>,
                key: &CacheKey,
            ) -> Result<Self::FinalResult, ExecutionError> {
                let mut entries = ($(zip_accumulators!(@with_capacity $idx FieldEntries, fields.len()),)+);
                for (response_key, entry) in fields {
                    $(
                        entries.$idx.insert(
                            response_key.clone(),
                            FieldEntry {
                                storage_key: entry.storage_key.clone(),
                                value: entry.value.$idx,
                            },
                        );
                    )+
                }
                Ok(($(self.$idx.finish(entries.$idx, key)?,)+))
            }
        }
    };
}

zip_accumulators!(
    /// Drives two accumulators from the same traversal.
    ///
    /// Every callback is forwarded to the first accumulator, then to the second.
    Zip2 { A => 0, B => 1 }
);

zip_accumulators!(
    /// Drives three accumulators from the same traversal.
    ///
    /// Every callback is forwarded to each accumulator in order.
    Zip3 { A => 0, B => 1, C => 2 }
);

pub fn zip<A, B>(a: A, b: B) -> Zip2<A, B>
where
    A: GraphQLResultAccumulator,
    B: GraphQLResultAccumulator,
{
    Zip2(a, b)
}

pub fn zip3<A, B, C>(a: A, b: B, c: C) -> Zip3<A, B, C>
where
    A: GraphQLResultAccumulator,
    B: GraphQLResultAccumulator,
    C: GraphQLResultAccumulator,
{
    Zip3(a, b, c)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json_bytes::json;

    use super::*;
    use crate::execution::Executor;
    use crate::json_ext::Object;
    use crate::spec::Field;
    use crate::spec::FieldType;
    use crate::spec::Selection;

    /// Records every callback it receives, tagged with its own name.
    struct CallLog {
        name: &'static str,
        calls: Vec<String>,
    }

    impl CallLog {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                calls: Vec::new(),
            }
        }

        fn log(&mut self, call: String) -> usize {
            self.calls.push(format!("{}:{call}", self.name));
            self.calls.len()
        }
    }

    impl GraphQLResultAccumulator for CallLog {
        type PartialResult = usize;
        type FinalResult = Vec<String>;

        fn accumulate_scalar(
            &mut self,
            value: &Value,
            info: &FieldInfo<'_>,
        ) -> Result<usize, ExecutionError> {
            Ok(self.log(format!("scalar {} {value}", info.path)))
        }

        fn accumulate_null(&mut self, info: &FieldInfo<'_>) -> Result<usize, ExecutionError> {
            Ok(self.log(format!("null {}", info.path)))
        }

        fn accumulate_list(
            &mut self,
            elements: Vec<usize>,
            info: &FieldInfo<'_>,
        ) -> Result<usize, ExecutionError> {
            Ok(self.log(format!("list {} {elements:?}", info.path)))
        }

        fn accumulate_object(
            &mut self,
            fields: FieldEntries<usize>,
            key: &CacheKey,
            info: &FieldInfo<'_>,
        ) -> Result<usize, ExecutionError> {
            let values: Vec<usize> = fields.values().map(|entry| entry.value).collect();
            Ok(self.log(format!("object {} {key} {values:?}", info.path)))
        }

        fn finish(
            mut self,
            fields: FieldEntries<usize>,
            key: &CacheKey,
        ) -> Result<Vec<String>, ExecutionError> {
            let values: Vec<usize> = fields.values().map(|entry| entry.value).collect();
            self.log(format!("finish {key} {values:?}"));
            Ok(self.calls)
        }
    }

    fn selections() -> Vec<Selection> {
        vec![
            Field::new(
                "hero",
                FieldType::Named("Character".to_string()),
            )
            .selection_set([
                Field::new("name", FieldType::String.non_null()),
                Field::new("appearsIn", FieldType::String.list()),
            ])
            .into(),
            Field::new("droid", FieldType::Named("Droid".to_string())).into(),
        ]
    }

    #[tokio::test]
    async fn zip_forwards_every_call_in_order() {
        let data = json!({
            "hero": { "name": "R2-D2", "appearsIn": ["NEWHOPE", null] },
            "droid": null
        });

        let (first, second) = Executor::default()
            .execute(
                &selections(),
                &data,
                CacheKey::new("QUERY_ROOT"),
                &Object::new(),
                None,
                zip(CallLog::new("a"), CallLog::new("b")),
            )
            .await
            .unwrap();

        let expected = [
            "scalar /hero/name \"R2-D2\"",
            "scalar /hero/appearsIn/0 \"NEWHOPE\"",
            "null /hero/appearsIn/1",
            "list /hero/appearsIn [2, 3]",
            "object /hero QUERY_ROOT.hero [1, 4]",
            "null /droid",
            "finish QUERY_ROOT [5, 6]",
        ];
        assert_eq!(
            first,
            expected.iter().map(|call| format!("a:{call}")).collect::<Vec<_>>()
        );
        assert_eq!(
            second,
            expected.iter().map(|call| format!("b:{call}")).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn zip3_returns_outputs_in_declaration_order() {
        let data = json!({ "hero": { "name": "R2-D2", "appearsIn": [] }, "droid": null });

        let (a, b, c) = Executor::default()
            .execute(
                &selections(),
                &data,
                CacheKey::new("QUERY_ROOT"),
                &Object::new(),
                None,
                zip3(CallLog::new("a"), CallLog::new("b"), CallLog::new("c")),
            )
            .await
            .unwrap();

        assert_eq!(a.len(), 5);
        assert!(a.iter().all(|call| call.starts_with("a:")));
        assert!(b.iter().all(|call| call.starts_with("b:")));
        assert!(c.iter().all(|call| call.starts_with("c:")));
        assert_eq!(c.last().unwrap(), "c:finish QUERY_ROOT [3, 4]");
    }
}
