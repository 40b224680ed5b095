use crate::cache::CacheKey;
use crate::cache::Record;
use crate::cache::RecordSet;
use crate::cache::RecordValue;
use crate::error::ExecutionError;
use crate::execution::FieldEntries;
use crate::execution::FieldInfo;
use crate::execution::GraphQLResultAccumulator;
use crate::json_ext::Value;

/// Flattens a response into records, one per cache key.
///
/// Nested objects are replaced by a reference to their own record. An object visited more than
/// once, for instance under two aliases, ends up in a single record holding the fields of every
/// visit.
#[derive(Clone, Debug, Default)]
pub struct ResultNormalizer {
    records: RecordSet,
}

impl ResultNormalizer {
    pub fn new() -> Self {
        Self::default()
    }
}

fn into_record(fields: FieldEntries<RecordValue>) -> Record {
    fields
        .into_values()
        .map(|entry| (entry.storage_key, entry.value))
        .collect()
}

impl GraphQLResultAccumulator for ResultNormalizer {
    type PartialResult = RecordValue;
    type FinalResult = RecordSet;

    fn accumulate_scalar(
        &mut self,
        value: &Value,
        _info: &FieldInfo<'_>,
    ) -> Result<RecordValue, ExecutionError> {
        Ok(RecordValue::Scalar(value.clone()))
    }

    fn accumulate_null(&mut self, _info: &FieldInfo<'_>) -> Result<RecordValue, ExecutionError> {
        Ok(RecordValue::Scalar(Value::Null))
    }

    fn accumulate_list(
        &mut self,
        elements: Vec<RecordValue>,
        _info: &FieldInfo<'_>,
    ) -> Result<RecordValue, ExecutionError> {
        Ok(RecordValue::List(elements))
    }

    fn accumulate_object(
        &mut self,
        fields: FieldEntries<RecordValue>,
        key: &CacheKey,
        _info: &FieldInfo<'_>,
    ) -> Result<RecordValue, ExecutionError> {
        self.records.merge_record(key.clone(), into_record(fields));
        Ok(RecordValue::Reference(key.clone()))
    }

    fn finish(
        mut self,
        fields: FieldEntries<RecordValue>,
        key: &CacheKey,
    ) -> Result<RecordSet, ExecutionError> {
        self.records.merge_record(key.clone(), into_record(fields));
        Ok(self.records)
    }
}
