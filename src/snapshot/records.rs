use crate::core::{CloneError, FieldMap, FileBlob, Record, RecordId, Result, field_str};
use serde_json::Value;

/// One record as read from a source, before cloning.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub id: RecordId,
    /// Fields without `id`.
    pub fields: FieldMap,
    /// File attached to an upload record.
    pub file: Option<FileBlob>,
}

impl SourceRecord {
    pub fn new(id: impl Into<RecordId>, fields: FieldMap) -> Self {
        Self {
            id: id.into(),
            fields,
            file: None,
        }
    }

    pub fn with_file(mut self, file: FileBlob) -> Self {
        self.file = Some(file);
        self
    }

    /// Parses a flat `{id, ...fields}` object.
    pub fn from_flat(collection: &str, mut flat: FieldMap) -> Result<Self> {
        let id = match flat.shift_remove("id") {
            Some(Value::String(id)) if !id.is_empty() => RecordId::from(id),
            _ => {
                return Err(CloneError::InvalidRecord(format!(
                    "record in '{}' has no id",
                    collection
                )));
            }
        };
        Ok(Self::new(id, flat))
    }

    pub fn from_record(record: Record) -> Self {
        let mut fields = record.fields;
        fields.shift_remove("id");
        Self::new(record.id, fields)
    }

    pub fn to_flat(&self) -> FieldMap {
        let mut flat = FieldMap::new();
        flat.insert("id".to_string(), Value::String(self.id.to_string()));
        for (name, value) in &self.fields {
            flat.insert(name.clone(), value.clone());
        }
        flat
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        field_str(&self.fields, field)
    }
}

/// Source records grouped by collection, in collection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    collections: Vec<(String, Vec<SourceRecord>)>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records of `collection`; empty when the collection is absent.
    pub fn get(&self, collection: &str) -> &[SourceRecord] {
        self.collections
            .iter()
            .find(|(name, _)| name == collection)
            .map(|(_, records)| records.as_slice())
            .unwrap_or(&[])
    }

    pub fn get_mut(&mut self, collection: &str) -> &mut Vec<SourceRecord> {
        let pos = match self.collections.iter().position(|(name, _)| name == collection) {
            Some(pos) => pos,
            None => {
                self.collections.push((collection.to_string(), Vec::new()));
                self.collections.len() - 1
            }
        };
        &mut self.collections[pos].1
    }

    pub fn contains(&self, collection: &str) -> bool {
        self.collections.iter().any(|(name, _)| name == collection)
    }

    pub fn push(&mut self, collection: &str, record: SourceRecord) {
        self.get_mut(collection).push(record);
    }

    /// Replaces the records of `collection`, keeping its position.
    pub fn set(&mut self, collection: &str, records: Vec<SourceRecord>) {
        *self.get_mut(collection) = records;
    }

    pub fn collections(&self) -> impl Iterator<Item = (&str, &[SourceRecord])> {
        self.collections
            .iter()
            .map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    pub fn total(&self) -> usize {
        self.collections.iter().map(|(_, records)| records.len()).sum()
    }

    /// Parses `{collection: [{id, ...}, ...], ...}`.
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(object) = value else {
            return Err(CloneError::InvalidRecord(
                "records must be an object keyed by collection".into(),
            ));
        };
        let mut set = Self::new();
        for (collection, records) in object {
            let Value::Array(records) = records else {
                return Err(CloneError::InvalidRecord(format!(
                    "records of '{}' must be an array",
                    collection
                )));
            };
            let mut parsed = Vec::with_capacity(records.len());
            for record in records {
                let Value::Object(flat) = record else {
                    return Err(CloneError::InvalidRecord(format!(
                        "record in '{}' must be an object",
                        collection
                    )));
                };
                parsed.push(SourceRecord::from_flat(&collection, flat)?);
            }
            set.collections.push((collection, parsed));
        }
        Ok(set)
    }

    pub fn to_json(&self) -> Value {
        let mut object = FieldMap::new();
        for (collection, records) in &self.collections {
            let records = records
                .iter()
                .map(|record| Value::Object(record.to_flat()))
                .collect();
            object.insert(collection.clone(), Value::Array(records));
        }
        Value::Object(object)
    }
}
