use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Flat field→value map of a record. Insertion order is preserved.
pub type FieldMap = serde_json::Map<String, Value>;

/// Identifier of a record inside one collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Allocates a fresh identity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub collection: String,
    pub id: RecordId,
    pub fields: FieldMap,
}

impl Record {
    pub fn new(collection: impl Into<String>, id: RecordId, fields: FieldMap) -> Self {
        Self {
            collection: collection.into(),
            id,
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// String value of `field`, `None` when absent, not a string or empty.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        field_str(&self.fields, field)
    }

    /// Fields plus the `id` key, as stored in snapshots and bundles.
    pub fn to_flat(&self) -> FieldMap {
        let mut flat = FieldMap::new();
        flat.insert("id".to_string(), Value::String(self.id.to_string()));
        for (name, value) in &self.fields {
            if name != "id" {
                flat.insert(name.clone(), value.clone());
            }
        }
        flat
    }
}

/// A file attached to an upload record.
#[derive(Clone, PartialEq, Eq)]
pub struct FileBlob {
    pub name: String,
    pub data: Vec<u8>,
}

impl FileBlob {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl fmt::Debug for FileBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileBlob")
            .field("name", &self.name)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Non-empty string value of `field` in `fields`.
pub fn field_str<'a>(fields: &'a FieldMap, field: &str) -> Option<&'a str> {
    match fields.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}
