use crate::core::{CloneError, FieldMap, RecordId, Result};
use crate::remap::{IdMaps, Resolved};
use crate::schema::{CollectionSchema, FieldRole, MissingTarget};
use crate::snapshot::SourceRecord;
use serde_json::Value;
use std::collections::HashSet;

/// Fields of a record about to be created, or the reason it is skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum Prepared {
    Ready(FieldMap),
    /// A required relation had no cloned target.
    Skip { field: &'static str },
}

/// Builds the field map of the clone of `source`.
///
/// Copies plain and payload fields, resolves relations through `maps`,
/// points root fields at `root` whatever the source says, clears cached
/// artifacts and drops system and override fields. The parent field is left
/// empty for the hierarchy builder to fill in.
pub fn prepare_fields(
    schema: &CollectionSchema,
    source: &SourceRecord,
    maps: &IdMaps,
    root: &RecordId,
) -> Prepared {
    let mut fields = FieldMap::new();

    for def in schema.fields {
        match def.role {
            FieldRole::System | FieldRole::Override => {}
            FieldRole::Plain | FieldRole::Payload => {
                if let Some(value) = source.fields.get(def.name) {
                    fields.insert(def.name.to_string(), value.clone());
                }
            }
            FieldRole::Root { .. } => {
                fields.insert(def.name.to_string(), Value::String(root.to_string()));
            }
            FieldRole::Relation { target, on_missing } => {
                let resolved = source
                    .get_str(def.name)
                    .map(|old| maps.resolve(target, old))
                    .and_then(Resolved::target);
                match (resolved, on_missing) {
                    (Some(new), _) => {
                        fields.insert(def.name.to_string(), Value::String(new.to_string()));
                    }
                    (None, MissingTarget::Clear) => {
                        fields.insert(def.name.to_string(), Value::String(String::new()));
                    }
                    (None, MissingTarget::SkipRecord) => return Prepared::Skip { field: def.name },
                }
            }
            FieldRole::Parent | FieldRole::Artifact => {
                fields.insert(def.name.to_string(), Value::String(String::new()));
            }
            FieldRole::File => {
                let name = source
                    .file
                    .as_ref()
                    .map(|file| file.name.clone())
                    .or_else(|| source.get_str(def.name).map(str::to_string))
                    .unwrap_or_default();
                fields.insert(def.name.to_string(), Value::String(name));
            }
        }
    }

    Prepared::Ready(fields)
}

/// Rejects a source set that lists the same id twice.
pub fn ensure_unique_ids(schema: &CollectionSchema, records: &[SourceRecord]) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(&record.id) {
            return Err(CloneError::DuplicateSourceId {
                collection: schema.name.to_string(),
                id: record.id.to_string(),
            });
        }
    }
    Ok(())
}
