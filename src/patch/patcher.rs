use super::kind::{FieldKind, PatchContext};
use super::payload::Payload;
use crate::core::{CloneError, RecordId, Result};
use crate::remap::IdMaps;
use crate::schema::{CollectionSchema, PayloadKind};
use crate::storage::RecordStore;
use crate::transaction::TransactionId;
use std::collections::HashMap;
use tracing::{Instrument, Level, event, info_span};

/// Counters for one patched collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchStats {
    /// Records whose payload was rewritten and re-persisted.
    pub patched: usize,
    /// Embedded ids replaced with their new id.
    pub rewritten: usize,
    /// Embedded ids left as they were because their target was not cloned.
    pub dangling: usize,
    /// Payloads skipped because their type tag is not known.
    pub unknown: usize,
}

/// Second pass over freshly created records that rewrites embedded ids.
pub struct ReferencePatcher<'a> {
    store: &'a dyn RecordStore,
    txn: TransactionId,
    maps: &'a IdMaps,
}

impl<'a> ReferencePatcher<'a> {
    pub fn new(store: &'a dyn RecordStore, txn: TransactionId, maps: &'a IdMaps) -> Self {
        Self { store, txn, maps }
    }

    /// Patches every record of `schema` created by this clone.
    pub async fn patch_collection(&self, schema: &CollectionSchema) -> Result<PatchStats> {
        let span = info_span!("siteclone.patch", collection = schema.name);
        self.patch_records(schema).instrument(span).await
    }

    async fn patch_records(&self, schema: &CollectionSchema) -> Result<PatchStats> {
        let (Some(kind), Some(payload_field)) = (schema.payload, schema.payload_field()) else {
            return Ok(PatchStats::default());
        };
        let Some(map) = self.maps.get(schema.name) else {
            return Ok(PatchStats::default());
        };

        let mut stats = PatchStats::default();
        let mut field_kinds: HashMap<RecordId, FieldKind> = HashMap::new();

        for new_id in map.new_ids() {
            let mut record = self
                .store
                .find_in(self.txn, schema.name, new_id)
                .await?
                .ok_or_else(|| CloneError::RecordNotFound {
                    collection: schema.name.to_string(),
                    id: new_id.to_string(),
                })?;
            let Some(raw) = record.fields.get(payload_field).cloned() else {
                continue;
            };
            let mut payload = Payload::from(raw).normalize();
            let mut ctx = PatchContext::new(self.maps);

            match kind {
                PayloadKind::Config => {
                    let field_kind = FieldKind::from_tag(record.get_str("type").unwrap_or_default());
                    field_kind.patch_config(&mut payload, schema.name, &mut ctx);
                }
                PayloadKind::Value { field_collection } => {
                    let field_kind = match record.get_str("field") {
                        Some(field_id) => {
                            self.field_kind(field_collection, field_id, &mut field_kinds)
                                .await?
                        }
                        None => FieldKind::Unknown(String::new()),
                    };
                    field_kind.patch_value(&mut payload, &mut ctx);
                }
            }

            stats.rewritten += ctx.rewritten;
            stats.dangling += ctx.dangling;
            stats.unknown += ctx.unknown;

            if ctx.rewritten > 0 {
                record.fields.insert(payload_field.to_string(), payload);
                self.store.update(self.txn, record).await?;
                stats.patched += 1;
            }
        }

        event!(
            Level::DEBUG,
            patched = stats.patched,
            dangling = stats.dangling,
            unknown = stats.unknown,
            "collection patched"
        );
        Ok(stats)
    }

    /// Type of the (new) field definition an entry points to.
    async fn field_kind(
        &self,
        field_collection: &str,
        field_id: &str,
        cache: &mut HashMap<RecordId, FieldKind>,
    ) -> Result<FieldKind> {
        let id = RecordId::from(field_id);
        if let Some(kind) = cache.get(&id) {
            return Ok(kind.clone());
        }
        let kind = match self.store.find_in(self.txn, field_collection, &id).await? {
            Some(field) => FieldKind::from_tag(field.get_str("type").unwrap_or_default()),
            None => FieldKind::Unknown(String::new()),
        };
        cache.insert(id, kind.clone());
        Ok(kind)
    }
}
