//! Record creation for one collection at a time.
//!
//! Every created record gets a fresh id, and its old → new pair is written
//! to the collection's ID map before the next record is looked at.

pub mod flat;
pub mod hierarchy;
pub mod prepare;
pub mod tree;

pub use hierarchy::{HierarchyPlan, plan_hierarchy};
pub use prepare::{Prepared, ensure_unique_ids, prepare_fields};

use crate::core::{FieldMap, Record, RecordId, Result};
use crate::remap::IdMaps;
use crate::schema::CollectionSchema;
use crate::snapshot::SourceRecord;
use crate::storage::RecordStore;
use crate::transaction::TransactionId;

/// Counters for one built collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub created: usize,
    /// Records excluded because their ancestor chain could not be resolved.
    pub orphaned: usize,
    /// Orphans that sit on a parent cycle.
    pub cyclic: usize,
    /// Records not created because a required relation had no target.
    pub skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    pub stats: BuildStats,
    /// `(source index, new id)` for every created record, in creation order.
    pub created: Vec<(usize, RecordId)>,
}

pub struct CollectionBuilder<'a> {
    store: &'a dyn RecordStore,
    txn: TransactionId,
    maps: &'a mut IdMaps,
    /// New id of the cloned root record.
    root: &'a RecordId,
}

impl<'a> CollectionBuilder<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        txn: TransactionId,
        maps: &'a mut IdMaps,
        root: &'a RecordId,
    ) -> Self {
        Self {
            store,
            txn,
            maps,
            root,
        }
    }

    /// Builds `records` with the routine that fits the collection's shape.
    pub async fn build(
        &mut self,
        schema: &CollectionSchema,
        records: &[SourceRecord],
    ) -> Result<BuildOutcome> {
        ensure_unique_ids(schema, records)?;
        match schema.parent_field() {
            Some(parent_field) => self.build_tree(schema, parent_field, records).await,
            None => self.build_flat(schema, records).await,
        }
    }

    async fn create(
        &mut self,
        schema: &CollectionSchema,
        source: &SourceRecord,
        fields: FieldMap,
    ) -> Result<RecordId> {
        let new_id = RecordId::generate();
        let record = Record::new(schema.name, new_id.clone(), fields);
        self.store.create(self.txn, record).await?;
        self.maps.insert(schema.name, source.id.clone(), new_id.clone())?;
        Ok(new_id)
    }
}
