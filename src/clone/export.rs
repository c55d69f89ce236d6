//! Live site → portable snapshot or starter bundle.

use super::source::SourceGraph;
use crate::config::CloneConfig;
use crate::core::{RecordId, Result};
use crate::schema::catalog::{SITE_UPLOADS, SITES, SITES_SCHEMA};
use crate::schema::{CollectionSchema, SchemaCatalog};
use crate::snapshot::{
    BundleMetadata, RecordSet, Snapshot, SnapshotMetadata, SourceRecord, StarterBundle,
};
use crate::storage::{BlobStore, RecordStore};
use tracing::{Level, event};

fn omit_artifacts(schema: &CollectionSchema, record: &mut SourceRecord) {
    for field in schema.artifact_fields() {
        record.fields.shift_remove(field);
    }
}

/// Collections below the root in build order, artifacts removed.
fn exportable_records(graph: &SourceGraph, include_uploads: bool) -> RecordSet {
    let catalog = SchemaCatalog::new();
    let mut records = RecordSet::new();
    for schema in catalog.build_order().filter(|schema| schema.name != SITES) {
        if schema.name == SITE_UPLOADS && !include_uploads {
            continue;
        }
        let cleaned = graph
            .records
            .get(schema.name)
            .iter()
            .cloned()
            .map(|mut record| {
                omit_artifacts(schema, &mut record);
                record
            })
            .collect();
        records.set(schema.name, cleaned);
    }
    records
}

fn exportable_root(graph: &SourceGraph) -> SourceRecord {
    let mut root = graph.root.clone();
    omit_artifacts(&SITES_SCHEMA, &mut root);
    root
}

/// Exports a live site, with its upload files, as a snapshot.
pub async fn export_snapshot(
    store: &dyn RecordStore,
    blobs: &dyn BlobStore,
    site_id: &RecordId,
    metadata: SnapshotMetadata,
    config: &CloneConfig,
) -> Result<Snapshot> {
    let graph = SourceGraph::load_live(store, Some(blobs), site_id, config).await?;

    let mut records = RecordSet::new();
    records.push(SITES, exportable_root(&graph));
    for (collection, collection_records) in exportable_records(&graph, true).collections() {
        records.set(collection, collection_records.to_vec());
    }

    let snapshot = Snapshot::new(metadata, records);
    event!(
        Level::INFO,
        site = %site_id,
        records = snapshot.records.total(),
        files = snapshot.files.len(),
        "snapshot exported"
    );
    Ok(snapshot)
}

/// Exports a live site as a starter bundle. Uploads are left out; image
/// values keep pointing at the original upload ids.
pub async fn export_bundle(
    store: &dyn RecordStore,
    site_id: &RecordId,
    starter_id: &str,
    config: &CloneConfig,
) -> Result<StarterBundle> {
    let graph = SourceGraph::load_live(store, None, site_id, config).await?;
    let bundle = StarterBundle::new(
        BundleMetadata::now(starter_id),
        exportable_root(&graph),
        exportable_records(&graph, false),
    );
    event!(
        Level::INFO,
        site = %site_id,
        starter = starter_id,
        records = bundle.records.total(),
        "bundle exported"
    );
    Ok(bundle)
}
