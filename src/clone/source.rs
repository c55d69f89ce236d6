//! The source side of a clone, read once before any transaction opens.

use crate::config::CloneConfig;
use crate::core::{CloneError, FileBlob, RecordId, Result};
use crate::schema::SchemaCatalog;
use crate::schema::catalog::{SITE_UPLOADS, SITES};
use crate::snapshot::{RecordSet, Snapshot, SourceRecord, StarterBundle};
use crate::storage::{BlobStore, RecordStore, blob_key};
use std::collections::{HashMap, HashSet};
use tracing::{Instrument, Level, event, info_span};

/// A site root plus every record below it, grouped by collection.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceGraph {
    pub root: SourceRecord,
    pub records: RecordSet,
}

impl SourceGraph {
    pub fn new(root: SourceRecord, records: RecordSet) -> Self {
        Self { root, records }
    }

    /// The first `sites` record of the snapshot is the root.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        let root = snapshot
            .records
            .get(SITES)
            .first()
            .cloned()
            .ok_or_else(|| CloneError::MissingRootRecord("snapshot contains no site".into()))?;
        Ok(Self::new(root, snapshot.records))
    }

    pub fn from_bundle(bundle: StarterBundle) -> Self {
        Self::new(bundle.site, bundle.records)
    }

    /// Reads a live site and everything it owns from `store`.
    ///
    /// A record belongs to the site when its owner relation points at a
    /// record already kept, starting from the root. Upload files are read
    /// from `blobs` when given.
    pub async fn load_live(
        store: &dyn RecordStore,
        blobs: Option<&dyn BlobStore>,
        site_id: &RecordId,
        config: &CloneConfig,
    ) -> Result<Self> {
        let span = info_span!("siteclone.load", site = %site_id);
        load_live_site(store, blobs, site_id, config)
            .instrument(span)
            .await
    }

    /// Number of records below the root.
    pub fn record_count(&self) -> usize {
        self.records
            .collections()
            .filter(|(name, _)| *name != SITES)
            .map(|(_, records)| records.len())
            .sum()
    }
}

async fn load_live_site(
    store: &dyn RecordStore,
    blobs: Option<&dyn BlobStore>,
    site_id: &RecordId,
    config: &CloneConfig,
) -> Result<SourceGraph> {
    let root = store
        .find(SITES, site_id)
        .await?
        .ok_or_else(|| CloneError::MissingRootRecord(site_id.to_string()))?;
    let root = SourceRecord::from_record(root);

    let catalog = SchemaCatalog::new();
    let mut kept: HashMap<&str, HashSet<RecordId>> = HashMap::new();
    kept.entry(SITES).or_default().insert(root.id.clone());

    let mut records = RecordSet::new();
    records.push(SITES, root.clone());

    for schema in catalog.build_order().filter(|schema| schema.name != SITES) {
        let (Some(owner), Some(owner_target)) = (schema.owner, schema.owner_target()) else {
            continue;
        };
        let mut owned = Vec::new();
        for record in store.list(schema.name).await? {
            let belongs = record
                .get_str(owner)
                .is_some_and(|owner_id| {
                    kept.get(owner_target)
                        .is_some_and(|ids| ids.contains(&RecordId::from(owner_id)))
                });
            if belongs {
                owned.push(SourceRecord::from_record(record));
            }
        }

        if schema.name == SITE_UPLOADS {
            if let Some(blobs) = blobs {
                attach_upload_files(blobs, &config.blob_prefix, &mut owned).await?;
            }
        }

        let ids = kept.entry(schema.name).or_default();
        ids.extend(owned.iter().map(|record| record.id.clone()));
        event!(Level::DEBUG, collection = schema.name, records = owned.len(), "collection loaded");
        records.set(schema.name, owned);
    }

    Ok(SourceGraph::new(root, records))
}

async fn attach_upload_files(
    blobs: &dyn BlobStore,
    prefix: &str,
    uploads: &mut [SourceRecord],
) -> Result<()> {
    for upload in uploads {
        let Some(name) = upload.get_str("file").map(str::to_string) else {
            continue;
        };
        let key = blob_key(prefix, upload.id.as_str(), &name);
        let data = blobs.get(&key).await?.ok_or_else(|| CloneError::MissingUploadFile {
            upload: upload.id.to_string(),
            key: key.clone(),
        })?;
        upload.file = Some(FileBlob::new(name, data));
    }
    Ok(())
}
