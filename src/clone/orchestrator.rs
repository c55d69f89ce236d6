use super::report::CloneReport;
use super::request::CloneRequest;
use super::source::SourceGraph;
use crate::builder::{BuildStats, CollectionBuilder, Prepared, prepare_fields};
use crate::config::CloneConfig;
use crate::core::{CloneError, Record, RecordId, Result};
use crate::patch::ReferencePatcher;
use crate::remap::IdMaps;
use crate::schema::SchemaCatalog;
use crate::schema::catalog::{SITE_UPLOADS, SITES, SITES_SCHEMA};
use crate::storage::{BlobStore, RecordStore, blob_key};
use crate::transaction::TransactionId;
use serde_json::Value;
use tracing::{Instrument, Level, event, info_span};

/// Result of a committed clone.
#[derive(Debug, Clone)]
pub struct CloneOutcome {
    pub site: Record,
    pub report: CloneReport,
    /// Old → new ids of every created record.
    pub id_maps: IdMaps,
}

/// Clones a source graph into a new site inside one transaction.
pub struct SiteCloner<'a> {
    store: &'a dyn RecordStore,
    blobs: &'a dyn BlobStore,
    catalog: SchemaCatalog,
    config: CloneConfig,
}

impl<'a> SiteCloner<'a> {
    pub fn new(store: &'a dyn RecordStore, blobs: &'a dyn BlobStore) -> Self {
        Self {
            store,
            blobs,
            catalog: SchemaCatalog::new(),
            config: CloneConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CloneConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CloneConfig {
        &self.config
    }

    /// Clones a live site that lives in this cloner's own store.
    pub async fn clone_live(&self, site_id: &RecordId, request: &CloneRequest) -> Result<CloneOutcome> {
        let source =
            SourceGraph::load_live(self.store, Some(self.blobs), site_id, &self.config).await?;
        self.clone_site(&source, request).await
    }

    /// Builds every collection, patches embedded references and commits.
    ///
    /// Any failure rolls the transaction back, removes files written so far
    /// and is reported as `TransactionAborted`.
    pub async fn clone_site(&self, source: &SourceGraph, request: &CloneRequest) -> Result<CloneOutcome> {
        let span = info_span!(
            "siteclone.clone",
            source_site = %source.root.id,
            name = %request.name,
            host = %request.host
        );
        self.clone_in_transaction(source, request)
            .instrument(span)
            .await
    }

    async fn clone_in_transaction(
        &self,
        source: &SourceGraph,
        request: &CloneRequest,
    ) -> Result<CloneOutcome> {
        self.catalog.validate_build_order()?;
        self.catalog.validate_store(self.store).await?;

        let txn = self.store.begin().await?;
        let mut written = Vec::new();

        let result = match self.run(txn, source, request, &mut written).await {
            Ok(outcome) => self.store.commit(txn).await.map(|()| outcome),
            Err(err) => {
                if let Err(rollback_err) = self.store.rollback(txn).await {
                    event!(Level::ERROR, error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        };

        match result {
            Ok(outcome) => {
                event!(
                    Level::INFO,
                    site = %outcome.site.id,
                    created = outcome.report.total_created(),
                    orphaned = outcome.report.total_orphaned(),
                    dangling = outcome.report.total_dangling(),
                    "site cloned"
                );
                Ok(outcome)
            }
            Err(err) => {
                event!(Level::ERROR, error = %err, "site clone aborted");
                for key in &written {
                    if let Err(delete_err) = self.blobs.delete(key).await {
                        event!(Level::WARN, key = %key, error = %delete_err, "orphaned upload file left behind");
                    }
                }
                Err(err.aborted())
            }
        }
    }

    async fn run(
        &self,
        txn: TransactionId,
        source: &SourceGraph,
        request: &CloneRequest,
        written: &mut Vec<String>,
    ) -> Result<CloneOutcome> {
        let mut maps = IdMaps::new();
        let mut report = CloneReport::new();

        let site_id = self.create_root(txn, source, request, &mut maps).await?;
        report.record_build(
            SITES,
            1,
            BuildStats {
                created: 1,
                ..BuildStats::default()
            },
        );

        for schema in self.catalog.build_order().filter(|schema| schema.name != SITES) {
            let records = source.records.get(schema.name);
            let mut builder = CollectionBuilder::new(self.store, txn, &mut maps, &site_id);
            let outcome = builder
                .build(schema, records)
                .instrument(info_span!("siteclone.build", collection = schema.name))
                .await?;

            if schema.name == SITE_UPLOADS {
                for (index, new_id) in &outcome.created {
                    let Some(file) = &records[*index].file else {
                        continue;
                    };
                    let key = blob_key(&self.config.blob_prefix, new_id.as_str(), &file.name);
                    self.blobs.put(&key, file.data.clone()).await?;
                    written.push(key);
                    report.blobs_copied += 1;
                }
            }

            event!(
                Level::DEBUG,
                collection = schema.name,
                created = outcome.stats.created,
                orphaned = outcome.stats.orphaned,
                skipped = outcome.stats.skipped,
                "collection built"
            );
            report.record_build(schema.name, records.len(), outcome.stats);
        }

        let patcher = ReferencePatcher::new(self.store, txn, &maps);
        for schema in self
            .catalog
            .config_collections()
            .chain(self.catalog.value_collections())
        {
            let stats = patcher.patch_collection(schema).await?;
            report.record_patch(schema.name, stats);
        }

        let site = self
            .store
            .find_in(txn, SITES, &site_id)
            .await?
            .ok_or_else(|| CloneError::RecordNotFound {
                collection: SITES.to_string(),
                id: site_id.to_string(),
            })?;

        Ok(CloneOutcome {
            site,
            report,
            id_maps: maps,
        })
    }

    async fn create_root(
        &self,
        txn: TransactionId,
        source: &SourceGraph,
        request: &CloneRequest,
        maps: &mut IdMaps,
    ) -> Result<RecordId> {
        let site_id = RecordId::generate();
        let Prepared::Ready(mut fields) = prepare_fields(&SITES_SCHEMA, &source.root, maps, &site_id)
        else {
            return Err(CloneError::InvalidRecord("site root cannot be prepared".into()));
        };
        fields.insert("name".to_string(), Value::String(request.name.clone()));
        fields.insert("host".to_string(), Value::String(request.host.clone()));
        fields.insert(
            "group".to_string(),
            Value::String(request.group.clone().unwrap_or_default()),
        );

        self.store
            .create(txn, Record::new(SITES, site_id.clone(), fields))
            .await?;
        maps.insert(SITES, source.root.id.clone(), site_id.clone())?;
        Ok(site_id)
    }
}
