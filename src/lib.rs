// ============================================================================
// siteclone Library
// ============================================================================
//
// Clones a site's content graph into a fresh tenant identity: every record
// gets a new id, self-referential trees are rebuilt parent-before-child and
// foreign keys hidden inside JSON payloads are rewritten in a second pass.
//
// Sources: a live site in a record store, a binary snapshot, or a JSON
// starter bundle.
//
// ============================================================================

pub mod builder;
pub mod clone;
pub mod config;
pub mod core;
pub mod fetch;
pub mod patch;
pub mod remap;
pub mod schema;
pub mod snapshot;
pub mod storage;
pub mod transaction;

// Re-export main types for convenience
pub use clone::{
    CloneOutcome, CloneReport, CloneRequest, CollectionReport, SiteCloner, SourceGraph,
    export_bundle, export_snapshot,
};
pub use config::CloneConfig;
pub use core::{CloneError, FieldMap, FileBlob, Record, RecordId, Result};
pub use fetch::fetch_snapshot;
pub use snapshot::{Snapshot, SnapshotMetadata, StarterBundle};
pub use storage::{BlobStore, InMemoryBlobStore, InMemoryStore, RecordStore};

/// Decodes a snapshot and clones it into `store`.
///
/// # Examples
///
/// ```no_run
/// use siteclone::{CloneRequest, InMemoryBlobStore, InMemoryStore};
///
/// # async fn run(bytes: Vec<u8>) -> siteclone::Result<()> {
/// let store = InMemoryStore::with_site_schema();
/// let blobs = InMemoryBlobStore::new();
/// let request = CloneRequest::new("My Site", "my-site.example.com");
///
/// let outcome = siteclone::clone_snapshot(&store, &blobs, &bytes, &request).await?;
/// println!("new site {}\n{}", outcome.site.id, outcome.report);
/// # Ok(())
/// # }
/// ```
pub async fn clone_snapshot(
    store: &dyn RecordStore,
    blobs: &dyn BlobStore,
    bytes: &[u8],
    request: &CloneRequest,
) -> Result<CloneOutcome> {
    let source = SourceGraph::from_snapshot(snapshot::decode(bytes)?)?;
    SiteCloner::new(store, blobs).clone_site(&source, request).await
}

/// Parses a starter bundle and clones it into `store`.
pub async fn clone_bundle(
    store: &dyn RecordStore,
    blobs: &dyn BlobStore,
    bytes: &[u8],
    request: &CloneRequest,
) -> Result<CloneOutcome> {
    let source = SourceGraph::from_bundle(StarterBundle::from_slice(bytes)?);
    SiteCloner::new(store, blobs).clone_site(&source, request).await
}
