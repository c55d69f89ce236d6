use crate::core::{Record, RecordId, Result};
use crate::transaction::TransactionId;
use async_trait::async_trait;

/// Record store trait - the persistence collaborator the clone writes through
///
/// Reads outside a transaction only see committed records. Writes are only
/// accepted inside a transaction and become visible on commit.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Check if a collection exists
    async fn has_collection(&self, collection: &str) -> bool;

    /// Find a committed record by id
    async fn find(&self, collection: &str, id: &RecordId) -> Result<Option<Record>>;

    /// All committed records of a collection, in insertion order
    async fn list(&self, collection: &str) -> Result<Vec<Record>>;

    async fn begin(&self) -> Result<TransactionId>;

    /// Create a record inside `txn`
    async fn create(&self, txn: TransactionId, record: Record) -> Result<()>;

    /// Replace the fields of an existing record inside `txn`
    async fn update(&self, txn: TransactionId, record: Record) -> Result<()>;

    /// Find a record as seen by `txn`, including its own pending writes
    async fn find_in(
        &self,
        txn: TransactionId,
        collection: &str,
        id: &RecordId,
    ) -> Result<Option<Record>>;

    async fn commit(&self, txn: TransactionId) -> Result<()>;

    async fn rollback(&self, txn: TransactionId) -> Result<()>;
}

/// Keyed byte storage for upload files
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn delete(&self, key: &str) -> Result<()>;
}
