use super::RecordStore;
use crate::core::{CloneError, Record, RecordId, Result};
use crate::schema::SchemaCatalog;
use crate::transaction::{Change, TransactionId, TransactionManager};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Committed records of one collection, kept in insertion order
#[derive(Debug, Clone, Default)]
pub struct Collection {
    records: Vec<Record>,
    index: HashMap<RecordId, usize>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    fn insert(&mut self, record: Record) -> Result<()> {
        if self.contains(&record.id) {
            return Err(CloneError::Persistence(format!(
                "Record '{}' already exists in '{}'",
                record.id, record.collection
            )));
        }
        self.index.insert(record.id.clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    fn replace(&mut self, record: Record) -> Result<()> {
        let pos = *self
            .index
            .get(&record.id)
            .ok_or_else(|| CloneError::RecordNotFound {
                collection: record.collection.clone(),
                id: record.id.to_string(),
            })?;
        self.records[pos] = record;
        Ok(())
    }
}

/// In-memory transactional record store
///
/// Pending writes live in the transaction manager until commit, so readers
/// outside the transaction never observe a partially applied clone.
pub struct InMemoryStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
    transactions: TransactionManager,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            transactions: TransactionManager::new(),
        }
    }

    /// A store that knows every collection in the site schema table
    pub fn with_site_schema() -> Self {
        let catalog = SchemaCatalog::new();
        let mut collections = HashMap::new();
        for name in catalog.names() {
            collections.insert(name.to_string(), Collection::new());
        }
        Self {
            collections: Arc::new(RwLock::new(collections)),
            transactions: TransactionManager::new(),
        }
    }

    pub async fn create_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            return Err(CloneError::Persistence(format!(
                "Collection '{}' already exists",
                name
            )));
        }
        collections.insert(name.to_string(), Collection::new());
        Ok(())
    }

    /// Insert a committed record directly, outside any transaction
    pub async fn insert(&self, record: Record) -> Result<()> {
        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(&record.collection)
            .ok_or_else(|| CloneError::MissingCollectionSchema(record.collection.clone()))?;
        collection.insert(record)
    }

    /// Number of committed records in a collection
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(Collection::len)
            .unwrap_or(0)
    }

    /// Total number of committed records
    pub async fn total_records(&self) -> usize {
        self.collections
            .read()
            .await
            .values()
            .map(Collection::len)
            .sum()
    }

    pub fn transactions(&self) -> &TransactionManager {
        &self.transactions
    }

    async fn exists_for(&self, txn: TransactionId, collection: &str, id: &RecordId) -> Result<bool> {
        if self.transactions.pending(txn, collection, id).await?.is_some() {
            return Ok(true);
        }
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .is_some_and(|c| c.contains(id)))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn has_collection(&self, collection: &str) -> bool {
        self.collections.read().await.contains_key(collection)
    }

    async fn find(&self, collection: &str, id: &RecordId) -> Result<Option<Record>> {
        let collections = self.collections.read().await;
        let records = collections
            .get(collection)
            .ok_or_else(|| CloneError::MissingCollectionSchema(collection.to_string()))?;
        Ok(records.get(id).cloned())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Record>> {
        let collections = self.collections.read().await;
        let records = collections
            .get(collection)
            .ok_or_else(|| CloneError::MissingCollectionSchema(collection.to_string()))?;
        Ok(records.records().to_vec())
    }

    async fn begin(&self) -> Result<TransactionId> {
        self.transactions.begin().await
    }

    async fn create(&self, txn: TransactionId, record: Record) -> Result<()> {
        if !self.has_collection(&record.collection).await {
            return Err(CloneError::MissingCollectionSchema(record.collection.clone()));
        }
        if self.exists_for(txn, &record.collection, &record.id).await? {
            return Err(CloneError::Persistence(format!(
                "Record '{}' already exists in '{}'",
                record.id, record.collection
            )));
        }
        self.transactions
            .record_change(txn, Change::CreateRecord { record })
            .await
    }

    async fn update(&self, txn: TransactionId, record: Record) -> Result<()> {
        if !self.exists_for(txn, &record.collection, &record.id).await? {
            return Err(CloneError::RecordNotFound {
                collection: record.collection.clone(),
                id: record.id.to_string(),
            });
        }
        self.transactions
            .record_change(txn, Change::UpdateRecord { record })
            .await
    }

    async fn find_in(
        &self,
        txn: TransactionId,
        collection: &str,
        id: &RecordId,
    ) -> Result<Option<Record>> {
        if let Some(record) = self.transactions.pending(txn, collection, id).await? {
            return Ok(Some(record));
        }
        self.find(collection, id).await
    }

    async fn commit(&self, txn: TransactionId) -> Result<()> {
        let changes = self.transactions.commit(txn).await?;

        let mut collections = self.collections.write().await;
        // Apply against a copy so a failing change leaves committed state untouched.
        let mut staged = collections.clone();
        for change in changes {
            let collection = staged
                .get_mut(change.collection())
                .ok_or_else(|| CloneError::MissingCollectionSchema(change.collection().to_string()))?;
            match change {
                Change::CreateRecord { record } => collection.insert(record)?,
                Change::UpdateRecord { record } => collection.replace(record)?,
            }
        }
        *collections = staged;
        Ok(())
    }

    async fn rollback(&self, txn: TransactionId) -> Result<()> {
        self.transactions.rollback(txn).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FieldMap;
    use serde_json::json;

    fn page(id: &str, name: &str) -> Record {
        let mut fields = FieldMap::new();
        fields.insert("name".into(), json!(name));
        Record::new("pages", RecordId::from(id), fields)
    }

    #[tokio::test]
    async fn test_pending_writes_are_invisible_until_commit() {
        let store = InMemoryStore::with_site_schema();
        let txn = store.begin().await.unwrap();
        store.create(txn, page("PG1", "Home")).await.unwrap();

        assert!(store.find("pages", &RecordId::from("PG1")).await.unwrap().is_none());
        assert!(store
            .find_in(txn, "pages", &RecordId::from("PG1"))
            .await
            .unwrap()
            .is_some());

        store.commit(txn).await.unwrap();
        assert_eq!(store.count("pages").await, 1);
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let store = InMemoryStore::with_site_schema();
        let txn = store.begin().await.unwrap();
        store.create(txn, page("PG1", "Home")).await.unwrap();
        store.rollback(txn).await.unwrap();

        assert_eq!(store.total_records().await, 0);
    }

    #[tokio::test]
    async fn test_update_inside_transaction() {
        let store = InMemoryStore::with_site_schema();
        store.insert(page("PG1", "Home")).await.unwrap();

        let txn = store.begin().await.unwrap();
        store.update(txn, page("PG1", "Start")).await.unwrap();
        store.commit(txn).await.unwrap();

        let found = store.find("pages", &RecordId::from("PG1")).await.unwrap().unwrap();
        assert_eq!(found.get_str("name"), Some("Start"));
    }

    #[tokio::test]
    async fn test_write_errors() {
        let store = InMemoryStore::with_site_schema();
        store.insert(page("PG1", "Home")).await.unwrap();
        let txn = store.begin().await.unwrap();

        assert!(matches!(
            store.create(txn, page("PG1", "Again")).await,
            Err(CloneError::Persistence(_))
        ));
        assert!(matches!(
            store.update(txn, page("PG9", "Missing")).await,
            Err(CloneError::RecordNotFound { .. })
        ));
        let widget = Record::new("widgets", RecordId::from("W1"), FieldMap::new());
        assert!(matches!(
            store.create(txn, widget).await,
            Err(CloneError::MissingCollectionSchema(_))
        ));
    }
}
