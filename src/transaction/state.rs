//! Lifecycle of one clone transaction: an ordered list of record writes
//! that is either handed to the store on commit or dropped on rollback.

use super::Change;
use crate::core::{CloneError, Record, RecordId, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TXN_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique transaction handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub u64);

impl TransactionId {
    pub fn new() -> Self {
        TransactionId(NEXT_TXN_ID.fetch_add(1, Ordering::SeqCst))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn_{}", self.0)
    }
}

/// ```text
/// Active ──commit──> Committed
///   │
///   └──rollback──> Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Committed,
    Aborted,
}

impl TransactionState {
    pub fn is_active(&self) -> bool {
        matches!(self, TransactionState::Active)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransactionState::Active => "ACTIVE",
            TransactionState::Committed => "COMMITTED",
            TransactionState::Aborted => "ABORTED",
        })
    }
}

#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    state: TransactionState,
    /// Record writes in the order they were made
    changes: Vec<Change>,
    /// `(collection, id)` -> position of the newest write to that record
    latest: HashMap<(String, RecordId), usize>,
}

impl Transaction {
    pub fn new(id: TransactionId) -> Self {
        Self {
            id,
            state: TransactionState::Active,
            changes: Vec::new(),
            latest: HashMap::new(),
        }
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn change_count(&self) -> usize {
        self.changes.len()
    }

    /// Newest version of `collection/id` written by this transaction
    pub fn pending(&self, collection: &str, id: &RecordId) -> Option<&Record> {
        let position = self.latest.get(&(collection.to_string(), id.clone()))?;
        self.changes.get(*position).map(Change::current)
    }

    pub fn record_change(&mut self, change: Change) -> Result<()> {
        self.ensure_active("record a write in")?;
        let key = (change.collection().to_string(), change.record_id().clone());
        self.latest.insert(key, self.changes.len());
        self.changes.push(change);
        Ok(())
    }

    /// Closes the transaction and hands its writes to the caller, in order
    pub fn commit(&mut self) -> Result<Vec<Change>> {
        self.ensure_active("commit")?;
        self.state = TransactionState::Committed;
        self.latest.clear();
        Ok(std::mem::take(&mut self.changes))
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.ensure_active("roll back")?;
        self.changes.clear();
        self.latest.clear();
        self.state = TransactionState::Aborted;
        Ok(())
    }

    fn ensure_active(&self, action: &str) -> Result<()> {
        if self.state.is_active() {
            return Ok(());
        }
        Err(CloneError::Persistence(format!(
            "cannot {} transaction {}: it is {}",
            action, self.id, self.state
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FieldMap;
    use serde_json::json;

    fn record(collection: &str, id: &str, slug: &str) -> Record {
        let mut fields = FieldMap::new();
        fields.insert("slug".into(), json!(slug));
        Record::new(collection, RecordId::from(id), fields)
    }

    fn page(id: &str) -> Change {
        Change::CreateRecord {
            record: record("pages", id, ""),
        }
    }

    #[test]
    fn test_transaction_id_generation() {
        let id1 = TransactionId::new();
        let id2 = TransactionId::new();
        assert!(id2.as_u64() > id1.as_u64());
    }

    #[test]
    fn test_transaction_lifecycle() {
        let mut txn = Transaction::new(TransactionId::new());
        assert!(txn.state().is_active());

        txn.record_change(page("PG1")).unwrap();
        let changes = txn.commit().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(txn.state(), TransactionState::Committed);
        assert!(txn.pending("pages", &RecordId::from("PG1")).is_none());
    }

    #[test]
    fn test_closed_transaction_rejects_everything() {
        let mut txn = Transaction::new(TransactionId::new());
        txn.rollback().unwrap();

        assert!(txn.commit().is_err());
        assert!(txn.rollback().is_err());
        let err = txn.record_change(page("PG1")).unwrap_err();
        assert!(err.to_string().contains("it is ABORTED"));
    }

    #[test]
    fn test_rollback_clears_changes() {
        let mut txn = Transaction::new(TransactionId::new());

        txn.record_change(page("PG1")).unwrap();
        assert_eq!(txn.change_count(), 1);

        txn.rollback().unwrap();
        assert_eq!(txn.change_count(), 0);
        assert_eq!(txn.state(), TransactionState::Aborted);
        assert!(txn.pending("pages", &RecordId::from("PG1")).is_none());
    }

    #[test]
    fn test_pending_returns_latest_version() {
        let mut txn = Transaction::new(TransactionId::new());

        txn.record_change(page("PG1")).unwrap();
        txn.record_change(page("PG2")).unwrap();
        txn.record_change(Change::UpdateRecord {
            record: record("pages", "PG1", "home"),
        })
        .unwrap();

        let pending = txn.pending("pages", &RecordId::from("PG1")).unwrap();
        assert_eq!(pending.get_str("slug"), Some("home"));
        let untouched = txn.pending("pages", &RecordId::from("PG2")).unwrap();
        assert_eq!(untouched.get_str("slug"), None);
        assert!(txn.pending("pages", &RecordId::from("PG3")).is_none());
    }

    #[test]
    fn test_pending_is_keyed_by_collection() {
        let mut txn = Transaction::new(TransactionId::new());
        txn.record_change(page("X1")).unwrap();
        txn.record_change(Change::CreateRecord {
            record: record("page_types", "X1", "post"),
        })
        .unwrap();

        let page = txn.pending("pages", &RecordId::from("X1")).unwrap();
        assert_eq!(page.collection, "pages");
        let page_type = txn.pending("page_types", &RecordId::from("X1")).unwrap();
        assert_eq!(page_type.get_str("slug"), Some("post"));
    }

    #[test]
    fn test_pending_lookup_across_many_writes() {
        let mut txn = Transaction::new(TransactionId::new());
        for i in 0..5_000 {
            txn.record_change(page(&format!("PG{i}"))).unwrap();
        }
        assert_eq!(txn.change_count(), 5_000);
        for i in (0..5_000).step_by(97) {
            let id = RecordId::from(format!("PG{i}"));
            assert_eq!(txn.pending("pages", &id).map(|r| &r.id), Some(&id));
        }
    }
}
