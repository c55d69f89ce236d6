// ============================================================================
// Transaction Manager
// ============================================================================

use super::{Change, Transaction, TransactionId};
use crate::core::{CloneError, Record, RecordId, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct TransactionManager {
    // Active transactions and their pending changes.
    transactions: Arc<RwLock<HashMap<TransactionId, Transaction>>>,
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionManager {
    pub fn new() -> Self {
        Self {
            transactions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn begin(&self) -> Result<TransactionId> {
        let transaction_id = TransactionId::new();
        let mut transactions = self.transactions.write().await;
        transactions.insert(transaction_id, Transaction::new(transaction_id));
        Ok(transaction_id)
    }

    pub async fn record_change(&self, txn_id: TransactionId, change: Change) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        let transaction = transactions
            .get_mut(&txn_id)
            .ok_or_else(|| not_found(txn_id))?;
        transaction.record_change(change)
    }

    /// Latest version of a record written by `txn_id`, if any
    pub async fn pending(
        &self,
        txn_id: TransactionId,
        collection: &str,
        id: &RecordId,
    ) -> Result<Option<Record>> {
        let transactions = self.transactions.read().await;
        let transaction = transactions.get(&txn_id).ok_or_else(|| not_found(txn_id))?;
        Ok(transaction.pending(collection, id).cloned())
    }

    /// Finishes `txn_id` and returns the changes the store must apply.
    pub async fn commit(&self, txn_id: TransactionId) -> Result<Vec<Change>> {
        let mut transactions = self.transactions.write().await;
        let transaction = transactions
            .get_mut(&txn_id)
            .ok_or_else(|| not_found(txn_id))?;

        let changes = transaction.commit()?;
        transactions.remove(&txn_id);
        Ok(changes)
    }

    pub async fn rollback(&self, txn_id: TransactionId) -> Result<()> {
        let mut transactions = self.transactions.write().await;

        if let Some(transaction) = transactions.get_mut(&txn_id) {
            transaction.rollback()?;
            transactions.remove(&txn_id);
        }
        Ok(())
    }

    pub async fn active_count(&self) -> usize {
        self.transactions.read().await.len()
    }
}

fn not_found(txn_id: TransactionId) -> CloneError {
    CloneError::Persistence(format!("Transaction {} not found", txn_id))
}
