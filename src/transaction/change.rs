// ============================================================================
// Transaction Change Tracking
// ============================================================================
//
// Each Change is a record write recorded during a transaction. The store
// applies the list in order on COMMIT and drops it on ROLLBACK.
//
// ============================================================================

use crate::core::{Record, RecordId};

/// A single pending write in a transaction
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Create a new record
    CreateRecord { record: Record },

    /// Replace the fields of an existing record
    UpdateRecord { record: Record },
}

impl Change {
    /// Get the collection affected by this change
    pub fn collection(&self) -> &str {
        &self.current().collection
    }

    pub fn record_id(&self) -> &RecordId {
        &self.current().id
    }

    /// The record as it will look after this change is applied
    pub fn current(&self) -> &Record {
        match self {
            Change::CreateRecord { record } | Change::UpdateRecord { record } => record,
        }
    }
}
