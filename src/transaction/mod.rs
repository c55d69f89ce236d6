// ============================================================================
// Transaction Management Module
// ============================================================================
//
// Pending record writes are held per transaction and only become visible to
// other readers once the owning store applies them on commit.
//
// Design Patterns Used:
// - State Pattern: Transaction state management (Active, Committed, Aborted)
// - Command Pattern: Recorded changes applied on COMMIT, discarded on ROLLBACK
//
// ============================================================================

pub mod change;
pub mod manager;
pub mod state;

pub use change::Change;
pub use manager::TransactionManager;
pub use state::{Transaction, TransactionId, TransactionState};
