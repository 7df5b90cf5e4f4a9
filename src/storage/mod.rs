//! storage layer for revdb
//!
//! this module is the persistence gateway: everything above it reads and
//! writes branches, revisions, table versions and row versions through the
//! [`GatewayRead`] / [`Gateway`] traits and never touches the store directly.
//!
//!  # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Gateway / GatewayRead                     │
//! │    (records + revision↔table and table↔row relations)       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!  ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!  │ MemoryStore │       │   StoreTx   │       │  snapshot   │
//!  │   (state)   │       │  (journal)  │       │   (disk)    │
//!  └─────────────┘       └─────────────┘       └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use revdb::storage::{MemoryStore, Gateway, GatewayRead, TableRecord, TableId};
//!
//! let store = MemoryStore::new();
//! let mut tx = store.begin();
//! let table = TableRecord::new(TableId::new("users")?, false);
//! tx.create_table(table)?;
//! tx.commit()?;   // or drop `tx` to roll back
//! ```

mod error;
mod gateway;
mod hash;
mod memory;
mod records;
mod snapshot;
mod types;

// Re-export public API
pub use error::{StorageError, StorageResult};
pub use gateway::{Gateway, GatewayRead};
pub use hash::hash_value;
pub use memory::{MemoryStore, StoreState, StoreTx};
pub use records::{BranchRecord, RevisionRecord, RowRecord, TableRecord};
pub use types::{
    validate_identifier, BranchId, CreatedId, InvalidIdError, RevisionId, RevisionRole, RowId,
    TableId, VersionId, MAX_ID_LENGTH,
};
