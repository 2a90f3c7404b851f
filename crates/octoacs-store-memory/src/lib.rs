//! In-memory management store backend for octoacs.
//!
//! This crate provides an in-memory implementation of the `ManagementStore`
//! trait from `octoacs-store`, using papaya lock-free HashMaps for committed
//! state and a queue for batched changes.
//!
//! # Example
//!
//! ```ignore
//! use octoacs_store::{ManagementStore, NewRuleGroup};
//! use octoacs_store_memory::InMemoryStore;
//!
//! let store = InMemoryStore::with_page_size(10);
//! store.add_rule_group(&NewRuleGroup { name: "claims".into() }).await?;
//! assert!(store.snapshot().rule_group("claims").is_some());
//! ```

pub mod journal;
pub mod snapshot;
pub mod storage;

pub use journal::{StoreOperation, StoreWrite};
pub use snapshot::{RelyingPartySnapshot, RuleGroupSnapshot, StoreSnapshot};
pub use storage::{DEFAULT_PAGE_SIZE, InMemoryStore, MemoryStoreOptions};

// Re-export the ManagementStore trait for convenience
pub use octoacs_store::{ManagementStore, StoreError};

/// Creates a new in-memory store behind a shareable handle.
pub fn create_store() -> octoacs_store::DynStore {
    std::sync::Arc::new(InMemoryStore::new())
}
