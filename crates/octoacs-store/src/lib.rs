//! # octoacs-store
//!
//! Management store abstraction for declarative relying party reconciliation.
//!
//! This crate defines the contract a remote management service must satisfy
//! for the reconciliation executor in `octoacs-core`. It does not contain any
//! network client; backends are provided by separate crates
//! (e.g. `octoacs-store-memory`).
//!
//! ## Overview
//!
//! The main trait is [`ManagementStore`], which covers:
//! - lookups by exact name (relying parties, rule groups, keys)
//! - continuation-paged listing of rule groups
//! - immediate-effect creation and removal
//! - queued deletes and links committed by `save_changes`
//!
//! ## Example
//!
//! ```ignore
//! use futures_util::TryStreamExt;
//! use octoacs_store::{ManagementStore, StoreResult, rule_groups};
//!
//! async fn names(store: &dyn ManagementStore) -> StoreResult<Vec<String>> {
//!     rule_groups(store).map_ok(|group| group.name).try_collect().await
//! }
//! ```

mod error;
mod paging;
mod traits;
mod types;

pub use error::{ErrorCategory, StoreError};
pub use paging::rule_groups;
pub use traits::ManagementStore;
pub use types::{
    ContinuationToken, KeyType, KeyUsage, NewRelyingParty, NewRule, NewRuleGroup,
    NewRuleGroupLink, Page, RelyingParty, RelyingPartyKey, ResourceKind, Rule, RuleGroup,
    RuleGroupLink, TokenType,
};

/// Type alias for a store result.
pub type StoreResult<T> = Result<T, StoreError>;

/// Type alias for a shareable store trait object.
pub type DynStore = std::sync::Arc<dyn ManagementStore>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use octoacs_store::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ErrorCategory, StoreError};
    pub use crate::paging::rule_groups;
    pub use crate::traits::ManagementStore;
    pub use crate::types::{
        ContinuationToken, KeyType, KeyUsage, NewRelyingParty, NewRule, NewRuleGroup,
        NewRuleGroupLink, Page, RelyingParty, RelyingPartyKey, ResourceKind, Rule, RuleGroup,
        RuleGroupLink, TokenType,
    };
    pub use crate::{DynStore, StoreResult};
}
