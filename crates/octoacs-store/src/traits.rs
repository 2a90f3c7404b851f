//! Management store trait.
//!
//! This module defines the contract every management store backend must
//! implement. Writes come in two flavours:
//!
//! - immediate-effect writes (`add_*`, `remove_relying_party`) commit on their
//!   own;
//! - queued writes (`delete`, `link`) are held until `save_changes` commits
//!   them as a single batch.

use async_trait::async_trait;
use uuid::Uuid;

use crate::StoreResult;
use crate::types::{
    ContinuationToken, NewRelyingParty, NewRule, NewRuleGroup, NewRuleGroupLink, Page,
    RelyingParty, RelyingPartyKey, ResourceKind, Rule, RuleGroup,
};

/// The remote resource store reconciliation runs against.
///
/// Implementations must be thread-safe (`Send + Sync`). Lookups by name use
/// exact equality and may return any number of matches; callers decide what
/// a duplicate means.
///
/// # Example
///
/// ```ignore
/// use octoacs_store::{ManagementStore, StoreResult};
///
/// async fn exists(store: &dyn ManagementStore, name: &str) -> StoreResult<bool> {
///     Ok(!store.find_relying_parties(name).await?.is_empty())
/// }
/// ```
#[async_trait]
pub trait ManagementStore: Send + Sync {
    // ==================== Lookups ====================

    /// Finds relying parties whose name equals `name`.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing resources.
    async fn find_relying_parties(&self, name: &str) -> StoreResult<Vec<RelyingParty>>;

    /// Finds rule groups whose name equals `name`.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues.
    async fn find_rule_groups(&self, name: &str) -> StoreResult<Vec<RuleGroup>>;

    /// Finds relying party keys whose display name equals `display_name`.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues.
    async fn find_keys(&self, display_name: &str) -> StoreResult<Vec<RelyingPartyKey>>;

    /// Lists the rules of a rule group.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues.
    async fn rules(&self, rule_group_id: Uuid) -> StoreResult<Vec<Rule>>;

    /// Returns one page of the full rule group collection.
    ///
    /// Pass `None` for the first page and the returned continuation for every
    /// following page. See [`crate::rule_groups`] for a stream over all pages.
    ///
    /// # Errors
    ///
    /// Returns an error for infrastructure issues or a stale continuation.
    async fn list_rule_groups(
        &self,
        continuation: Option<&ContinuationToken>,
    ) -> StoreResult<Page<RuleGroup>>;

    // ==================== Immediate-effect writes ====================

    /// Creates a relying party together with the keys described by its fields.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the name is taken.
    async fn add_relying_party(&self, relying_party: &NewRelyingParty) -> StoreResult<Uuid>;

    /// Removes a relying party, its keys and its rule group links.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the relying party does not exist.
    async fn remove_relying_party(&self, id: Uuid) -> StoreResult<()>;

    /// Creates a rule group.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the name is taken.
    async fn add_rule_group(&self, rule_group: &NewRuleGroup) -> StoreResult<Uuid>;

    /// Creates a rule inside an existing rule group.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the rule group does not exist.
    async fn add_rule(&self, rule: &NewRule) -> StoreResult<Uuid>;

    // ==================== Queued writes ====================

    /// Queues deletion of a resource until the next `save_changes`.
    ///
    /// Deleting a rule group cascades to its rules and links.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion cannot be queued.
    async fn delete(&self, kind: ResourceKind, id: Uuid) -> StoreResult<()>;

    /// Queues a relying party to rule group link until the next `save_changes`.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be queued.
    async fn link(&self, link: &NewRuleGroupLink) -> StoreResult<()>;

    /// Commits every queued write as one batch.
    ///
    /// Returns the number of changes committed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Batch` if any queued change is rejected.
    async fn save_changes(&self) -> StoreResult<usize>;

    // ==================== Metadata ====================

    /// Returns the name of this store backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}
