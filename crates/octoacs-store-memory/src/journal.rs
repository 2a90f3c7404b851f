//! Write journal and failure injection for the in-memory store.

use octoacs_store::{NewRelyingParty, NewRule, NewRuleGroup, NewRuleGroupLink, ResourceKind};
use uuid::Uuid;

/// Write operations of the store contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    AddRelyingParty,
    RemoveRelyingParty,
    AddRuleGroup,
    AddRule,
    Delete,
    Link,
    SaveChanges,
}

/// One successful write call, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreWrite {
    AddRelyingParty(NewRelyingParty),
    RemoveRelyingParty { id: Uuid },
    AddRuleGroup(NewRuleGroup),
    AddRule(NewRule),
    Delete { kind: ResourceKind, id: Uuid },
    Link(NewRuleGroupLink),
    SaveChanges { committed: usize },
}

impl StoreWrite {
    /// Returns the operation this write performed.
    #[must_use]
    pub fn operation(&self) -> StoreOperation {
        match self {
            Self::AddRelyingParty(_) => StoreOperation::AddRelyingParty,
            Self::RemoveRelyingParty { .. } => StoreOperation::RemoveRelyingParty,
            Self::AddRuleGroup(_) => StoreOperation::AddRuleGroup,
            Self::AddRule(_) => StoreOperation::AddRule,
            Self::Delete { .. } => StoreOperation::Delete,
            Self::Link(_) => StoreOperation::Link,
            Self::SaveChanges { .. } => StoreOperation::SaveChanges,
        }
    }
}
