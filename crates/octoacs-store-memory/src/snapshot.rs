//! Identity-free views of the store contents.
//!
//! Recreated resources get fresh identities, so two snapshots compare equal
//! when names, fields, key names and link names match.

use octoacs_store::TokenType;
use serde::Serialize;

/// Every relying party and rule group, sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreSnapshot {
    pub relying_parties: Vec<RelyingPartySnapshot>,
    pub rule_groups: Vec<RuleGroupSnapshot>,
}

impl StoreSnapshot {
    /// Returns the relying parties named `name`.
    pub fn relying_parties_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a RelyingPartySnapshot> + 'a {
        self.relying_parties.iter().filter(move |rp| rp.name == name)
    }

    /// Returns the rule group named `name`, if any.
    #[must_use]
    pub fn rule_group(&self, name: &str) -> Option<&RuleGroupSnapshot> {
        self.rule_groups.iter().find(|group| group.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelyingPartySnapshot {
    pub name: String,
    pub realm_address: String,
    pub reply_address: Option<String>,
    pub token_type: TokenType,
    pub token_lifetime: u32,
    pub identity_providers: Vec<String>,
    /// Linked rule group names, sorted.
    pub rule_groups: Vec<String>,
    /// Key display names, sorted.
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleGroupSnapshot {
    pub name: String,
    /// `input type -> output type` per rule, sorted.
    pub rules: Vec<String>,
}
