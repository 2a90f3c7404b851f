//! Read-only questions about the store.
//!
//! These helpers never write. They are used to verify the outcome of a run,
//! e.g. in deployment smoke tests.

use octoacs_store::{ManagementStore, Rule, StoreResult};

/// Returns `true` if at least one relying party is named `name`.
pub async fn relying_party_exists(store: &dyn ManagementStore, name: &str) -> StoreResult<bool> {
    Ok(!store.find_relying_parties(name).await?.is_empty())
}

/// Returns `true` if at least one rule group is named `name`.
pub async fn rule_group_exists(store: &dyn ManagementStore, name: &str) -> StoreResult<bool> {
    Ok(!store.find_rule_groups(name).await?.is_empty())
}

/// Returns `true` if a relying party named `relying_party` is linked to a
/// rule group named `rule_group`.
pub async fn is_linked(
    store: &dyn ManagementStore,
    relying_party: &str,
    rule_group: &str,
) -> StoreResult<bool> {
    Ok(store
        .find_relying_parties(relying_party)
        .await?
        .iter()
        .flat_map(|rp| &rp.rule_groups)
        .any(|link| link.rule_group_name == rule_group))
}

/// Returns the rules of every rule group named `rule_group`.
pub async fn rules(store: &dyn ManagementStore, rule_group: &str) -> StoreResult<Vec<Rule>> {
    let mut rules = Vec::new();
    for group in store.find_rule_groups(rule_group).await? {
        rules.extend(store.rules(group.id).await?);
    }
    Ok(rules)
}

/// Returns `true` if the rule group holds a rule with this description.
pub async fn has_rule_described(
    store: &dyn ManagementStore,
    rule_group: &str,
    description: &str,
) -> StoreResult<bool> {
    Ok(rules(store, rule_group)
        .await?
        .iter()
        .any(|rule| rule.description.as_deref() == Some(description)))
}

/// Returns how many keys the relying parties named `relying_party` hold.
pub async fn key_count(store: &dyn ManagementStore, relying_party: &str) -> StoreResult<usize> {
    Ok(store
        .find_relying_parties(relying_party)
        .await?
        .iter()
        .map(|rp| rp.keys.len())
        .sum())
}
