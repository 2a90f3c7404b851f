use crate::command::{Command, RemoveRelyingPartyCommand, RemoveRuleGroupCommand};
use crate::spec::{CompileCommands, RelyingPartySpec, RuleGroupSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    RelyingParty(RelyingPartySpec),
    RuleGroup(RuleGroupSpec),
    RemoveRelyingParty {
        name: String,
        remove_related_rule_groups: bool,
    },
    RemoveRuleGroup(String),
}

/// Top-level declaration of a service namespace.
///
/// Entries compile in declaration order, so a standalone rule group declared
/// before a relying party exists by the time that relying party is linked.
///
/// # Example
///
/// ```
/// use octoacs_core::{CompileCommands, NamespaceSpec};
///
/// let namespace = NamespaceSpec::default()
///     .remove_rule_group("legacy-claims")
///     .rule_group(|group| group.name("shared-claims"))
///     .relying_party(|rp| {
///         rp.name("portal")
///             .realm_address("https://portal.example.com/")
///             .link_to_rule_group("^shared-")
///     });
///
/// assert_eq!(namespace.compile().len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceSpec {
    entries: Vec<Entry>,
}

impl NamespaceSpec {
    /// Declare a relying party, configured by `configure`.
    #[must_use]
    pub fn relying_party(
        mut self,
        configure: impl FnOnce(RelyingPartySpec) -> RelyingPartySpec,
    ) -> Self {
        self.entries
            .push(Entry::RelyingParty(configure(RelyingPartySpec::default())));
        self
    }

    /// Declare a standalone rule group, configured by `configure`.
    #[must_use]
    pub fn rule_group(mut self, configure: impl FnOnce(RuleGroupSpec) -> RuleGroupSpec) -> Self {
        self.entries
            .push(Entry::RuleGroup(configure(RuleGroupSpec::default())));
        self
    }

    /// Remove the rule group named `name`, if present.
    #[must_use]
    pub fn remove_rule_group(mut self, name: impl Into<String>) -> Self {
        self.entries.push(Entry::RemoveRuleGroup(name.into()));
        self
    }

    /// Remove the relying party named `name`, if present, keeping its rule groups.
    #[must_use]
    pub fn remove_relying_party(mut self, name: impl Into<String>) -> Self {
        self.entries.push(Entry::RemoveRelyingParty {
            name: name.into(),
            remove_related_rule_groups: false,
        });
        self
    }

    /// Remove the relying party named `name` and every rule group linked to it.
    #[must_use]
    pub fn remove_relying_party_with_rule_groups(mut self, name: impl Into<String>) -> Self {
        self.entries.push(Entry::RemoveRelyingParty {
            name: name.into(),
            remove_related_rule_groups: true,
        });
        self
    }

    /// Returns `true` if nothing has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CompileCommands for NamespaceSpec {
    fn compile(&self) -> Vec<Command> {
        self.entries
            .iter()
            .flat_map(|entry| match entry {
                Entry::RelyingParty(spec) => spec.compile(),
                Entry::RuleGroup(spec) => spec.compile(),
                Entry::RemoveRelyingParty {
                    name,
                    remove_related_rule_groups,
                } => vec![Command::RemoveRelyingParty(RemoveRelyingPartyCommand {
                    name: name.clone(),
                    remove_related_rule_groups: *remove_related_rule_groups,
                })],
                Entry::RemoveRuleGroup(name) => {
                    vec![Command::RemoveRuleGroup(RemoveRuleGroupCommand {
                        name: name.clone(),
                    })]
                }
            })
            .collect()
    }
}
