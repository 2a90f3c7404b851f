//! Commands: immutable units of intended remote side effect.
//!
//! Commands are produced by compiling specs and hold only plain data, so they
//! can be logged, serialized or replayed without the builder that made them.

use std::fmt;

use octoacs_store::TokenType;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A compiled reconciliation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Replace a relying party (delete then recreate) and relink rule groups.
    AddRelyingParty(AddRelyingPartyCommand),
    /// Remove a relying party if present.
    RemoveRelyingParty(RemoveRelyingPartyCommand),
    /// Replace a rule group (delete then recreate).
    AddRuleGroup(AddRuleGroupCommand),
    /// Add a rule to an existing rule group.
    AddRule(AddRuleCommand),
    /// Remove a rule group if present.
    RemoveRuleGroup(RemoveRuleGroupCommand),
}

impl Command {
    /// Returns the command kind, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddRelyingParty(_) => "add_relying_party",
            Self::RemoveRelyingParty(_) => "remove_relying_party",
            Self::AddRuleGroup(_) => "add_rule_group",
            Self::AddRule(_) => "add_rule",
            Self::RemoveRuleGroup(_) => "remove_rule_group",
        }
    }

    /// Returns the name of the resource the command targets, if set.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::AddRelyingParty(command) => command.name.as_deref(),
            Self::RemoveRelyingParty(command) => Some(&command.name),
            Self::AddRuleGroup(command) => command.name.as_deref(),
            Self::AddRule(command) => command.rule_group.as_deref(),
            Self::RemoveRuleGroup(command) => Some(&command.name),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind(), self.target().unwrap_or("<unnamed>"))
    }
}

/// Signing certificate material, as plain data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningCertificate {
    pub bytes: Option<Vec<u8>>,
    pub password: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_date: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddRelyingPartyCommand {
    pub name: Option<String>,
    pub realm_address: Option<String>,
    pub reply_address: Option<String>,
    pub symmetric_key: Option<Vec<u8>>,
    pub token_type: TokenType,
    /// Seconds; zero means "use the configured default".
    pub token_lifetime: u32,
    pub encryption_certificate: Option<Vec<u8>>,
    pub signing_certificate: Option<SigningCertificate>,
    pub identity_providers: Vec<String>,
    /// Regular expressions selecting rule groups to link, in order.
    pub rule_group_patterns: Vec<String>,
    pub remove_related_rule_groups: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveRelyingPartyCommand {
    pub name: String,
    pub remove_related_rule_groups: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddRuleGroupCommand {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddRuleCommand {
    pub rule_group: Option<String>,
    pub description: Option<String>,
    pub identity_provider: Option<String>,
    pub input_claim_type: Option<String>,
    pub input_claim_value: Option<String>,
    pub output_claim_type: Option<String>,
    pub output_claim_value: Option<String>,
    pub passthrough: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveRuleGroupCommand {
    pub name: String,
}
