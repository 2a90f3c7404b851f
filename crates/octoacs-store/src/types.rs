//! Resource types for the management store abstraction.
//!
//! Read views (`RelyingParty`, `RuleGroup`, ...) describe what the store
//! currently holds. `New*` structs carry the plain fields of a write.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// Kinds and enums
// =============================================================================

/// The kinds of resources held by a management store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// A registered consumer of issued tokens.
    RelyingParty,
    /// A named collection of claim rules.
    RuleGroup,
    /// A claim rule inside a rule group.
    Rule,
    /// A key or certificate attached to a relying party.
    RelyingPartyKey,
    /// The association between a relying party and a rule group.
    RuleGroupLink,
}

impl ResourceKind {
    /// Returns the resource kind name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RelyingParty => "RelyingParty",
            Self::RuleGroup => "RuleGroup",
            Self::Rule => "Rule",
            Self::RelyingPartyKey => "RelyingPartyKey",
            Self::RuleGroupLink => "RuleGroupLink",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Token formats a relying party can be issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    /// SAML 2.0 assertion.
    #[default]
    #[serde(rename = "SAML_2_0")]
    Saml2,
    /// Simple Web Token.
    #[serde(rename = "SWT")]
    Swt,
}

impl TokenType {
    /// Returns the wire name of the token type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Saml2 => "SAML_2_0",
            Self::Swt => "SWT",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a relying party key is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyUsage {
    /// Signs issued tokens.
    Signing,
    /// Encrypts issued tokens.
    Encrypting,
}

/// The material kind of a relying party key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
    /// Shared secret bytes.
    Symmetric,
    /// An X.509 certificate (optionally with its private key).
    X509Certificate,
}

// =============================================================================
// Read views
// =============================================================================

/// A relying party as currently held by the store, with its links and keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelyingParty {
    /// Store identity.
    pub id: Uuid,
    /// Unique name.
    pub name: String,
    /// Realm (audience) address.
    pub realm_address: String,
    /// Address tokens are posted back to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_address: Option<String>,
    /// Issued token format.
    pub token_type: TokenType,
    /// Token lifetime in seconds.
    pub token_lifetime: u32,
    /// Identity providers allowed to authenticate users for this party.
    #[serde(default)]
    pub identity_providers: Vec<String>,
    /// Links to rule groups.
    #[serde(default)]
    pub rule_groups: Vec<RuleGroupLink>,
    /// Attached keys.
    #[serde(default)]
    pub keys: Vec<RelyingPartyKey>,
}

/// A link between a relying party and a rule group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleGroupLink {
    /// Store identity of the link itself.
    pub id: Uuid,
    /// Linked relying party.
    pub relying_party_id: Uuid,
    /// Linked rule group.
    pub rule_group_id: Uuid,
    /// Name of the linked rule group at read time.
    pub rule_group_name: String,
}

/// A key or certificate attached to a relying party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelyingPartyKey {
    /// Store identity.
    pub id: Uuid,
    /// Owning relying party.
    pub relying_party_id: Uuid,
    /// Display name, used to look the key up.
    pub display_name: String,
    /// Material kind.
    pub key_type: KeyType,
    /// Usage.
    pub usage: KeyUsage,
    /// Start of the validity window.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    /// End of the validity window.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_date: Option<OffsetDateTime>,
}

/// A rule group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleGroup {
    /// Store identity.
    pub id: Uuid,
    /// Name.
    pub name: String,
}

/// A claim rule inside a rule group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Store identity.
    pub id: Uuid,
    /// Owning rule group.
    pub rule_group_id: Uuid,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Issuer the input claim must come from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_provider: Option<String>,
    /// Claim type matched on input.
    pub input_claim_type: String,
    /// Claim value matched on input; `None` matches any value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_claim_value: Option<String>,
    /// Claim type emitted; `None` keeps the input type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_claim_type: Option<String>,
    /// Claim value emitted; `None` keeps the input value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_claim_value: Option<String>,
    /// Copy the input claim through unchanged.
    pub passthrough: bool,
}

// =============================================================================
// Writes
// =============================================================================

/// Fields for creating a relying party.
///
/// The signing certificate travels as four independent fields; all four are
/// `None` when no signing certificate is configured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewRelyingParty {
    /// Unique name.
    pub name: String,
    /// Realm (audience) address.
    pub realm_address: String,
    /// Address tokens are posted back to.
    pub reply_address: Option<String>,
    /// Symmetric signing key.
    pub symmetric_key: Option<Vec<u8>>,
    /// Issued token format.
    pub token_type: TokenType,
    /// Token lifetime in seconds, already resolved against the default.
    pub token_lifetime: u32,
    /// Signing certificate bytes.
    pub signing_certificate: Option<Vec<u8>>,
    /// Signing certificate password.
    pub signing_certificate_password: Option<String>,
    /// Signing certificate validity start.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub signing_certificate_start: Option<OffsetDateTime>,
    /// Signing certificate validity end.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub signing_certificate_end: Option<OffsetDateTime>,
    /// Encryption certificate bytes.
    pub encryption_certificate: Option<Vec<u8>>,
    /// Allowed identity providers, in declaration order.
    pub identity_providers: Vec<String>,
}

/// Fields for creating a rule group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRuleGroup {
    /// Name.
    pub name: String,
}

/// Fields for creating a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRule {
    /// Owning rule group.
    pub rule_group_id: Uuid,
    /// Human-readable description.
    pub description: Option<String>,
    /// Issuer the input claim must come from.
    pub identity_provider: Option<String>,
    /// Claim type matched on input.
    pub input_claim_type: String,
    /// Claim value matched on input.
    pub input_claim_value: Option<String>,
    /// Claim type emitted.
    pub output_claim_type: Option<String>,
    /// Claim value emitted.
    pub output_claim_value: Option<String>,
    /// Copy the input claim through unchanged.
    pub passthrough: bool,
}

/// Fields for linking a relying party to a rule group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRuleGroupLink {
    /// Relying party handle, freshly resolved by name.
    pub relying_party_id: Uuid,
    /// Rule group to link.
    pub rule_group_id: Uuid,
}

// =============================================================================
// Paging
// =============================================================================

/// Opaque continuation handle returned by paged listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    /// Wraps a backend-specific continuation value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the backend-specific continuation value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Handle for the next page; `None` on the last page.
    pub continuation: Option<ContinuationToken>,
}

impl<T> Page<T> {
    /// Creates the final page of a listing.
    #[must_use]
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            continuation: None,
        }
    }

    /// Returns `true` if more pages follow.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.continuation.is_some()
    }
}
