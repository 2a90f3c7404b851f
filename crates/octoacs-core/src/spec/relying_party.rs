//! Relying party spec.

use octoacs_store::TokenType;

use crate::command::{AddRelyingPartyCommand, Command};
use crate::spec::{CompileCommands, RuleGroupSpec, SigningCertificateSpec};

/// Desired state of one relying party.
///
/// Every method consumes the spec and returns the updated value. Nothing is
/// validated here; a missing name or realm address surfaces when the compiled
/// command executes.
///
/// # Example
///
/// ```
/// use octoacs_core::{CompileCommands, RelyingPartySpec};
///
/// let spec = RelyingPartySpec::default()
///     .name("portal")
///     .realm_address("https://portal.example.com/")
///     .swt_token()
///     .allow_identity_provider("Windows Live ID")
///     .link_to_rule_group("^portal-.*")
///     .rule_group(|group| {
///         group
///             .name("portal-claims")
///             .rule(|rule| rule.input_claim_type("email").passthrough())
///     });
///
/// // rule group, its rule, then the relying party itself
/// assert_eq!(spec.compile().len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelyingPartySpec {
    name: Option<String>,
    realm_address: Option<String>,
    reply_address: Option<String>,
    symmetric_key: Option<Vec<u8>>,
    token_type: TokenType,
    token_lifetime: u32,
    encryption_certificate: Option<Vec<u8>>,
    signing_certificate: Option<SigningCertificateSpec>,
    allowed_identity_providers: Vec<String>,
    linked_rule_groups: Vec<String>,
    remove_related_rule_groups: bool,
    rule_groups: Vec<RuleGroupSpec>,
}

impl RelyingPartySpec {
    /// Set the unique relying party name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the realm (audience) address.
    #[must_use]
    pub fn realm_address(mut self, realm_address: impl Into<String>) -> Self {
        self.realm_address = Some(realm_address.into());
        self
    }

    /// Set the address tokens are posted back to.
    #[must_use]
    pub fn reply_address(mut self, reply_address: impl Into<String>) -> Self {
        self.reply_address = Some(reply_address.into());
        self
    }

    /// Set the symmetric signing key.
    #[must_use]
    pub fn symmetric_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.symmetric_key = Some(key.into());
        self
    }

    /// Issue SAML 2.0 tokens (the default).
    #[must_use]
    pub fn saml_token(self) -> Self {
        self.token_type(TokenType::Saml2)
    }

    /// Issue Simple Web Tokens.
    #[must_use]
    pub fn swt_token(self) -> Self {
        self.token_type(TokenType::Swt)
    }

    /// Set the issued token type.
    #[must_use]
    pub fn token_type(mut self, token_type: TokenType) -> Self {
        self.token_type = token_type;
        self
    }

    /// Set the token lifetime in seconds. Zero selects the default lifetime.
    #[must_use]
    pub fn token_lifetime(mut self, seconds: u32) -> Self {
        self.token_lifetime = seconds;
        self
    }

    /// Set the certificate used to encrypt issued tokens.
    #[must_use]
    pub fn encryption_certificate(mut self, certificate: impl Into<Vec<u8>>) -> Self {
        self.encryption_certificate = Some(certificate.into());
        self
    }

    /// Set the signing certificate, configured by `configure`.
    #[must_use]
    pub fn signing_certificate(
        mut self,
        configure: impl FnOnce(SigningCertificateSpec) -> SigningCertificateSpec,
    ) -> Self {
        self.signing_certificate = Some(configure(SigningCertificateSpec::default()));
        self
    }

    /// Allow an identity provider. Repeats are ignored.
    #[must_use]
    pub fn allow_identity_provider(mut self, identity_provider: impl Into<String>) -> Self {
        let identity_provider = identity_provider.into();
        if !self.allowed_identity_providers.contains(&identity_provider) {
            self.allowed_identity_providers.push(identity_provider);
        }
        self
    }

    /// Link every existing rule group whose name matches `pattern` (a regex).
    #[must_use]
    pub fn link_to_rule_group(mut self, pattern: impl Into<String>) -> Self {
        self.linked_rule_groups.push(pattern.into());
        self
    }

    /// Delete the rule groups linked to a replaced relying party.
    #[must_use]
    pub fn remove_related_rule_groups(mut self) -> Self {
        self.remove_related_rule_groups = true;
        self
    }

    /// Declare a rule group, configured by `configure`, created ahead of this
    /// relying party and linked to it.
    #[must_use]
    pub fn rule_group(mut self, configure: impl FnOnce(RuleGroupSpec) -> RuleGroupSpec) -> Self {
        self.rule_groups.push(configure(RuleGroupSpec::default()));
        self
    }

    /// Explicit patterns first, then an exact-match pattern per inline rule
    /// group not already requested verbatim.
    fn rule_group_patterns(&self) -> Vec<String> {
        let mut patterns = self.linked_rule_groups.clone();
        for name in self
            .rule_groups
            .iter()
            .filter_map(RuleGroupSpec::configured_name)
        {
            let exact = format!("^{}$", regex::escape(name));
            if !patterns.contains(&exact) {
                patterns.push(exact);
            }
        }
        patterns
    }

    fn to_command(&self) -> AddRelyingPartyCommand {
        AddRelyingPartyCommand {
            name: self.name.clone(),
            realm_address: self.realm_address.clone(),
            reply_address: self.reply_address.clone(),
            symmetric_key: self.symmetric_key.clone(),
            token_type: self.token_type,
            token_lifetime: self.token_lifetime,
            encryption_certificate: self.encryption_certificate.clone(),
            signing_certificate: self
                .signing_certificate
                .as_ref()
                .map(SigningCertificateSpec::to_certificate),
            identity_providers: self.allowed_identity_providers.clone(),
            rule_group_patterns: self.rule_group_patterns(),
            remove_related_rule_groups: self.remove_related_rule_groups,
        }
    }
}

impl CompileCommands for RelyingPartySpec {
    fn compile(&self) -> Vec<Command> {
        let mut commands: Vec<Command> = self
            .rule_groups
            .iter()
            .flat_map(RuleGroupSpec::compile)
            .collect();
        commands.push(Command::AddRelyingParty(self.to_command()));
        commands
    }
}
