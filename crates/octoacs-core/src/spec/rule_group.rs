//! Rule group and rule specs.

use crate::command::{AddRuleCommand, AddRuleGroupCommand, Command};
use crate::spec::CompileCommands;

// =============================================================================
// Rule
// =============================================================================

/// Desired claim rule inside a rule group.
///
/// A rule matches an input claim (by type, and optionally value and issuer)
/// and emits an output claim. Unset output fields keep the input's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSpec {
    description: Option<String>,
    identity_provider: Option<String>,
    input_claim_type: Option<String>,
    input_claim_value: Option<String>,
    output_claim_type: Option<String>,
    output_claim_value: Option<String>,
    passthrough: bool,
}

impl RuleSpec {
    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Only match claims issued by this identity provider.
    #[must_use]
    pub fn identity_provider(mut self, identity_provider: impl Into<String>) -> Self {
        self.identity_provider = Some(identity_provider.into());
        self
    }

    /// Match claims of this type.
    #[must_use]
    pub fn input_claim_type(mut self, claim_type: impl Into<String>) -> Self {
        self.input_claim_type = Some(claim_type.into());
        self
    }

    /// Only match claims with this value.
    #[must_use]
    pub fn input_claim_value(mut self, value: impl Into<String>) -> Self {
        self.input_claim_value = Some(value.into());
        self
    }

    /// Emit a claim of this type.
    #[must_use]
    pub fn output_claim_type(mut self, claim_type: impl Into<String>) -> Self {
        self.output_claim_type = Some(claim_type.into());
        self
    }

    /// Emit this value.
    #[must_use]
    pub fn output_claim_value(mut self, value: impl Into<String>) -> Self {
        self.output_claim_value = Some(value.into());
        self
    }

    /// Copy the matched claim through unchanged.
    #[must_use]
    pub fn passthrough(mut self) -> Self {
        self.passthrough = true;
        self
    }

    fn to_command(&self, rule_group: Option<&str>) -> AddRuleCommand {
        AddRuleCommand {
            rule_group: rule_group.map(str::to_string),
            description: self.description.clone(),
            identity_provider: self.identity_provider.clone(),
            input_claim_type: self.input_claim_type.clone(),
            input_claim_value: self.input_claim_value.clone(),
            output_claim_type: self.output_claim_type.clone(),
            output_claim_value: self.output_claim_value.clone(),
            passthrough: self.passthrough,
        }
    }
}

// =============================================================================
// Rule Group
// =============================================================================

/// Desired rule group and its rules.
///
/// # Example
///
/// ```
/// use octoacs_core::{CompileCommands, RuleGroupSpec};
///
/// let group = RuleGroupSpec::default()
///     .name("portal-claims")
///     .rule(|rule| rule.input_claim_type("email").passthrough());
///
/// assert_eq!(group.compile().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleGroupSpec {
    name: Option<String>,
    rules: Vec<RuleSpec>,
}

impl RuleGroupSpec {
    /// Set the rule group name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a rule, configured by `configure`.
    #[must_use]
    pub fn rule(mut self, configure: impl FnOnce(RuleSpec) -> RuleSpec) -> Self {
        self.rules.push(configure(RuleSpec::default()));
        self
    }

    pub(crate) fn configured_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl CompileCommands for RuleGroupSpec {
    fn compile(&self) -> Vec<Command> {
        let mut commands = Vec::with_capacity(self.rules.len() + 1);
        commands.push(Command::AddRuleGroup(AddRuleGroupCommand {
            name: self.name.clone(),
        }));
        commands.extend(
            self.rules
                .iter()
                .map(|rule| Command::AddRule(rule.to_command(self.name.as_deref()))),
        );
        commands
    }
}
