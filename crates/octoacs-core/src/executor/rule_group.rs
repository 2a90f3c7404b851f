use octoacs_store::{NewRule, NewRuleGroup, ResourceKind};

use super::{Executor, at_most_one, exactly_one, required};
use crate::command::{AddRuleCommand, AddRuleGroupCommand, RemoveRuleGroupCommand};
use crate::error::ReconcileResult;
use crate::log::LogEvent;

impl Executor<'_> {
    pub(super) async fn add_rule_group(
        &mut self,
        command: &AddRuleGroupCommand,
    ) -> ReconcileResult<()> {
        let name = required(command.name.as_deref(), "rule group", "name")?;

        self.remove_rule_group_named(name).await?;

        self.store
            .add_rule_group(&NewRuleGroup {
                name: name.to_string(),
            })
            .await?;
        self.emit(LogEvent::AddingRuleGroup {
            name: name.to_string(),
        });
        self.applied();
        self.report.record_created(ResourceKind::RuleGroup, name);
        Ok(())
    }

    pub(super) async fn add_rule(&mut self, command: &AddRuleCommand) -> ReconcileResult<()> {
        let rule_group = required(command.rule_group.as_deref(), "rule", "rule_group")?;
        let input_claim_type =
            required(command.input_claim_type.as_deref(), "rule", "input_claim_type")?;

        let group = exactly_one(
            ResourceKind::RuleGroup,
            rule_group,
            self.store.find_rule_groups(rule_group).await?,
        )?;

        self.store
            .add_rule(&NewRule {
                rule_group_id: group.id,
                description: command.description.clone(),
                identity_provider: command.identity_provider.clone(),
                input_claim_type: input_claim_type.to_string(),
                input_claim_value: command.input_claim_value.clone(),
                output_claim_type: command.output_claim_type.clone(),
                output_claim_value: command.output_claim_value.clone(),
                passthrough: command.passthrough,
            })
            .await?;
        // Undescribed rules are reported by the claim type they match.
        let description = command
            .description
            .as_deref()
            .unwrap_or(input_claim_type);
        self.emit(LogEvent::AddingRule {
            rule_group: rule_group.to_string(),
            description: description.to_string(),
        });
        self.applied();
        self.report
            .record_created(ResourceKind::Rule, &format!("{rule_group}/{description}"));
        Ok(())
    }

    pub(super) async fn remove_rule_group(
        &mut self,
        command: &RemoveRuleGroupCommand,
    ) -> ReconcileResult<()> {
        let name = required(Some(command.name.as_str()), "rule group", "name")?;
        if !self.remove_rule_group_named(name).await? {
            tracing::debug!(name, "Rule group absent, nothing to remove");
        }
        Ok(())
    }

    /// Deletes the rule group named `name` in its own batch. Returns `false`
    /// if there was none.
    async fn remove_rule_group_named(&mut self, name: &str) -> ReconcileResult<bool> {
        let existing = at_most_one(
            ResourceKind::RuleGroup,
            name,
            self.store.find_rule_groups(name).await?,
        )?;
        let Some(existing) = existing else {
            return Ok(false);
        };

        self.store
            .delete(ResourceKind::RuleGroup, existing.id)
            .await?;
        self.emit(LogEvent::RemovingRuleGroup {
            name: name.to_string(),
        });
        self.report.record_deleted(ResourceKind::RuleGroup, name);
        self.save_changes().await?;
        Ok(true)
    }
}
