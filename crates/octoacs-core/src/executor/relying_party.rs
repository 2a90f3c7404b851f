use std::collections::HashSet;

use futures_util::TryStreamExt;
use octoacs_store::{NewRelyingParty, NewRuleGroupLink, RelyingParty, ResourceKind, RuleGroup};
use regex::Regex;
use uuid::Uuid;

use super::{Executor, at_most_one, exactly_one, required};
use crate::command::{AddRelyingPartyCommand, RemoveRelyingPartyCommand};
use crate::error::{ReconcileError, ReconcileResult};
use crate::log::LogEvent;

impl Executor<'_> {
    pub(super) async fn add_relying_party(
        &mut self,
        command: &AddRelyingPartyCommand,
    ) -> ReconcileResult<()> {
        let new = self.new_relying_party(command)?;
        let patterns = compile_patterns(&command.rule_group_patterns)?;

        let existing = at_most_one(
            ResourceKind::RelyingParty,
            &new.name,
            self.store.find_relying_parties(&new.name).await?,
        )?;
        if let Some(existing) = existing {
            self.tear_down(&existing, command.remove_related_rule_groups)
                .await?;
        }

        self.store.add_relying_party(&new).await?;
        self.emit(LogEvent::AddingRelyingParty {
            name: new.name.clone(),
        });
        self.applied();
        self.report
            .record_created(ResourceKind::RelyingParty, &new.name);

        self.link_rule_groups(&new.name, &patterns).await
    }

    pub(super) async fn remove_relying_party(
        &mut self,
        command: &RemoveRelyingPartyCommand,
    ) -> ReconcileResult<()> {
        let name = required(Some(command.name.as_str()), "relying party", "name")?;
        let existing = at_most_one(
            ResourceKind::RelyingParty,
            name,
            self.store.find_relying_parties(name).await?,
        )?;
        match existing {
            Some(existing) => {
                self.tear_down(&existing, command.remove_related_rule_groups)
                    .await
            }
            None => {
                tracing::debug!(name, "Relying party absent, nothing to remove");
                Ok(())
            }
        }
    }

    /// Maps the command onto the store's creation fields, checking required ones.
    fn new_relying_party(&self, command: &AddRelyingPartyCommand) -> ReconcileResult<NewRelyingParty> {
        let name = required(command.name.as_deref(), "relying party", "name")?;
        let realm_address = required(
            command.realm_address.as_deref(),
            "relying party",
            "realm_address",
        )?;

        let mut new = NewRelyingParty {
            name: name.to_string(),
            realm_address: realm_address.to_string(),
            reply_address: command.reply_address.clone(),
            symmetric_key: command.symmetric_key.clone(),
            token_type: command.token_type,
            token_lifetime: self.settings.token_lifetime(command.token_lifetime),
            encryption_certificate: command.encryption_certificate.clone(),
            identity_providers: command.identity_providers.clone(),
            ..NewRelyingParty::default()
        };

        if let Some(certificate) = &command.signing_certificate {
            let bytes = certificate
                .bytes
                .clone()
                .filter(|bytes| !bytes.is_empty())
                .ok_or_else(|| ReconcileError::missing_field("signing certificate", "bytes"))?;
            new.signing_certificate = Some(bytes);
            new.signing_certificate_password = certificate.password.clone();
            new.signing_certificate_start = certificate.start_date;
            new.signing_certificate_end = certificate.end_date;
        }

        Ok(new)
    }

    /// Removes an existing relying party: its rule groups when asked, then
    /// its keys, then the relying party itself.
    async fn tear_down(
        &mut self,
        existing: &RelyingParty,
        remove_related_rule_groups: bool,
    ) -> ReconcileResult<()> {
        if remove_related_rule_groups {
            let mut queued: HashSet<Uuid> = HashSet::new();
            for link in &existing.rule_groups {
                if !queued.insert(link.rule_group_id) {
                    continue;
                }
                let name = &link.rule_group_name;
                let group = exactly_one(
                    ResourceKind::RuleGroup,
                    name,
                    self.store.find_rule_groups(name).await?,
                )?;
                self.store.delete(ResourceKind::RuleGroup, group.id).await?;
                self.emit(LogEvent::RemovingRuleGroup { name: name.clone() });
                self.report.record_deleted(ResourceKind::RuleGroup, name);
            }
            if !queued.is_empty() {
                self.save_changes().await?;
            }
        }

        if !existing.keys.is_empty() {
            for key in &existing.keys {
                let display_name = &key.display_name;
                let key = exactly_one(
                    ResourceKind::RelyingPartyKey,
                    display_name,
                    self.store.find_keys(display_name).await?,
                )?;
                self.store
                    .delete(ResourceKind::RelyingPartyKey, key.id)
                    .await?;
                self.emit(LogEvent::RemovingKey {
                    display_name: display_name.clone(),
                });
                self.report
                    .record_deleted(ResourceKind::RelyingPartyKey, display_name);
            }
            self.save_changes().await?;
        }

        self.store.remove_relying_party(existing.id).await?;
        self.emit(LogEvent::RemovingRelyingParty {
            name: existing.name.clone(),
        });
        self.applied();
        self.report
            .record_deleted(ResourceKind::RelyingParty, &existing.name);
        Ok(())
    }

    /// Links every rule group matching any pattern, committing all links in
    /// one batch.
    async fn link_rule_groups(&mut self, name: &str, patterns: &[Regex]) -> ReconcileResult<()> {
        let mut linked: HashSet<Uuid> = HashSet::new();

        for pattern in patterns {
            let relying_party = exactly_one(
                ResourceKind::RelyingParty,
                name,
                self.store.find_relying_parties(name).await?,
            )?;
            let groups: Vec<RuleGroup> = octoacs_store::rule_groups(self.store)
                .try_collect()
                .await?;
            tracing::trace!(
                pattern = pattern.as_str(),
                listed = groups.len(),
                "Matching rule groups"
            );

            for group in groups.iter().filter(|group| pattern.is_match(&group.name)) {
                if !linked.insert(group.id) {
                    continue;
                }
                self.store
                    .link(&NewRuleGroupLink {
                        relying_party_id: relying_party.id,
                        rule_group_id: group.id,
                    })
                    .await?;
                self.emit(LogEvent::Linking {
                    relying_party: name.to_string(),
                    rule_group: group.name.clone(),
                });
                self.report.linked.push(format!("{name} -> {}", group.name));
            }
        }

        if !linked.is_empty() {
            self.save_changes().await?;
        }
        Ok(())
    }
}

fn compile_patterns(patterns: &[String]) -> ReconcileResult<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| ReconcileError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_patterns_rejects_invalid_regex() {
        let err = compile_patterns(&["^ok$".to_string(), "(unclosed".to_string()]).unwrap_err();

        match err {
            ReconcileError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "(unclosed"),
            other => panic!("expected InvalidPattern, got {other:?}"),
        }
    }

    #[test]
    fn test_patterns_use_search_semantics() {
        let patterns = compile_patterns(&["prod".to_string()]).unwrap();
        assert!(patterns[0].is_match("app-prod-a"));
        assert!(!patterns[0].is_match("staging"));
    }
}
