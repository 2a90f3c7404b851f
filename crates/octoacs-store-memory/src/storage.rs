use std::collections::HashSet;

use async_trait::async_trait;
use octoacs_store::{
    ContinuationToken, KeyType, KeyUsage, ManagementStore, NewRelyingParty, NewRule,
    NewRuleGroup, NewRuleGroupLink, Page, RelyingParty, RelyingPartyKey, ResourceKind, Rule,
    RuleGroup, RuleGroupLink, StoreError, StoreResult, TokenType,
};
use papaya::HashMap as PapayaHashMap;
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::journal::{StoreOperation, StoreWrite};
use crate::snapshot::{RelyingPartySnapshot, RuleGroupSnapshot, StoreSnapshot};

/// Rule groups returned per page when no page size is configured.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Options for the in-memory store.
#[derive(Debug, Clone)]
pub struct MemoryStoreOptions {
    /// Rule groups returned per `list_rule_groups` page. Zero is treated as one.
    pub page_size: usize,
}

impl Default for MemoryStoreOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredRelyingParty {
    id: Uuid,
    name: String,
    realm_address: String,
    reply_address: Option<String>,
    token_type: TokenType,
    token_lifetime: u32,
    identity_providers: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
struct StoredLink {
    relying_party_id: Uuid,
    rule_group_id: Uuid,
}

#[derive(Debug, Clone, Copy)]
enum PendingChange {
    Delete { kind: ResourceKind, id: Uuid },
    Link(NewRuleGroupLink),
}

/// In-memory management store using papaya lock-free HashMaps.
///
/// This store provides:
/// - exact-name lookups and paged rule group listing (sorted by name)
/// - immediate-effect creation and removal
/// - queued deletes and links committed atomically by `save_changes`
/// - cascade deletion of keys, rules and links
/// - a journal of successful writes and per-operation failure injection
///
/// The `seed_*` helpers bypass name uniqueness and the journal, so tests can
/// build corrupted prior state.
#[derive(Debug)]
pub struct InMemoryStore {
    relying_parties: PapayaHashMap<Uuid, StoredRelyingParty>,
    rule_groups: PapayaHashMap<Uuid, RuleGroup>,
    rules: PapayaHashMap<Uuid, Rule>,
    keys: PapayaHashMap<Uuid, RelyingPartyKey>,
    links: PapayaHashMap<Uuid, StoredLink>,
    pending: Mutex<Vec<PendingChange>>,
    journal: RwLock<Vec<StoreWrite>>,
    failures: RwLock<HashSet<StoreOperation>>,
    options: MemoryStoreOptions,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates a new empty store with default options.
    pub fn new() -> Self {
        Self::with_options(MemoryStoreOptions::default())
    }

    /// Creates a new empty store with the given options.
    pub fn with_options(options: MemoryStoreOptions) -> Self {
        Self {
            relying_parties: PapayaHashMap::new(),
            rule_groups: PapayaHashMap::new(),
            rules: PapayaHashMap::new(),
            keys: PapayaHashMap::new(),
            links: PapayaHashMap::new(),
            pending: Mutex::new(Vec::new()),
            journal: RwLock::new(Vec::new()),
            failures: RwLock::new(HashSet::new()),
            options,
        }
    }

    /// Creates a new empty store listing `page_size` rule groups per page.
    pub fn with_page_size(page_size: usize) -> Self {
        Self::with_options(MemoryStoreOptions { page_size })
    }

    // ==================== Seeding ====================

    /// Inserts a relying party and its keys without any checks.
    pub fn seed_relying_party(&self, relying_party: &NewRelyingParty) -> Uuid {
        self.insert_relying_party(relying_party)
    }

    /// Inserts a rule group without any checks.
    pub fn seed_rule_group(&self, name: impl Into<String>) -> Uuid {
        self.insert_rule_group(name.into())
    }

    /// Inserts a rule without any checks.
    pub fn seed_rule(&self, rule: &NewRule) -> Uuid {
        self.insert_rule(rule)
    }

    /// Links a relying party to a rule group without any checks.
    pub fn seed_link(&self, relying_party_id: Uuid, rule_group_id: Uuid) -> Uuid {
        self.insert_link(relying_party_id, rule_group_id)
    }

    // ==================== Inspection ====================

    /// Makes every future call of `operation` fail with a connection error.
    pub async fn fail_on(&self, operation: StoreOperation) {
        self.failures.write().await.insert(operation);
    }

    /// Removes all injected failures.
    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
    }

    /// Returns every successful write, in call order.
    pub async fn journal(&self) -> Vec<StoreWrite> {
        self.journal.read().await.clone()
    }

    /// Returns the number of successful calls of `operation`.
    pub async fn count(&self, operation: StoreOperation) -> usize {
        self.journal
            .read()
            .await
            .iter()
            .filter(|write| write.operation() == operation)
            .count()
    }

    /// Forgets every recorded write.
    pub async fn clear_journal(&self) {
        self.journal.write().await.clear();
    }

    /// Returns the number of queued, uncommitted changes.
    pub async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Returns an identity-free view of the committed state.
    pub fn snapshot(&self) -> StoreSnapshot {
        let mut relying_parties: Vec<RelyingPartySnapshot> = {
            let guard = self.relying_parties.pin();
            guard
                .iter()
                .map(|(_, stored)| {
                    let view = self.relying_party_view(stored);
                    let mut rule_groups: Vec<String> = view
                        .rule_groups
                        .into_iter()
                        .map(|link| link.rule_group_name)
                        .collect();
                    rule_groups.sort();
                    let mut keys: Vec<String> =
                        view.keys.into_iter().map(|key| key.display_name).collect();
                    keys.sort();
                    RelyingPartySnapshot {
                        name: view.name,
                        realm_address: view.realm_address,
                        reply_address: view.reply_address,
                        token_type: view.token_type,
                        token_lifetime: view.token_lifetime,
                        identity_providers: view.identity_providers,
                        rule_groups,
                        keys,
                    }
                })
                .collect()
        };
        relying_parties.sort_by(|a, b| a.name.cmp(&b.name));

        let mut rule_groups: Vec<RuleGroupSnapshot> = {
            let guard = self.rule_groups.pin();
            guard
                .iter()
                .map(|(id, group)| {
                    let mut rules: Vec<String> = self
                        .rules_of(*id)
                        .into_iter()
                        .map(|rule| {
                            format!(
                                "{} -> {}",
                                rule.input_claim_type,
                                rule.output_claim_type
                                    .as_deref()
                                    .unwrap_or(&rule.input_claim_type)
                            )
                        })
                        .collect();
                    rules.sort();
                    RuleGroupSnapshot {
                        name: group.name.clone(),
                        rules,
                    }
                })
                .collect()
        };
        rule_groups.sort_by(|a, b| a.name.cmp(&b.name));

        StoreSnapshot {
            relying_parties,
            rule_groups,
        }
    }

    // ==================== Internals ====================

    async fn check_failure(&self, operation: StoreOperation) -> StoreResult<()> {
        if self.failures.read().await.contains(&operation) {
            return Err(StoreError::connection(format!(
                "injected failure on {operation:?}"
            )));
        }
        Ok(())
    }

    async fn record(&self, write: StoreWrite) {
        self.journal.write().await.push(write);
    }

    fn relying_party_view(&self, stored: &StoredRelyingParty) -> RelyingParty {
        let mut rule_groups: Vec<RuleGroupLink> = {
            let links = self.links.pin();
            let groups = self.rule_groups.pin();
            links
                .iter()
                .filter(|(_, link)| link.relying_party_id == stored.id)
                .map(|(id, link)| RuleGroupLink {
                    id: *id,
                    relying_party_id: link.relying_party_id,
                    rule_group_id: link.rule_group_id,
                    rule_group_name: groups
                        .get(&link.rule_group_id)
                        .map(|group| group.name.clone())
                        .unwrap_or_default(),
                })
                .collect()
        };
        rule_groups.sort_by(|a, b| a.rule_group_name.cmp(&b.rule_group_name));

        let mut keys: Vec<RelyingPartyKey> = {
            let guard = self.keys.pin();
            guard
                .iter()
                .filter(|(_, key)| key.relying_party_id == stored.id)
                .map(|(_, key)| key.clone())
                .collect()
        };
        keys.sort_by(|a, b| a.display_name.cmp(&b.display_name));

        RelyingParty {
            id: stored.id,
            name: stored.name.clone(),
            realm_address: stored.realm_address.clone(),
            reply_address: stored.reply_address.clone(),
            token_type: stored.token_type,
            token_lifetime: stored.token_lifetime,
            identity_providers: stored.identity_providers.clone(),
            rule_groups,
            keys,
        }
    }

    fn relying_parties_named(&self, name: &str) -> Vec<RelyingParty> {
        let guard = self.relying_parties.pin();
        guard
            .iter()
            .filter(|(_, stored)| stored.name == name)
            .map(|(_, stored)| self.relying_party_view(stored))
            .collect()
    }

    fn keys_named(&self, display_name: &str) -> Vec<RelyingPartyKey> {
        let guard = self.keys.pin();
        guard
            .iter()
            .filter(|(_, key)| key.display_name == display_name)
            .map(|(_, key)| key.clone())
            .collect()
    }

    fn sorted_rule_groups(&self) -> Vec<RuleGroup> {
        let guard = self.rule_groups.pin();
        let mut groups: Vec<RuleGroup> = guard.iter().map(|(_, group)| group.clone()).collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        groups
    }

    fn rules_of(&self, rule_group_id: Uuid) -> Vec<Rule> {
        let guard = self.rules.pin();
        guard
            .iter()
            .filter(|(_, rule)| rule.rule_group_id == rule_group_id)
            .map(|(_, rule)| rule.clone())
            .collect()
    }

    fn insert_relying_party(&self, relying_party: &NewRelyingParty) -> Uuid {
        let id = Uuid::new_v4();
        self.relying_parties.pin().insert(
            id,
            StoredRelyingParty {
                id,
                name: relying_party.name.clone(),
                realm_address: relying_party.realm_address.clone(),
                reply_address: relying_party.reply_address.clone(),
                token_type: relying_party.token_type,
                token_lifetime: relying_party.token_lifetime,
                identity_providers: relying_party.identity_providers.clone(),
            },
        );

        let name = &relying_party.name;
        if relying_party.symmetric_key.is_some() {
            self.insert_key(
                id,
                format!("{name}-symmetric-key"),
                KeyType::Symmetric,
                KeyUsage::Signing,
                (None, None),
            );
        }
        if relying_party.signing_certificate.is_some() {
            self.insert_key(
                id,
                format!("{name}-signing-certificate"),
                KeyType::X509Certificate,
                KeyUsage::Signing,
                (
                    relying_party.signing_certificate_start,
                    relying_party.signing_certificate_end,
                ),
            );
        }
        if relying_party.encryption_certificate.is_some() {
            self.insert_key(
                id,
                format!("{name}-encryption-certificate"),
                KeyType::X509Certificate,
                KeyUsage::Encrypting,
                (None, None),
            );
        }
        id
    }

    fn insert_key(
        &self,
        relying_party_id: Uuid,
        display_name: String,
        key_type: KeyType,
        usage: KeyUsage,
        (start_date, end_date): (Option<OffsetDateTime>, Option<OffsetDateTime>),
    ) {
        let id = Uuid::new_v4();
        self.keys.pin().insert(
            id,
            RelyingPartyKey {
                id,
                relying_party_id,
                display_name,
                key_type,
                usage,
                start_date,
                end_date,
            },
        );
    }

    fn insert_rule_group(&self, name: String) -> Uuid {
        let id = Uuid::new_v4();
        self.rule_groups.pin().insert(id, RuleGroup { id, name });
        id
    }

    fn insert_rule(&self, rule: &NewRule) -> Uuid {
        let id = Uuid::new_v4();
        self.rules.pin().insert(
            id,
            Rule {
                id,
                rule_group_id: rule.rule_group_id,
                description: rule.description.clone(),
                identity_provider: rule.identity_provider.clone(),
                input_claim_type: rule.input_claim_type.clone(),
                input_claim_value: rule.input_claim_value.clone(),
                output_claim_type: rule.output_claim_type.clone(),
                output_claim_value: rule.output_claim_value.clone(),
                passthrough: rule.passthrough,
            },
        );
        id
    }

    fn insert_link(&self, relying_party_id: Uuid, rule_group_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.links.pin().insert(
            id,
            StoredLink {
                relying_party_id,
                rule_group_id,
            },
        );
        id
    }

    fn exists(&self, kind: ResourceKind, id: Uuid) -> bool {
        match kind {
            ResourceKind::RelyingParty => self.relying_parties.pin().contains_key(&id),
            ResourceKind::RuleGroup => self.rule_groups.pin().contains_key(&id),
            ResourceKind::Rule => self.rules.pin().contains_key(&id),
            ResourceKind::RelyingPartyKey => self.keys.pin().contains_key(&id),
            ResourceKind::RuleGroupLink => self.links.pin().contains_key(&id),
        }
    }

    fn is_linked(&self, relying_party_id: Uuid, rule_group_id: Uuid) -> bool {
        self.links.pin().iter().any(|(_, link)| {
            link.relying_party_id == relying_party_id && link.rule_group_id == rule_group_id
        })
    }

    /// Removes a resource and everything it owns. Returns `false` if it did not exist.
    fn cascade_remove(&self, kind: ResourceKind, id: Uuid) -> bool {
        match kind {
            ResourceKind::RelyingParty => {
                if self.relying_parties.pin().remove(&id).is_none() {
                    return false;
                }
                self.keys.pin().retain(|_, key| key.relying_party_id != id);
                self.links.pin().retain(|_, link| link.relying_party_id != id);
                true
            }
            ResourceKind::RuleGroup => {
                if self.rule_groups.pin().remove(&id).is_none() {
                    return false;
                }
                self.rules.pin().retain(|_, rule| rule.rule_group_id != id);
                self.links.pin().retain(|_, link| link.rule_group_id != id);
                true
            }
            ResourceKind::Rule => self.rules.pin().remove(&id).is_some(),
            ResourceKind::RelyingPartyKey => self.keys.pin().remove(&id).is_some(),
            ResourceKind::RuleGroupLink => self.links.pin().remove(&id).is_some(),
        }
    }

    /// Checks a batch against committed state before any change is applied.
    fn validate_batch(&self, changes: &[PendingChange]) -> StoreResult<()> {
        let mut deleted: HashSet<Uuid> = HashSet::new();
        let mut linked: HashSet<(Uuid, Uuid)> = HashSet::new();

        for change in changes {
            match *change {
                PendingChange::Delete { kind, id } => {
                    if deleted.contains(&id) || !self.exists(kind, id) {
                        return Err(StoreError::batch(format!(
                            "cannot delete {kind}/{id}: resource does not exist"
                        )));
                    }
                    deleted.insert(id);
                }
                PendingChange::Link(link) => {
                    let endpoints_exist = self
                        .exists(ResourceKind::RelyingParty, link.relying_party_id)
                        && self.exists(ResourceKind::RuleGroup, link.rule_group_id)
                        && !deleted.contains(&link.relying_party_id)
                        && !deleted.contains(&link.rule_group_id);
                    if !endpoints_exist {
                        return Err(StoreError::batch(format!(
                            "cannot link {} to {}: endpoint does not exist",
                            link.relying_party_id, link.rule_group_id
                        )));
                    }
                    let pair = (link.relying_party_id, link.rule_group_id);
                    if self.is_linked(pair.0, pair.1) || !linked.insert(pair) {
                        return Err(StoreError::batch(format!(
                            "relying party {} is already linked to rule group {}",
                            pair.0, pair.1
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ManagementStore for InMemoryStore {
    async fn find_relying_parties(&self, name: &str) -> StoreResult<Vec<RelyingParty>> {
        Ok(self.relying_parties_named(name))
    }

    async fn find_rule_groups(&self, name: &str) -> StoreResult<Vec<RuleGroup>> {
        Ok(self
            .sorted_rule_groups()
            .into_iter()
            .filter(|group| group.name == name)
            .collect())
    }

    async fn find_keys(&self, display_name: &str) -> StoreResult<Vec<RelyingPartyKey>> {
        Ok(self.keys_named(display_name))
    }

    async fn rules(&self, rule_group_id: Uuid) -> StoreResult<Vec<Rule>> {
        Ok(self.rules_of(rule_group_id))
    }

    async fn list_rule_groups(
        &self,
        continuation: Option<&ContinuationToken>,
    ) -> StoreResult<Page<RuleGroup>> {
        let offset = match continuation {
            None => 0,
            Some(token) => token.as_str().parse::<usize>().map_err(|_| {
                StoreError::invalid_resource(format!(
                    "invalid continuation token '{}'",
                    token.as_str()
                ))
            })?,
        };
        let page_size = self.options.page_size.max(1);
        let groups = self.sorted_rule_groups();
        let end = offset.saturating_add(page_size).min(groups.len());
        let items = groups.get(offset..end).map(<[RuleGroup]>::to_vec).unwrap_or_default();
        let continuation = (end < groups.len()).then(|| ContinuationToken::new(end.to_string()));

        tracing::trace!(offset, returned = items.len(), "Listed rule group page");
        Ok(Page {
            items,
            continuation,
        })
    }

    async fn add_relying_party(&self, relying_party: &NewRelyingParty) -> StoreResult<Uuid> {
        self.check_failure(StoreOperation::AddRelyingParty).await?;
        if relying_party.name.is_empty() {
            return Err(StoreError::invalid_resource("relying party name is empty"));
        }
        if relying_party.realm_address.is_empty() {
            return Err(StoreError::invalid_resource(
                "relying party realm address is empty",
            ));
        }
        if !self.relying_parties_named(&relying_party.name).is_empty() {
            return Err(StoreError::already_exists(
                ResourceKind::RelyingParty,
                relying_party.name.clone(),
            ));
        }

        let id = self.insert_relying_party(relying_party);
        self.record(StoreWrite::AddRelyingParty(relying_party.clone()))
            .await;
        tracing::debug!(name = %relying_party.name, %id, "Relying party added");
        Ok(id)
    }

    async fn remove_relying_party(&self, id: Uuid) -> StoreResult<()> {
        self.check_failure(StoreOperation::RemoveRelyingParty).await?;
        if !self.cascade_remove(ResourceKind::RelyingParty, id) {
            return Err(StoreError::not_found(
                ResourceKind::RelyingParty,
                id.to_string(),
            ));
        }
        self.record(StoreWrite::RemoveRelyingParty { id }).await;
        tracing::debug!(%id, "Relying party removed");
        Ok(())
    }

    async fn add_rule_group(&self, rule_group: &NewRuleGroup) -> StoreResult<Uuid> {
        self.check_failure(StoreOperation::AddRuleGroup).await?;
        if rule_group.name.is_empty() {
            return Err(StoreError::invalid_resource("rule group name is empty"));
        }
        if self
            .sorted_rule_groups()
            .iter()
            .any(|group| group.name == rule_group.name)
        {
            return Err(StoreError::already_exists(
                ResourceKind::RuleGroup,
                rule_group.name.clone(),
            ));
        }

        let id = self.insert_rule_group(rule_group.name.clone());
        self.record(StoreWrite::AddRuleGroup(rule_group.clone())).await;
        tracing::debug!(name = %rule_group.name, %id, "Rule group added");
        Ok(id)
    }

    async fn add_rule(&self, rule: &NewRule) -> StoreResult<Uuid> {
        self.check_failure(StoreOperation::AddRule).await?;
        if !self.exists(ResourceKind::RuleGroup, rule.rule_group_id) {
            return Err(StoreError::not_found(
                ResourceKind::RuleGroup,
                rule.rule_group_id.to_string(),
            ));
        }
        if rule.input_claim_type.is_empty() {
            return Err(StoreError::invalid_resource("rule input claim type is empty"));
        }

        let id = self.insert_rule(rule);
        self.record(StoreWrite::AddRule(rule.clone())).await;
        tracing::debug!(rule_group_id = %rule.rule_group_id, %id, "Rule added");
        Ok(id)
    }

    async fn delete(&self, kind: ResourceKind, id: Uuid) -> StoreResult<()> {
        self.check_failure(StoreOperation::Delete).await?;
        self.pending
            .lock()
            .await
            .push(PendingChange::Delete { kind, id });
        self.record(StoreWrite::Delete { kind, id }).await;
        Ok(())
    }

    async fn link(&self, link: &NewRuleGroupLink) -> StoreResult<()> {
        self.check_failure(StoreOperation::Link).await?;
        self.pending.lock().await.push(PendingChange::Link(*link));
        self.record(StoreWrite::Link(*link)).await;
        Ok(())
    }

    async fn save_changes(&self) -> StoreResult<usize> {
        self.check_failure(StoreOperation::SaveChanges).await?;
        let changes = std::mem::take(&mut *self.pending.lock().await);
        self.validate_batch(&changes)?;

        for change in &changes {
            match *change {
                PendingChange::Delete { kind, id } => {
                    self.cascade_remove(kind, id);
                }
                PendingChange::Link(link) => {
                    self.insert_link(link.relying_party_id, link.rule_group_id);
                }
            }
        }

        let committed = changes.len();
        self.record(StoreWrite::SaveChanges { committed }).await;
        tracing::debug!(committed, "Batch committed");
        Ok(committed)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
