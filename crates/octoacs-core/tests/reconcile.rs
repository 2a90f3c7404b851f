use octoacs_core::{
    CollectingSink, CompileCommands, LogEvent, NamespaceSpec, NullSink, ReconcileError,
    ReconcileSettings, RelyingPartySpec, RuleGroupSpec, TokenType, checks, reconcile,
    reconcile_with,
};
use octoacs_store::{NewRelyingParty, NewRule, ResourceKind};
use octoacs_store_memory::{InMemoryStore, StoreOperation, StoreWrite, create_store};
use time::macros::datetime;

fn portal() -> RelyingPartySpec {
    RelyingPartySpec::default()
        .name("portal")
        .realm_address("https://portal.example.com/")
}

fn prior(name: &str) -> NewRelyingParty {
    NewRelyingParty {
        name: name.to_string(),
        realm_address: format!("https://{name}.example.com/old"),
        token_lifetime: 3600,
        symmetric_key: Some(vec![1; 32]),
        ..NewRelyingParty::default()
    }
}

async fn created_relying_parties(store: &InMemoryStore) -> Vec<NewRelyingParty> {
    store
        .journal()
        .await
        .into_iter()
        .filter_map(|write| match write {
            StoreWrite::AddRelyingParty(new) => Some(new),
            _ => None,
        })
        .collect()
}

// ==================== Creation ====================

#[tokio::test]
async fn test_no_prior_state_creates_without_removals() {
    let store = InMemoryStore::new();
    let sink = CollectingSink::new();

    let spec = portal()
        .reply_address("https://portal.example.com/signin")
        .swt_token()
        .allow_identity_provider("Google")
        .allow_identity_provider("Windows Live ID")
        .signing_certificate(|cert| {
            cert.bytes(vec![0x30, 0x82])
                .password("secret")
                .start_date(datetime!(2026-01-01 0:00 UTC))
                .end_date(datetime!(2027-01-01 0:00 UTC))
        });

    let report = reconcile(&spec, &store, &sink).await.unwrap();

    assert_eq!(
        sink.messages(),
        vec!["Adding Relying Party 'portal'", "Saving changes"]
    );
    assert!(!sink.events().iter().any(LogEvent::is_removal));
    assert_eq!(report.created, vec!["RelyingParty/portal"]);
    assert!(report.deleted.is_empty());
    assert_eq!(report.batches, 0);

    let created = created_relying_parties(&store).await;
    assert_eq!(created.len(), 1);
    let new = &created[0];
    assert_eq!(new.token_type, TokenType::Swt);
    assert_eq!(new.identity_providers, vec!["Google", "Windows Live ID"]);
    assert_eq!(new.signing_certificate.as_deref(), Some(&[0x30u8, 0x82][..]));
    assert_eq!(new.signing_certificate_password.as_deref(), Some("secret"));
    assert_eq!(
        new.signing_certificate_start,
        Some(datetime!(2026-01-01 0:00 UTC))
    );
    assert_eq!(
        new.signing_certificate_end,
        Some(datetime!(2027-01-01 0:00 UTC))
    );
}

#[tokio::test]
async fn test_absent_signing_certificate_passes_no_fields() {
    let store = InMemoryStore::new();

    reconcile(&portal(), &store, &NullSink).await.unwrap();

    let new = &created_relying_parties(&store).await[0];
    assert!(new.signing_certificate.is_none());
    assert!(new.signing_certificate_password.is_none());
    assert!(new.signing_certificate_start.is_none());
    assert!(new.signing_certificate_end.is_none());
}

#[tokio::test]
async fn test_zero_token_lifetime_uses_default() {
    let store = InMemoryStore::new();

    reconcile(&portal().token_lifetime(0), &store, &NullSink)
        .await
        .unwrap();

    let new = &created_relying_parties(&store).await[0];
    assert_eq!(new.token_lifetime, 600);
}

#[tokio::test]
async fn test_configured_default_token_lifetime() {
    let store = InMemoryStore::new();
    let settings = ReconcileSettings {
        default_token_lifetime: 900,
    };

    let spec = NamespaceSpec::default()
        .relying_party(|_| portal())
        .relying_party(|rp| {
            rp.name("api")
                .realm_address("https://api.example.com/")
                .token_lifetime(120)
        });
    reconcile_with(&spec, &store, &NullSink, &settings)
        .await
        .unwrap();

    let lifetimes: Vec<u32> = created_relying_parties(&store)
        .await
        .iter()
        .map(|new| new.token_lifetime)
        .collect();
    assert_eq!(lifetimes, vec![900, 120]);
}

// ==================== Replacement ====================

#[tokio::test]
async fn test_replace_keeps_rule_groups_and_deletes_keys() {
    let store = InMemoryStore::new();
    let mut old = prior("portal");
    old.encryption_certificate = Some(vec![9]);
    let rp = store.seed_relying_party(&old);
    let a = store.seed_rule_group("a");
    let b = store.seed_rule_group("b");
    store.seed_link(rp, a);
    store.seed_link(rp, b);
    let sink = CollectingSink::new();

    reconcile(&portal(), &store, &sink).await.unwrap();

    assert_eq!(
        sink.messages(),
        vec![
            "Removing Key 'portal-encryption-certificate'",
            "Removing Key 'portal-symmetric-key'",
            "Saving changes",
            "Removing Relying Party 'portal'",
            "Saving changes",
            "Adding Relying Party 'portal'",
            "Saving changes",
        ]
    );

    let snapshot = store.snapshot();
    assert!(snapshot.rule_group("a").is_some());
    assert!(snapshot.rule_group("b").is_some());
    let replaced: Vec<_> = snapshot.relying_parties_named("portal").collect();
    assert_eq!(replaced.len(), 1);
    assert_eq!(replaced[0].realm_address, "https://portal.example.com/");
    assert!(replaced[0].keys.is_empty());
    assert!(replaced[0].rule_groups.is_empty());
    assert_eq!(store.count(StoreOperation::SaveChanges).await, 1);
}

#[tokio::test]
async fn test_replace_orders_key_deletion_before_removal_and_creation() {
    let store = InMemoryStore::new();
    store.seed_relying_party(&prior("portal"));

    reconcile(&portal(), &store, &NullSink).await.unwrap();

    let operations: Vec<StoreOperation> = store
        .journal()
        .await
        .iter()
        .map(StoreWrite::operation)
        .collect();
    assert_eq!(
        operations,
        vec![
            StoreOperation::Delete,
            StoreOperation::SaveChanges,
            StoreOperation::RemoveRelyingParty,
            StoreOperation::AddRelyingParty,
        ]
    );
}

#[tokio::test]
async fn test_replace_removes_related_rule_groups_in_one_batch() {
    let store = InMemoryStore::new();
    let rp = store.seed_relying_party(&prior("portal"));
    let a = store.seed_rule_group("a");
    let b = store.seed_rule_group("b");
    store.seed_rule_group("unrelated");
    store.seed_link(rp, a);
    store.seed_link(rp, b);
    let sink = CollectingSink::new();

    let report = reconcile(&portal().remove_related_rule_groups(), &store, &sink)
        .await
        .unwrap();

    assert_eq!(
        sink.messages(),
        vec![
            "Removing Rule Group 'a'",
            "Removing Rule Group 'b'",
            "Saving changes",
            "Removing Key 'portal-symmetric-key'",
            "Saving changes",
            "Removing Relying Party 'portal'",
            "Saving changes",
            "Adding Relying Party 'portal'",
            "Saving changes",
        ]
    );

    let journal = store.journal().await;
    let group_deletes = journal
        .iter()
        .filter(|write| {
            matches!(
                write,
                StoreWrite::Delete {
                    kind: ResourceKind::RuleGroup,
                    ..
                }
            )
        })
        .count();
    assert_eq!(group_deletes, 2);
    assert_eq!(
        journal[2],
        StoreWrite::SaveChanges { committed: 2 },
        "both rule group deletions commit together"
    );

    let snapshot = store.snapshot();
    assert!(snapshot.rule_group("a").is_none());
    assert!(snapshot.rule_group("b").is_none());
    assert!(snapshot.rule_group("unrelated").is_some());
    assert_eq!(report.batches, 2);
    assert_eq!(
        report.deleted,
        vec![
            "RuleGroup/a",
            "RuleGroup/b",
            "RelyingPartyKey/portal-symmetric-key",
            "RelyingParty/portal",
        ]
    );
}

#[tokio::test]
async fn test_reconcile_is_idempotent() {
    let store = InMemoryStore::with_page_size(2);
    store.seed_rule_group("portal-shared");
    store.seed_rule_group("other");

    let spec = NamespaceSpec::default().relying_party(|_| {
        portal()
            .symmetric_key(vec![7; 32])
            .encryption_certificate(vec![3, 4])
            .signing_certificate(|cert| cert.bytes(vec![5]).password("pw"))
            .allow_identity_provider("Google")
            .link_to_rule_group("^portal-")
            .rule_group(|group| {
                group.name("portal-claims").rule(|rule| {
                    rule.description("email")
                        .input_claim_type("email")
                        .passthrough()
                })
            })
    });

    reconcile(&spec, &store, &NullSink).await.unwrap();
    let first = store.snapshot();
    reconcile(&spec, &store, &NullSink).await.unwrap();
    let second = store.snapshot();

    assert_eq!(first, second);
    let rp = first.relying_parties_named("portal").next().unwrap();
    assert_eq!(rp.rule_groups, vec!["portal-claims", "portal-shared"]);
    assert_eq!(
        rp.keys,
        vec![
            "portal-encryption-certificate",
            "portal-signing-certificate",
            "portal-symmetric-key",
        ]
    );
    assert_eq!(
        first.rule_group("portal-claims").unwrap().rules,
        vec!["email -> email"]
    );
}

// ==================== Linking ====================

#[tokio::test]
async fn test_links_span_every_page() {
    for page_size in [1, 2, 50] {
        let store = InMemoryStore::with_page_size(page_size);
        store.seed_rule_group("prod-a");
        store.seed_rule_group("staging-a");
        store.seed_rule_group("prod-b");
        let sink = CollectingSink::new();

        let report = reconcile(&portal().link_to_rule_group("^prod-.*"), &store, &sink)
            .await
            .unwrap();

        assert_eq!(
            sink.messages(),
            vec![
                "Adding Relying Party 'portal'",
                "Saving changes",
                "Linking Relying Party 'portal' to Rule Group 'prod-a'",
                "Linking Relying Party 'portal' to Rule Group 'prod-b'",
                "Saving changes",
            ],
            "page size {page_size}"
        );
        assert_eq!(store.count(StoreOperation::Link).await, 2);
        assert_eq!(store.count(StoreOperation::SaveChanges).await, 1);
        assert_eq!(report.linked, vec!["portal -> prod-a", "portal -> prod-b"]);

        let snapshot = store.snapshot();
        let rp = snapshot.relying_parties_named("portal").next().unwrap();
        assert_eq!(rp.rule_groups, vec!["prod-a", "prod-b"]);
    }
}

#[tokio::test]
async fn test_overlapping_patterns_link_each_group_once() {
    let store = InMemoryStore::with_page_size(1);
    store.seed_rule_group("prod-a");
    store.seed_rule_group("prod-b");
    store.seed_rule_group("staging-a");

    let spec = portal()
        .link_to_rule_group("^prod-")
        .link_to_rule_group("-a$");
    reconcile(&spec, &store, &NullSink).await.unwrap();

    assert_eq!(store.count(StoreOperation::Link).await, 3);
    assert_eq!(store.count(StoreOperation::SaveChanges).await, 1);
    assert!(checks::is_linked(&store, "portal", "staging-a").await.unwrap());
}

#[tokio::test]
async fn test_unmatched_patterns_do_not_flush() {
    let store = InMemoryStore::new();
    store.seed_rule_group("staging-a");
    let sink = CollectingSink::new();

    reconcile(&portal().link_to_rule_group("^prod-"), &store, &sink)
        .await
        .unwrap();

    assert_eq!(
        sink.messages(),
        vec!["Adding Relying Party 'portal'", "Saving changes"]
    );
    assert_eq!(store.count(StoreOperation::SaveChanges).await, 0);
}

#[tokio::test]
async fn test_inline_rule_groups_are_created_then_linked() {
    let store = InMemoryStore::new();
    let sink = CollectingSink::new();

    let spec = portal().rule_group(|group| {
        group.name("portal-claims").rule(|rule| {
            rule.description("email passthrough")
                .input_claim_type("email")
                .passthrough()
        })
    });
    reconcile(&spec, &store, &sink).await.unwrap();

    assert_eq!(
        sink.messages(),
        vec![
            "Adding Rule Group 'portal-claims'",
            "Saving changes",
            "Adding Rule 'email passthrough' to Rule Group 'portal-claims'",
            "Saving changes",
            "Adding Relying Party 'portal'",
            "Saving changes",
            "Linking Relying Party 'portal' to Rule Group 'portal-claims'",
            "Saving changes",
        ]
    );
    assert!(
        checks::has_rule_described(&store, "portal-claims", "email passthrough")
            .await
            .unwrap()
    );
}

// ==================== Rule groups ====================

#[tokio::test]
async fn test_rule_group_is_replaced() {
    let store = InMemoryStore::new();
    let group = store.seed_rule_group("claims");
    store.seed_rule(&NewRule {
        rule_group_id: group,
        description: Some("stale".into()),
        identity_provider: None,
        input_claim_type: "name".into(),
        input_claim_value: None,
        output_claim_type: None,
        output_claim_value: None,
        passthrough: true,
    });
    let sink = CollectingSink::new();

    let spec = RuleGroupSpec::default().name("claims").rule(|rule| {
        rule.input_claim_type("group")
            .input_claim_value("admins")
            .output_claim_type("role")
            .output_claim_value("admin")
    });
    reconcile(&spec, &store, &sink).await.unwrap();

    assert_eq!(
        sink.messages(),
        vec![
            "Removing Rule Group 'claims'",
            "Saving changes",
            "Adding Rule Group 'claims'",
            "Saving changes",
            "Adding Rule 'group' to Rule Group 'claims'",
            "Saving changes",
        ]
    );
    let rules = checks::rules(&store, "claims").await.unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].output_claim_value.as_deref(), Some("admin"));
}

#[tokio::test]
async fn test_report_names_each_rule() {
    let store = InMemoryStore::new();

    let spec = RuleGroupSpec::default()
        .name("claims")
        .rule(|rule| rule.description("email passthrough").input_claim_type("email"))
        .rule(|rule| rule.input_claim_type("name"))
        .rule(|rule| rule.input_claim_type("group").output_claim_type("role"));
    let report = reconcile(&spec, &store, &NullSink).await.unwrap();

    assert_eq!(
        report.created,
        vec![
            "RuleGroup/claims",
            "Rule/claims/email passthrough",
            "Rule/claims/name",
            "Rule/claims/group",
        ]
    );
}

#[tokio::test]
async fn test_rule_for_missing_group_is_a_precondition_violation() {
    let store = InMemoryStore::new();
    let commands = RuleGroupSpec::default()
        .name("claims")
        .rule(|rule| rule.input_claim_type("email"))
        .compile();

    let err = reconcile(&commands[1..], &store, &NullSink)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::PreconditionViolation {
            kind: ResourceKind::RuleGroup,
            found: 0,
            ..
        }
    ));
}

#[tokio::test]
async fn test_removals_of_absent_resources_are_no_ops() {
    let store = InMemoryStore::new();
    let sink = CollectingSink::new();

    let spec = NamespaceSpec::default()
        .remove_rule_group("legacy")
        .remove_relying_party("old-portal");
    let report = reconcile(&spec, &store, &sink).await.unwrap();

    assert!(sink.events().is_empty());
    assert!(store.journal().await.is_empty());
    assert_eq!(report.commands, 2);
}

#[tokio::test]
async fn test_remove_relying_party_with_rule_groups() {
    let store = InMemoryStore::new();
    let rp = store.seed_relying_party(&prior("old-portal"));
    let group = store.seed_rule_group("old-claims");
    store.seed_link(rp, group);
    let sink = CollectingSink::new();

    reconcile(
        &NamespaceSpec::default().remove_relying_party_with_rule_groups("old-portal"),
        &store,
        &sink,
    )
    .await
    .unwrap();

    assert_eq!(
        sink.messages(),
        vec![
            "Removing Rule Group 'old-claims'",
            "Saving changes",
            "Removing Key 'old-portal-symmetric-key'",
            "Saving changes",
            "Removing Relying Party 'old-portal'",
            "Saving changes",
        ]
    );
    assert!(!checks::relying_party_exists(&store, "old-portal").await.unwrap());
    assert!(!checks::rule_group_exists(&store, "old-claims").await.unwrap());
}

// ==================== Failures ====================

#[tokio::test]
async fn test_duplicate_relying_parties_are_a_precondition_violation() {
    let store = InMemoryStore::new();
    store.seed_relying_party(&prior("portal"));
    store.seed_relying_party(&prior("portal"));
    let sink = CollectingSink::new();

    let err = reconcile(&portal(), &store, &sink).await.unwrap_err();

    assert!(err.is_precondition_violation());
    assert!(matches!(
        err,
        ReconcileError::PreconditionViolation {
            kind: ResourceKind::RelyingParty,
            found: 2,
            ..
        }
    ));
    assert!(store.journal().await.is_empty());
    assert!(sink.events().is_empty());
}

#[tokio::test]
async fn test_missing_name_is_a_configuration_error() {
    let store = InMemoryStore::new();

    let spec = RelyingPartySpec::default().realm_address("https://portal.example.com/");
    let err = reconcile(&spec, &store, &NullSink).await.unwrap_err();

    assert!(matches!(err, ReconcileError::Configuration { .. }));
    assert!(err.to_string().contains("'name'"));
    assert!(store.journal().await.is_empty());
}

#[tokio::test]
async fn test_missing_realm_address_is_a_configuration_error() {
    let store = InMemoryStore::new();
    store.seed_relying_party(&prior("portal"));

    let err = reconcile(&RelyingPartySpec::default().name("portal"), &store, &NullSink)
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::Configuration { .. }));
    assert!(store.journal().await.is_empty());
    assert!(checks::relying_party_exists(&store, "portal").await.unwrap());
}

#[tokio::test]
async fn test_invalid_pattern_fails_before_any_write() {
    let store = InMemoryStore::new();
    store.seed_relying_party(&prior("portal"));

    let err = reconcile(&portal().link_to_rule_group("prod-(a"), &store, &NullSink)
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::InvalidPattern { .. }));
    assert!(store.journal().await.is_empty());
    assert_eq!(checks::key_count(&store, "portal").await.unwrap(), 1);
}

#[tokio::test]
async fn test_store_failure_propagates_and_sink_holds_prior_steps() {
    let store = InMemoryStore::new();
    store.seed_relying_party(&prior("portal"));
    store.fail_on(StoreOperation::AddRelyingParty).await;
    let sink = CollectingSink::new();

    let err = reconcile(&portal(), &store, &sink).await.unwrap_err();

    assert!(err.is_remote());
    assert_eq!(
        sink.messages(),
        vec![
            "Removing Key 'portal-symmetric-key'",
            "Saving changes",
            "Removing Relying Party 'portal'",
            "Saving changes",
        ]
    );
    // Nothing is rolled back.
    assert!(!checks::relying_party_exists(&store, "portal").await.unwrap());

    store.clear_failures().await;
    reconcile(&portal(), &store, &NullSink).await.unwrap();
    assert!(checks::relying_party_exists(&store, "portal").await.unwrap());
}

#[tokio::test]
async fn test_failed_flush_is_not_reported() {
    let store = InMemoryStore::new();
    store.seed_rule_group("prod-a");
    store.fail_on(StoreOperation::SaveChanges).await;
    let sink = CollectingSink::new();

    let err = reconcile(&portal().link_to_rule_group("^prod-"), &store, &sink)
        .await
        .unwrap_err();

    assert!(err.is_remote());
    assert_eq!(
        sink.messages().last().map(String::as_str),
        Some("Linking Relying Party 'portal' to Rule Group 'prod-a'")
    );
}

// ==================== Collaborator handles ====================

#[tokio::test]
async fn test_shared_store_handle_and_closure_sink() {
    let store = create_store();
    let lines = std::sync::Mutex::new(Vec::new());
    let sink = |event: &LogEvent| lines.lock().unwrap().push(event.to_string());

    reconcile(&portal().symmetric_key(vec![1; 32]), store.as_ref(), &sink)
        .await
        .unwrap();

    assert!(checks::relying_party_exists(store.as_ref(), "portal").await.unwrap());
    assert_eq!(checks::key_count(store.as_ref(), "portal").await.unwrap(), 1);
    assert_eq!(lines.lock().unwrap().len(), 2);
}
