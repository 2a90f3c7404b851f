//! Reconciliation executor.
//!
//! Applies compiled commands in order against a [`ManagementStore`], replacing
//! existing resources by delete-then-recreate and batching queued writes so
//! that each phase is committed by a single `save_changes` call.
//!
//! Every remote call is awaited before the next one starts; a run never
//! spawns tasks. A failed call ends the run with nothing rolled back, so a
//! relying party torn down just before a failed creation stays removed until
//! the run is repeated.

mod relying_party;
mod rule_group;

use octoacs_store::{ManagementStore, ResourceKind};
use serde::Serialize;

use crate::command::Command;
use crate::error::{ReconcileError, ReconcileResult};
use crate::log::{LogEvent, LogSink};
use crate::spec::CompileCommands;

/// Token lifetime in seconds used when a spec leaves it at zero.
pub const DEFAULT_TOKEN_LIFETIME_SECS: u32 = 600;

/// Tunables for a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileSettings {
    /// Token lifetime in seconds substituted for an unset (zero) lifetime.
    pub default_token_lifetime: u32,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            default_token_lifetime: DEFAULT_TOKEN_LIFETIME_SECS,
        }
    }
}

impl ReconcileSettings {
    /// Resolves a requested token lifetime, substituting the default for zero.
    #[must_use]
    pub fn token_lifetime(&self, requested: u32) -> u32 {
        if requested == 0 {
            self.default_token_lifetime
        } else {
            requested
        }
    }
}

/// Summary of a completed reconciliation run.
///
/// Resources are recorded as `Kind/name`; rules as `Rule/group/description`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Number of commands executed.
    pub commands: usize,
    pub created: Vec<String>,
    pub deleted: Vec<String>,
    /// Rule groups linked, as `relying party -> rule group`.
    pub linked: Vec<String>,
    /// Number of `save_changes` batches committed.
    pub batches: usize,
}

impl ReconcileReport {
    fn record_created(&mut self, kind: ResourceKind, name: &str) {
        self.created.push(format!("{kind}/{name}"));
    }

    fn record_deleted(&mut self, kind: ResourceKind, name: &str) {
        self.deleted.push(format!("{kind}/{name}"));
    }
}

/// Compiles `spec` and reconciles the store against it with default settings.
///
/// # Example
///
/// ```ignore
/// use octoacs_core::{reconcile, RelyingPartySpec, TracingSink};
///
/// let spec = RelyingPartySpec::default()
///     .name("portal")
///     .realm_address("https://portal.example.com/")
///     .link_to_rule_group("^portal-");
///
/// let report = reconcile(&spec, store.as_ref(), &TracingSink).await?;
/// println!("{} batches committed", report.batches);
/// ```
pub async fn reconcile<S>(
    spec: &S,
    store: &dyn ManagementStore,
    sink: &dyn LogSink,
) -> ReconcileResult<ReconcileReport>
where
    S: CompileCommands + ?Sized,
{
    reconcile_with(spec, store, sink, &ReconcileSettings::default()).await
}

/// Compiles `spec` and reconciles the store against it.
pub async fn reconcile_with<S>(
    spec: &S,
    store: &dyn ManagementStore,
    sink: &dyn LogSink,
    settings: &ReconcileSettings,
) -> ReconcileResult<ReconcileReport>
where
    S: CompileCommands + ?Sized,
{
    let commands = spec.compile();
    tracing::debug!(
        backend = store.backend_name(),
        commands = commands.len(),
        "Starting reconciliation"
    );

    let report = Executor::new(store, sink, settings).run(&commands).await?;

    tracing::info!(
        backend = store.backend_name(),
        commands = report.commands,
        created = report.created.len(),
        deleted = report.deleted.len(),
        linked = report.linked.len(),
        batches = report.batches,
        "Reconciliation completed"
    );

    Ok(report)
}

pub(crate) struct Executor<'a> {
    store: &'a dyn ManagementStore,
    sink: &'a dyn LogSink,
    settings: &'a ReconcileSettings,
    report: ReconcileReport,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(
        store: &'a dyn ManagementStore,
        sink: &'a dyn LogSink,
        settings: &'a ReconcileSettings,
    ) -> Self {
        Self {
            store,
            sink,
            settings,
            report: ReconcileReport::default(),
        }
    }

    pub(crate) async fn run(mut self, commands: &[Command]) -> ReconcileResult<ReconcileReport> {
        for command in commands {
            tracing::debug!(%command, "Executing command");
            if let Err(err) = self.execute(command).await {
                tracing::warn!(
                    %command,
                    category = %err.category(),
                    error = %err,
                    "Reconciliation failed"
                );
                return Err(err);
            }
            self.report.commands += 1;
        }
        Ok(self.report)
    }

    async fn execute(&mut self, command: &Command) -> ReconcileResult<()> {
        match command {
            Command::AddRelyingParty(command) => self.add_relying_party(command).await,
            Command::RemoveRelyingParty(command) => self.remove_relying_party(command).await,
            Command::AddRuleGroup(command) => self.add_rule_group(command).await,
            Command::AddRule(command) => self.add_rule(command).await,
            Command::RemoveRuleGroup(command) => self.remove_rule_group(command).await,
        }
    }

    fn emit(&self, event: LogEvent) {
        self.sink.log(&event);
    }

    /// Reports a write the store applied on its own.
    fn applied(&self) {
        self.emit(LogEvent::ChangesSaved);
    }

    /// Commits queued deletes and links as one batch.
    async fn save_changes(&mut self) -> ReconcileResult<()> {
        let committed = self.store.save_changes().await?;
        self.report.batches += 1;
        tracing::trace!(committed, "Queued changes committed");
        self.emit(LogEvent::ChangesSaved);
        Ok(())
    }
}

/// Returns the only item, or a precondition violation naming how many matched.
fn exactly_one<T>(kind: ResourceKind, name: &str, items: Vec<T>) -> ReconcileResult<T> {
    let found = items.len();
    let mut items = items.into_iter();
    match (items.next(), items.next()) {
        (Some(item), None) => Ok(item),
        _ => Err(ReconcileError::precondition(kind, name, found)),
    }
}

/// Like [`exactly_one`], but zero matches is `None`.
fn at_most_one<T>(kind: ResourceKind, name: &str, items: Vec<T>) -> ReconcileResult<Option<T>> {
    if items.is_empty() {
        return Ok(None);
    }
    exactly_one(kind, name, items).map(Some)
}

fn required<'c>(value: Option<&'c str>, resource: &str, field: &str) -> ReconcileResult<&'c str> {
    value
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ReconcileError::missing_field(resource, field))
}
