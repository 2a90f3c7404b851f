//! Progress events and the sinks that receive them.
//!
//! The executor reports every successful side-effecting step to a
//! [`LogSink`] injected by the caller. Events are delivered synchronously and
//! in program order; failures never reach the sink.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

/// One observable reconciliation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    /// A rule group deletion was queued.
    RemovingRuleGroup { name: String },
    /// A relying party key deletion was queued.
    RemovingKey { display_name: String },
    /// A relying party was removed.
    RemovingRelyingParty { name: String },
    /// A relying party was created.
    AddingRelyingParty { name: String },
    /// A rule group was created.
    AddingRuleGroup { name: String },
    /// A rule was created.
    AddingRule {
        rule_group: String,
        description: String,
    },
    /// A relying party to rule group link was queued.
    Linking {
        relying_party: String,
        rule_group: String,
    },
    /// Pending changes were committed.
    ChangesSaved,
}

impl LogEvent {
    /// Returns the human-readable message for this event.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Returns `true` for events reporting a removal.
    #[must_use]
    pub fn is_removal(&self) -> bool {
        matches!(
            self,
            Self::RemovingRuleGroup { .. }
                | Self::RemovingKey { .. }
                | Self::RemovingRelyingParty { .. }
        )
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemovingRuleGroup { name } => write!(f, "Removing Rule Group '{name}'"),
            Self::RemovingKey { display_name } => write!(f, "Removing Key '{display_name}'"),
            Self::RemovingRelyingParty { name } => write!(f, "Removing Relying Party '{name}'"),
            Self::AddingRelyingParty { name } => write!(f, "Adding Relying Party '{name}'"),
            Self::AddingRuleGroup { name } => write!(f, "Adding Rule Group '{name}'"),
            Self::AddingRule {
                rule_group,
                description,
            } => write!(f, "Adding Rule '{description}' to Rule Group '{rule_group}'"),
            Self::Linking {
                relying_party,
                rule_group,
            } => write!(
                f,
                "Linking Relying Party '{relying_party}' to Rule Group '{rule_group}'"
            ),
            Self::ChangesSaved => write!(f, "Saving changes"),
        }
    }
}

/// Receives reconciliation progress events.
///
/// Any `Fn(&LogEvent) + Send + Sync` closure is a sink.
pub trait LogSink: Send + Sync {
    /// Called once per successful step, in program order.
    fn log(&self, event: &LogEvent);
}

impl<F> LogSink for F
where
    F: Fn(&LogEvent) + Send + Sync,
{
    fn log(&self, event: &LogEvent) {
        self(event)
    }
}

/// Forwards events to `tracing` at info level under the `octoacs::audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, event: &LogEvent) {
        tracing::info!(target: "octoacs::audit", ?event, "{event}");
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _event: &LogEvent) {}
}

/// Keeps every event in memory, for audit reports and tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<LogEvent>>,
}

impl CollectingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the events received so far.
    pub fn events(&self) -> Vec<LogEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the messages received so far.
    pub fn messages(&self) -> Vec<String> {
        self.events().iter().map(LogEvent::message).collect()
    }

    /// Returns how many events equal `event`.
    pub fn count(&self, event: &LogEvent) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }
}

impl LogSink for CollectingSink {
    fn log(&self, event: &LogEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
