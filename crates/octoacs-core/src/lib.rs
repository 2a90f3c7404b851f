//! Declarative relying party reconciliation.
//!
//! An operator describes the desired relying parties, rule groups and rules
//! with chained spec builders. The specs compile to an ordered list of
//! [`Command`]s, and the executor applies them to a [`ManagementStore`]:
//!
//! - existing resources are replaced by delete-then-recreate
//! - keys and, on request, linked rule groups go with a replaced relying party
//! - queued deletes and links are committed once per phase
//! - rule groups are relinked by regular expression over the full paged listing
//!
//! Each successful step is reported to a caller-supplied [`LogSink`].
//!
//! # Example
//!
//! ```ignore
//! use octoacs_core::{reconcile, CollectingSink, NamespaceSpec};
//!
//! let namespace = NamespaceSpec::default()
//!     .rule_group(|group| {
//!         group
//!             .name("portal-claims")
//!             .rule(|rule| rule.description("email").input_claim_type("email").passthrough())
//!     })
//!     .relying_party(|rp| {
//!         rp.name("portal")
//!             .realm_address("https://portal.example.com/")
//!             .allow_identity_provider("Google")
//!             .link_to_rule_group("^portal-")
//!     });
//!
//! let sink = CollectingSink::new();
//! reconcile(&namespace, store.as_ref(), &sink).await?;
//! for line in sink.messages() {
//!     println!("{line}");
//! }
//! ```
//!
//! [`ManagementStore`]: octoacs_store::ManagementStore

pub mod checks;
pub mod command;
pub mod config;
pub mod error;
pub mod executor;
pub mod log;
pub mod observability;
pub mod spec;

pub use command::Command;
pub use crate::config::{ConfigError, ReconcileConfig, load_config};
pub use error::{ErrorCategory, ReconcileError, ReconcileResult};
pub use executor::{
    DEFAULT_TOKEN_LIFETIME_SECS, ReconcileReport, ReconcileSettings, reconcile, reconcile_with,
};
pub use log::{CollectingSink, LogEvent, LogSink, NullSink, TracingSink};
pub use spec::{
    CompileCommands, NamespaceSpec, RelyingPartySpec, RuleGroupSpec, RuleSpec,
    SigningCertificateSpec,
};

// Re-export the store contract for convenience
pub use octoacs_store::{DynStore, ManagementStore, StoreError, TokenType};
