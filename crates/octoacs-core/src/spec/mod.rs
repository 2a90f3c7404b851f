//! Declarative specs and the compiler that turns them into commands.
//!
//! Specs are consuming value builders: every configuration method takes the
//! spec by value and returns it updated. Nested specs are configured through
//! plain `FnOnce(Child) -> Child` callbacks and owned by their parent.

mod namespace;
mod relying_party;
mod rule_group;
mod signing_certificate;

pub use namespace::NamespaceSpec;
pub use relying_party::RelyingPartySpec;
pub use rule_group::{RuleGroupSpec, RuleSpec};
pub use signing_certificate::SigningCertificateSpec;

use crate::command::Command;

/// Compiles a spec into the ordered commands that realise it.
///
/// Compilation is pure: it never touches the store and always yields the same
/// commands for the same spec.
pub trait CompileCommands {
    /// Returns the commands for this spec and its nested specs, depth first.
    fn compile(&self) -> Vec<Command>;
}

impl CompileCommands for [Command] {
    fn compile(&self) -> Vec<Command> {
        self.to_vec()
    }
}

impl CompileCommands for Vec<Command> {
    fn compile(&self) -> Vec<Command> {
        self.clone()
    }
}
