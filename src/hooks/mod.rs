//! Hook configuration data model
//!
//! Pure data: the hook record schema, the recursive trigger rule tree, their
//! YAML encoding, and an advisory linter. Nothing in here touches the
//! filesystem; see [`crate::store`] for persistence.

pub mod types;
pub mod rules;
pub mod codec;
pub mod validator;

pub use codec::{parse, serialize};
pub use rules::{MatchRule, MatchType, RuleBranches, TriggerRule};
pub use types::{Argument, ArgumentSource, Hook, HookSet, ResponseHeader};
pub use validator::{DefaultHookSetValidator, Finding, HookSetValidator, Severity};

/// Create the validator used by the CLI `check` and `save --strict` commands
pub fn create_default_validator() -> DefaultHookSetValidator {
    DefaultHookSetValidator::new()
}
