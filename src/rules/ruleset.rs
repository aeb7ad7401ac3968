//! Compiled, immutable rule set

use super::compiler::{compile_rules, CompileError};
use super::{Pattern, RuleList, RuleSpec};

/// Wrapper, allow and deny patterns in declaration order.
///
/// Built once at load time and never mutated afterwards, so a single
/// instance can be shared across threads (wrap it in an `Arc`). Replacing the
/// policy means compiling a new `RuleSet`.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    wrappers: Vec<Pattern>,
    allow: Vec<Pattern>,
    deny: Vec<Pattern>,
}

impl RuleSet {
    /// Compile the three rule lists. Fails on the first incomplete or
    /// invalid rule.
    pub fn compile(
        wrappers: &[RuleSpec],
        allow: &[RuleSpec],
        deny: &[RuleSpec],
    ) -> Result<Self, CompileError> {
        Ok(Self {
            wrappers: compile_rules(RuleList::Wrapper, wrappers)?,
            allow: compile_rules(RuleList::Allow, allow)?,
            deny: compile_rules(RuleList::Deny, deny)?,
        })
    }

    /// An empty rule set: nothing is stripped, nothing is approved
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn wrappers(&self) -> &[Pattern] {
        &self.wrappers
    }

    pub fn allow(&self) -> &[Pattern] {
        &self.allow
    }

    pub fn deny(&self) -> &[Pattern] {
        &self.deny
    }

    pub fn len(&self) -> usize {
        self.wrappers.len() + self.allow.len() + self.deny.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
