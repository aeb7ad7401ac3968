//! Approval engine for claude-approve
//!
//! Holds a compiled, immutable rule set and evaluates commands against it.

pub mod bash;
pub mod decision;

pub use decision::{Decision, Outcome, PatternMatch, Rejection, RejectionCode, Segment};

use std::sync::Arc;

use crate::config::Config;
use crate::input::HookInput;
use crate::rules::{CompileError, RuleSet};

/// Evaluates commands against one rule set. Cheap to clone and safe to
/// share between threads.
#[derive(Debug, Clone)]
pub struct ApprovalEngine {
    rules: Arc<RuleSet>,
}

impl ApprovalEngine {
    pub fn new(rules: RuleSet) -> Self {
        Self::from_shared(Arc::new(rules))
    }

    pub fn from_shared(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    /// Compile the config's rule lists
    pub fn from_config(config: &Config) -> Result<Self, CompileError> {
        Ok(Self::new(config.compile()?))
    }

    /// Evaluate a raw command
    pub fn evaluate(&self, command: &str) -> Decision {
        bash::evaluate_command(command, &self.rules)
    }

    /// Evaluate a hook request. Only Bash commands get a decision.
    pub fn check(&self, input: &HookInput) -> Option<Decision> {
        input.bash_command().map(|command| self.evaluate(command))
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn shared_rules(&self) -> Arc<RuleSet> {
        Arc::clone(&self.rules)
    }
}
