//! claude-approve - Rule-based auto-approval for Claude Code Bash commands
//!
//! Decides whether a shell command can run without asking the user. A
//! command is approved only if every simple command inside it matches an
//! allow rule and none matches a deny rule; anything else is deferred.
//!
//! # Features
//!
//! - **Declarative rules**: simple, command, subcommand and regex rules
//!   compiled once into an immutable [`RuleSet`]
//! - **AST decomposition**: compound commands are split with tree-sitter-bash
//! - **Wrapper stripping**: `sudo`, `timeout 30`, `FOO=bar` and friends are
//!   removed before matching
//! - **Substitution detection**: `$(...)` and backticks are never approved,
//!   except inside quoted heredocs
//! - **Audit logging**: JSONL log of all decisions
//!
//! # Example
//!
//! ```
//! use claude_approve::{ApprovalEngine, RuleSet, RuleSpec};
//!
//! let rules = RuleSet::compile(
//!     &[RuleSpec::simple("sudo", &["sudo"])],
//!     &[RuleSpec::simple("ls", &["ls"])],
//!     &[],
//! )
//! .unwrap();
//! let engine = ApprovalEngine::new(rules);
//!
//! let decision = engine.evaluate("sudo ls -la");
//! assert!(decision.approved);
//! assert_eq!(decision.reason, "sudo + ls");
//! ```

pub mod audit;
pub mod config;
pub mod engine;
pub mod input;
pub mod output;
pub mod parser;
pub mod rules;

// Re-exports for convenience
pub use config::Config;
pub use engine::{ApprovalEngine, Decision, RejectionCode};
pub use input::{HookInput, ToolInput};
pub use output::{DeferMode, HookOutput};
pub use rules::{CompileError, PatternType, RuleSet, RuleSpec};
