//! Approval rules for claude-approve
//!
//! Declarative rule specs, the compiled [`Pattern`] they turn into, and the
//! immutable [`RuleSet`] the engine evaluates against.

pub mod compiler;
pub mod defaults;
pub mod ruleset;

pub use compiler::CompileError;
pub use ruleset::RuleSet;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which flavour of rule produced a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    Simple,
    Command,
    Subcommand,
    Regex,
}

impl PatternType {
    pub fn as_str(self) -> &'static str {
        match self {
            PatternType::Simple => "simple",
            PatternType::Command => "command",
            PatternType::Subcommand => "subcommand",
            PatternType::Regex => "regex",
        }
    }
}

/// A declarative rule as written in the config file.
///
/// Rule authors only write regex in the `regex` variant; every other variant
/// is compiled into a matcher with all literal tokens escaped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RuleSpec {
    /// One or more bare commands, any arguments allowed
    Simple {
        name: String,
        commands: Vec<String>,
    },

    /// A command restricted to an ordered set of optional flags
    Command {
        command: String,
        #[serde(default)]
        flags: Vec<String>,
    },

    /// A command whose first non-flag word must be one of `subcommands`
    Subcommand {
        command: String,
        subcommands: Vec<String>,
        #[serde(default)]
        flags: Vec<String>,
    },

    /// A raw regular expression
    Regex {
        pattern: String,
        name: String,
    },
}

impl RuleSpec {
    pub fn simple(name: &str, commands: &[&str]) -> Self {
        RuleSpec::Simple {
            name: name.to_string(),
            commands: commands.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn command(command: &str, flags: &[&str]) -> Self {
        RuleSpec::Command {
            command: command.to_string(),
            flags: flags.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn subcommand(command: &str, subcommands: &[&str], flags: &[&str]) -> Self {
        RuleSpec::Subcommand {
            command: command.to_string(),
            subcommands: subcommands.iter().map(|s| s.to_string()).collect(),
            flags: flags.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn regex(name: &str, pattern: &str) -> Self {
        RuleSpec::Regex {
            pattern: pattern.to_string(),
            name: name.to_string(),
        }
    }

    /// Name used in reasons and error messages
    pub fn name(&self) -> &str {
        match self {
            RuleSpec::Simple { name, .. } | RuleSpec::Regex { name, .. } => name,
            RuleSpec::Command { command, .. } | RuleSpec::Subcommand { command, .. } => command,
        }
    }
}

/// The three rule lists of a rule set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleList {
    Wrapper,
    Allow,
    Deny,
}

impl fmt::Display for RuleList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuleList::Wrapper => "wrapper",
            RuleList::Allow => "allow",
            RuleList::Deny => "deny",
        })
    }
}

/// A compiled matcher plus the metadata reported when it matches
#[derive(Debug, Clone)]
pub struct Pattern {
    matcher: Regex,
    name: String,
    kind: PatternType,
    source: String,
}

impl Pattern {
    pub(crate) fn new(matcher: Regex, name: &str, kind: PatternType, source: String) -> Self {
        Self {
            matcher,
            name: name.to_string(),
            kind,
            source,
        }
    }

    /// Rule name (simple/regex rule name, or the command for other rules)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PatternType {
        self.kind
    }

    /// Human-readable rule text, e.g. `git {diff,log,status}`
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The compiled regular expression
    pub fn regex(&self) -> &str {
        self.matcher.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }

    /// Length of a non-empty match anchored at the start of `text`
    pub fn prefix_len(&self, text: &str) -> Option<usize> {
        self.matcher
            .find(text)
            .filter(|m| m.start() == 0 && m.end() > 0)
            .map(|m| m.end())
    }
}
