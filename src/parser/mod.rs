//! Shell parsing for claude-approve
//!
//! Decomposes commands into segments (AST-based), detects command
//! substitution, and strips wrapper prefixes.

pub mod ast;
pub mod danger;
pub mod wrapper;

pub use ast::{decompose, DecomposeError, ShellSegment};
pub use danger::DangerScan;
pub use wrapper::{strip_wrappers, StrippedCommand};
