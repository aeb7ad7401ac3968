//! Bash command evaluation
//!
//! Parses the command once, decomposes it into segments, runs the
//! substitution scan over the raw text, then checks each segment: wrappers
//! are stripped, deny rules are consulted before allow rules, and anything
//! unmatched is rejected.

use super::decision::{Decision, PatternMatch, Rejection, RejectionCode, Segment};
use crate::parser::ast;
use crate::parser::danger::DangerScan;
use crate::parser::wrapper::strip_wrappers;
use crate::rules::RuleSet;

/// Evaluate a raw command against a rule set
pub fn evaluate_command(command: &str, rules: &RuleSet) -> Decision {
    if command.trim().is_empty() {
        return Decision::from_segments(Vec::new());
    }

    let tree = match ast::parse_bash(command) {
        Ok(tree) => tree,
        Err(e) => return unparseable(command, &e),
    };
    let shell_segments = match ast::decompose_tree(&tree, command) {
        Ok(segments) => segments,
        Err(e) => return unparseable(command, &e),
    };
    let scan = DangerScan::scan(command, Some(&tree));

    // A substitution with nothing to attribute it to still blocks
    if shell_segments.is_empty() {
        if scan.is_dangerous() {
            log::debug!("substitution outside any command: {command:?}");
            return Decision::rejected(command, substitution_rejection());
        }
        return Decision::from_segments(Vec::new());
    }

    let spans: Vec<_> = shell_segments.iter().map(|s| s.span.clone()).collect();
    let flagged = scan.attribute(&spans);

    let segments = shell_segments
        .iter()
        .zip(flagged)
        .map(|(segment, dangerous)| evaluate_segment(&segment.command, dangerous, rules))
        .collect();
    Decision::from_segments(segments)
}

/// Evaluate one decomposed segment
pub fn evaluate_segment(raw: &str, dangerous: bool, rules: &RuleSet) -> Segment {
    if dangerous {
        log::debug!("segment {raw:?}: command substitution");
        return Segment::rejected(raw, raw.to_string(), Vec::new(), substitution_rejection());
    }

    let stripped = strip_wrappers(raw, rules.wrappers());
    let core = stripped.core.as_str();

    if let Some(pattern) = rules.deny().iter().find(|p| p.is_match(core)) {
        log::debug!("segment {raw:?}: denied by {}", pattern.name());
        return Segment::rejected(
            raw,
            stripped.core.clone(),
            stripped.wrappers,
            Rejection::denied_by(pattern),
        );
    }

    if let Some(pattern) = rules.allow().iter().find(|p| p.is_match(core)) {
        log::debug!("segment {raw:?}: allowed by {}", pattern.name());
        return Segment::approved(
            raw,
            stripped.core.clone(),
            stripped.wrappers,
            PatternMatch::from(pattern),
        );
    }

    log::debug!("segment {raw:?}: no matching rule");
    Segment::rejected(
        raw,
        stripped.core,
        stripped.wrappers,
        Rejection::new(RejectionCode::NoMatch),
    )
}

fn substitution_rejection() -> Rejection {
    Rejection::new(RejectionCode::CommandSubstitution)
        .with_detail("command substitution is never auto-approved")
}

fn unparseable(command: &str, err: &ast::DecomposeError) -> Decision {
    log::debug!("unparseable command {command:?}: {err}");
    Decision::rejected(
        command,
        Rejection::new(RejectionCode::Unparseable).with_detail(err.to_string()),
    )
}
