//! Output formatting for Claude Code hook responses
//!
//! Approval is the only verdict this hook gives on its own. Anything else is
//! deferred to Claude Code's normal permission flow, either silently (no
//! output) or as an explicit "ask".

use serde::Serialize;

use crate::engine::Decision;

/// Main output structure for Claude Code hooks
#[derive(Debug, Serialize)]
pub struct HookOutput {
    #[serde(rename = "hookSpecificOutput")]
    pub hook_specific_output: HookSpecificOutput,
}

/// Hook-specific output with permission decision
#[derive(Debug, Serialize)]
pub struct HookSpecificOutput {
    /// The hook event name (always "PreToolUse")
    #[serde(rename = "hookEventName")]
    pub hook_event_name: String,

    /// Permission decision: "allow" or "ask"
    #[serde(rename = "permissionDecision")]
    pub permission_decision: String,

    #[serde(rename = "permissionDecisionReason")]
    pub permission_decision_reason: String,
}

/// How a command that is not approved is handed back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeferMode {
    /// Print nothing
    #[default]
    Silent,
    /// Print an "ask" decision with the rejection summary
    Ask,
}

impl DeferMode {
    pub fn from_explicit(explicit_ask: bool) -> Self {
        if explicit_ask {
            DeferMode::Ask
        } else {
            DeferMode::Silent
        }
    }
}

impl HookOutput {
    fn new(decision: &str, reason: String) -> Self {
        HookOutput {
            hook_specific_output: HookSpecificOutput {
                hook_event_name: "PreToolUse".to_string(),
                permission_decision: decision.to_string(),
                permission_decision_reason: reason,
            },
        }
    }

    /// Create an allow response with reason
    pub fn allow(reason: &str) -> Self {
        HookOutput::new("allow", format!("[claude-approve] {reason}"))
    }

    /// Create an ask response with reason
    pub fn ask(reason: &str) -> Self {
        HookOutput::new("ask", format!("[claude-approve] {reason}"))
    }

    /// Output for a deferred request, if the mode prints anything
    pub fn defer(mode: DeferMode, reason: &str) -> Option<Self> {
        match mode {
            DeferMode::Silent => None,
            DeferMode::Ask => Some(HookOutput::ask(reason)),
        }
    }

    /// Create output from a Decision
    pub fn from_decision(decision: &Decision, mode: DeferMode) -> Option<Self> {
        if decision.approved {
            Some(HookOutput::allow(&decision.reason))
        } else {
            HookOutput::defer(mode, &decision.rejection_summary())
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Rejection, RejectionCode};

    #[test]
    fn test_allow_output() {
        let json: serde_json::Value =
            serde_json::from_str(&HookOutput::allow("git | ls").to_json()).unwrap();
        let out = &json["hookSpecificOutput"];
        assert_eq!(out["hookEventName"], "PreToolUse");
        assert_eq!(out["permissionDecision"], "allow");
        assert_eq!(out["permissionDecisionReason"], "[claude-approve] git | ls");
    }

    #[test]
    fn test_ask_output() {
        let json = HookOutput::ask("NO_MATCH: curl x").to_json();
        assert!(json.contains(r#""permissionDecision":"ask""#));
        assert!(json.contains("NO_MATCH: curl x"));
    }

    #[test]
    fn test_from_decision_approved() {
        let decision = Decision::from_segments(Vec::new());
        let output = HookOutput::from_decision(&decision, DeferMode::Silent).unwrap();
        assert_eq!(output.hook_specific_output.permission_decision, "allow");
    }

    #[test]
    fn test_from_decision_rejected() {
        let decision = Decision::rejected("curl x", Rejection::new(RejectionCode::NoMatch));
        assert!(HookOutput::from_decision(&decision, DeferMode::Silent).is_none());

        let output = HookOutput::from_decision(&decision, DeferMode::Ask).unwrap();
        assert_eq!(output.hook_specific_output.permission_decision, "ask");
        assert!(output
            .hook_specific_output
            .permission_decision_reason
            .contains("NO_MATCH: curl x"));
    }

    #[test]
    fn test_defer_mode_from_flag() {
        assert_eq!(DeferMode::from_explicit(false), DeferMode::Silent);
        assert_eq!(DeferMode::from_explicit(true), DeferMode::Ask);
        assert_eq!(DeferMode::default(), DeferMode::Silent);
    }
}
