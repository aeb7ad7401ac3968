//! Evaluation results
//!
//! A [`Decision`] always carries one [`Segment`] per evaluated command, so a
//! caller can see exactly which part of a compound command blocked approval
//! and why.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::rules::{Pattern, PatternType};

/// Why a segment was not approved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionCode {
    /// `$(...)`, backticks or process substitution
    CommandSubstitution,
    /// The command could not be parsed
    Unparseable,
    /// A deny rule matched
    DenyMatch,
    /// No allow rule matched
    NoMatch,
}

impl RejectionCode {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectionCode::CommandSubstitution => "COMMAND_SUBSTITUTION",
            RejectionCode::Unparseable => "UNPARSEABLE",
            RejectionCode::DenyMatch => "DENY_MATCH",
            RejectionCode::NoMatch => "NO_MATCH",
        }
    }
}

impl fmt::Display for RejectionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The rule that matched a segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternMatch {
    #[serde(rename = "type")]
    pub kind: PatternType,
    pub name: String,
    pub pattern: String,
}

impl From<&Pattern> for PatternMatch {
    fn from(pattern: &Pattern) -> Self {
        Self {
            kind: pattern.kind(),
            name: pattern.name().to_string(),
            pattern: pattern.source().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub code: RejectionCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Rejection {
    pub fn new(code: RejectionCode) -> Self {
        Self {
            code,
            name: None,
            pattern: None,
            detail: None,
        }
    }

    /// A deny rule hit, naming the rule
    pub fn denied_by(pattern: &Pattern) -> Self {
        Self {
            code: RejectionCode::DenyMatch,
            name: Some(pattern.name().to_string()),
            pattern: Some(pattern.source().to_string()),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        if let Some(name) = &self.name {
            write!(f, " ({name})")?;
        }
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Approved(PatternMatch),
    Rejected(Rejection),
}

/// One evaluated command of a compound command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// The command as produced by the decomposer
    pub raw: String,
    /// What remained after wrapper stripping
    pub core: String,
    /// Stripped wrapper names, outermost first
    pub wrappers: Vec<String>,
    pub outcome: Outcome,
}

impl Segment {
    pub fn approved(raw: &str, core: String, wrappers: Vec<String>, matched: PatternMatch) -> Self {
        Self {
            raw: raw.to_string(),
            core,
            wrappers,
            outcome: Outcome::Approved(matched),
        }
    }

    pub fn rejected(raw: &str, core: String, wrappers: Vec<String>, rejection: Rejection) -> Self {
        Self {
            raw: raw.to_string(),
            core,
            wrappers,
            outcome: Outcome::Rejected(rejection),
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self.outcome, Outcome::Approved(_))
    }

    pub fn matched(&self) -> Option<&PatternMatch> {
        match &self.outcome {
            Outcome::Approved(m) => Some(m),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match &self.outcome {
            Outcome::Approved(_) => None,
            Outcome::Rejected(r) => Some(r),
        }
    }

    /// `sudo+timeout + cargo` for an approved segment
    pub fn reason(&self) -> Option<String> {
        let matched = self.matched()?;
        if self.wrappers.is_empty() {
            Some(matched.name.clone())
        } else {
            Some(format!("{} + {}", self.wrappers.join("+"), matched.name))
        }
    }
}

/// Flat view used for JSON output and audit records
#[derive(Serialize)]
struct SegmentRecord<'a> {
    command: &'a str,
    core: &'a str,
    approved: bool,
    wrappers: &'a [String],
    #[serde(rename = "match")]
    matched: Option<&'a PatternMatch>,
    rejection: Option<&'a Rejection>,
}

impl Serialize for Segment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SegmentRecord {
            command: &self.raw,
            core: &self.core,
            approved: self.is_approved(),
            wrappers: &self.wrappers,
            matched: self.matched(),
            rejection: self.rejection(),
        }
        .serialize(serializer)
    }
}

/// Aggregate verdict for a whole command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// True only if every segment was approved
    pub approved: bool,
    pub segments: Vec<Segment>,
    /// Per-segment reasons joined with ` | `; empty unless approved
    pub reason: String,
}

impl Decision {
    /// Aggregate segment results. No segments means an empty command,
    /// which is approved.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        if segments.is_empty() {
            return Self {
                approved: true,
                segments,
                reason: "empty command".to_string(),
            };
        }

        let approved = segments.iter().all(Segment::is_approved);
        let reason = if approved {
            segments
                .iter()
                .filter_map(Segment::reason)
                .collect::<Vec<_>>()
                .join(" | ")
        } else {
            String::new()
        };

        Self {
            approved,
            segments,
            reason,
        }
    }

    /// A single rejected segment covering the whole command
    pub fn rejected(command: &str, rejection: Rejection) -> Self {
        let command = command.trim();
        Self::from_segments(vec![Segment::rejected(
            command,
            command.to_string(),
            Vec::new(),
            rejection,
        )])
    }

    pub fn rejected_segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| !s.is_approved())
    }

    /// One line per rejected segment, for humans
    pub fn rejection_summary(&self) -> String {
        self.rejected_segments()
            .filter_map(|s| s.rejection().map(|r| format!("{r}: {}", s.raw)))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
