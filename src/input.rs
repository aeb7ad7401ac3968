//! Input parsing for Claude Code hook JSON format
//!
//! Parses the PreToolUse request that Claude Code writes to the hook's stdin.

use serde::Deserialize;

/// Main input structure from Claude Code hooks
#[derive(Debug, Deserialize)]
pub struct HookInput {
    /// Name of the tool being invoked (e.g., "Bash", "Read")
    pub tool_name: String,

    /// Tool-specific input parameters
    pub tool_input: ToolInput,

    /// Optional session identifier
    #[serde(default)]
    pub session_id: Option<String>,

    /// Working directory of the session
    #[serde(default)]
    pub cwd: Option<String>,

    /// Hook event name (e.g., "PreToolUse")
    #[serde(default)]
    pub hook_event_name: Option<String>,
}

/// Tool-specific input variants
#[derive(Debug, Clone)]
pub enum ToolInput {
    /// Bash command execution
    Bash {
        command: String,
        description: Option<String>,
        timeout: Option<u64>,
    },

    /// Any other tool, kept as raw JSON
    Other { raw: serde_json::Value },
}

impl<'de> Deserialize<'de> for ToolInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;

        if let Some(command) = value.get("command").and_then(|v| v.as_str()) {
            return Ok(ToolInput::Bash {
                command: command.to_string(),
                description: value
                    .get("description")
                    .and_then(|v| v.as_str())
                    .map(String::from),
                timeout: value.get("timeout").and_then(|v| v.as_u64()),
            });
        }

        Ok(ToolInput::Other { raw: value })
    }
}

impl HookInput {
    /// Parse input from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The command to evaluate, if this is a Bash request
    pub fn bash_command(&self) -> Option<&str> {
        match &self.tool_input {
            ToolInput::Bash { command, .. } if self.tool_name == "Bash" => Some(command),
            _ => None,
        }
    }

    /// Get a summary of the input for logging
    pub fn summary(&self) -> String {
        match self.bash_command() {
            Some(command) if command.chars().count() > 100 => {
                let truncated: String = command.chars().take(100).collect();
                format!("Bash: {truncated}...")
            }
            Some(command) => format!("Bash: {command}"),
            None => format!("{}: (not evaluated)", self.tool_name),
        }
    }
}
