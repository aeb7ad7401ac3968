//! claude-approve - Auto-approval hook for Claude Code Bash commands
//!
//! Approves commands whose every segment matches an allow rule; anything
//! else is handed back to Claude Code's normal permission prompt.
//!
//! # Usage
//!
//! ```bash
//! # As a Claude Code hook (reads JSON from stdin, writes JSON to stdout)
//! echo '{"tool_name":"Bash","tool_input":{"command":"git status && ls"}}' | claude-approve
//!
//! # Evaluate a command directly and print the full decision
//! claude-approve --check 'sudo timeout 30 cargo test'
//! ```

use std::env;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};

use claude_approve::{
    audit::AuditLogger,
    config::{Config, ConfigError},
    engine::ApprovalEngine,
    input::HookInput,
    output::{DeferMode, HookOutput},
};

/// Print version information
fn print_version() {
    println!("claude-approve {}", env!("CARGO_PKG_VERSION"));
}

/// Print help message
fn print_help() {
    println!(
        r#"claude-approve - Auto-approval hook for Claude Code Bash commands

USAGE:
    claude-approve [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -v, --version           Print version information
    -c, --config PATH       Path to config file
        --explicit-ask      Answer "ask" instead of staying silent
        --check COMMAND     Evaluate COMMAND and print the decision as JSON
                            (exit status 0 if approved, 1 otherwise)

CONFIG SEARCH ORDER:
    ~/.claude/approve/config.toml
    /etc/claude-approve/config.toml
    built-in defaults

USAGE AS HOOK:
    Configure in ~/.claude/settings.json:
    {{
      "hooks": {{
        "PreToolUse": [{{
          "matcher": "Bash",
          "hooks": [{{
            "type": "command",
            "command": "~/.claude/approve/claude-approve",
            "timeout": 5000
          }}]
        }}]
      }}
    }}
"#
    );
}

/// Parse command line arguments
struct Args {
    help: bool,
    version: bool,
    explicit_ask: bool,
    config_path: Option<String>,
    check: Option<String>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut result = Args {
            help: false,
            version: false,
            explicit_ask: false,
            config_path: None,
            check: None,
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "-h" | "--help" => result.help = true,
                "-v" | "--version" => result.version = true,
                "--explicit-ask" => result.explicit_ask = true,
                "-c" | "--config" => {
                    if i + 1 < args.len() {
                        i += 1;
                        result.config_path = Some(args[i].clone());
                    }
                }
                "--check" => {
                    if i + 1 < args.len() {
                        i += 1;
                        result.check = Some(args[i].clone());
                    }
                }
                arg if arg.starts_with("--config=") => {
                    let path = arg.trim_start_matches("--config=");
                    result.config_path = Some(path.to_string());
                }
                arg if arg.starts_with("--check=") => {
                    let command = arg.trim_start_matches("--check=");
                    result.check = Some(command.to_string());
                }
                _ => {}
            }
            i += 1;
        }

        result
    }
}

/// Logs go to stderr; stdout carries the hook protocol. The logger accepts
/// everything and `log::max_level` does the filtering.
fn init_logging(level: LevelFilter) {
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .build();
    let _ = TermLogger::init(
        LevelFilter::Trace,
        config,
        TerminalMode::Stderr,
        ColorChoice::Never,
    );
    log::set_max_level(level);
}

fn load_config(args: &Args) -> Result<Config, ConfigError> {
    match args.config_path {
        Some(ref path) => Config::load_from(Path::new(path)),
        None => Config::load(),
    }
}

/// Nothing is approved without a usable policy. Hook output is only read on
/// a zero exit status.
fn refuse(args: &Args, mode: DeferMode, reason: &str) -> ExitCode {
    log::error!("{reason}");
    if args.check.is_some() {
        return ExitCode::FAILURE;
    }
    emit(HookOutput::defer(mode, reason));
    ExitCode::SUCCESS
}

fn emit(output: Option<HookOutput>) {
    if let Some(output) = output {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        let _ = writeln!(handle, "{}", output.to_json());
        let _ = handle.flush();
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Handle help and version
    if args.help {
        print_help();
        return ExitCode::SUCCESS;
    }

    if args.version {
        print_version();
        return ExitCode::SUCCESS;
    }

    // Logging starts at the default level and is adjusted once the config
    // is known
    init_logging(LevelFilter::Warn);
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            let mode = DeferMode::from_explicit(args.explicit_ask);
            return refuse(&args, mode, &format!("invalid config: {e}"));
        }
    };
    log::set_max_level(config.log_level());

    let mode = DeferMode::from_explicit(args.explicit_ask || config.general.explicit_ask);

    let engine = match ApprovalEngine::from_config(&config) {
        Ok(engine) => engine,
        Err(e) => return refuse(&args, mode, &format!("invalid rule set: {e}")),
    };

    if let Some(command) = args.check {
        let decision = engine.evaluate(&command);
        match serde_json::to_string_pretty(&decision) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("failed to serialize decision: {e}"),
        }
        return if decision.approved {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    // Read JSON from stdin
    let mut input_json = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut input_json) {
        log::error!("failed to read hook input: {e}");
        emit(HookOutput::defer(mode, "unreadable hook input"));
        return ExitCode::SUCCESS;
    }

    // No input, no opinion
    if input_json.trim().is_empty() {
        return ExitCode::SUCCESS;
    }

    // Malformed input is deferred, never approved
    let input = match HookInput::from_json(&input_json) {
        Ok(input) => input,
        Err(e) => {
            log::error!("failed to parse hook input: {e}");
            emit(HookOutput::defer(mode, "malformed hook input"));
            return ExitCode::SUCCESS;
        }
    };

    let Some(command) = input.bash_command() else {
        log::debug!("ignoring {}", input.summary());
        return ExitCode::SUCCESS;
    };

    let start = Instant::now();
    let decision = engine.evaluate(command);
    let elapsed = start.elapsed();
    log::info!(
        "{} -> {}",
        input.summary(),
        if decision.approved { "approved" } else { "deferred" }
    );

    if config.general.audit_log {
        let mut logger = AuditLogger::new(config.audit_path().as_deref());
        if let Err(e) = logger.log_decision(&input, command, &decision, elapsed) {
            log::warn!("failed to write audit log: {e}");
        }
    }

    emit(HookOutput::from_decision(&decision, mode));
    ExitCode::SUCCESS
}
