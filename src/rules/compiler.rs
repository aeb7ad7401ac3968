//! Rule compilation
//!
//! Turns declarative [`RuleSpec`]s into regex-backed [`Pattern`]s. All literal
//! tokens (commands, flags, subcommands) are escaped before insertion, so rule
//! input is never interpreted as regex syntax outside the `regex` rule type.

use regex::Regex;
use thiserror::Error;

use super::{Pattern, PatternType, RuleList, RuleSpec};

/// Either trailing whitespace or the end of the text
const TOKEN_END: &str = r"(?:\s+|$)";

/// Error while compiling a rule list
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{list}[{index}] ({name}): {problem}")]
    Incomplete {
        list: RuleList,
        index: usize,
        name: String,
        problem: &'static str,
    },

    #[error("{list}[{index}] ({name}): invalid regex: {source}")]
    InvalidRegex {
        list: RuleList,
        index: usize,
        name: String,
        #[source]
        source: regex::Error,
    },
}

/// Escape a literal token. Inner whitespace matches any run of whitespace,
/// so a subcommand like `pr list` still matches `pr  list`.
fn literal(token: &str) -> String {
    token
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}

/// Word boundary after a literal. `\b` cannot follow a non-word character
/// like `[`, so those literals end at whitespace or end of text instead.
fn boundary(token: &str) -> &'static str {
    match token.trim_end().chars().last() {
        Some(c) if c.is_alphanumeric() || c == '_' => r"\b",
        _ => r"(?:\s|$)",
    }
}

fn is_placeholder(token: &str) -> bool {
    token.len() > 2 && token.starts_with('<') && token.ends_with('>')
}

/// `^cmd\b`: the command followed by anything
pub fn build_simple_pattern(cmd: &str) -> String {
    format!("^{}{}", literal(cmd), boundary(cmd))
}

/// Compile one entry of the flag mini-language into an optional group.
///
/// - `""` → no constraint
/// - `"<arg>"` → one optional positional token
/// - `"-f"` → optional literal flag
/// - `"-n <arg>"` → optional flag with an argument, glued (`-n10`) or not (`-n 10`)
pub fn build_flag_pattern(spec: &str) -> String {
    let parts: Vec<&str> = spec.split_whitespace().collect();
    match parts.as_slice() {
        [] => String::new(),
        [arg] if is_placeholder(arg) => format!(r"(?:\S+{TOKEN_END})?"),
        [flag, arg] if is_placeholder(arg) => {
            format!(r"(?:{}\s*\S+{TOKEN_END})?", regex::escape(flag))
        }
        _ => format!("(?:{}{TOKEN_END})?", literal(spec)),
    }
}

fn build_flags(flags: &[String]) -> String {
    flags.iter().map(|f| build_flag_pattern(f)).collect()
}

/// `^cmd [flags...]$`: only the listed flags, in the listed order
pub fn build_command_pattern(cmd: &str, flags: &[String]) -> String {
    format!("^{}{TOKEN_END}{}$", literal(cmd), build_flags(flags))
}

/// `^cmd\s+[flags...](sub1|sub2)\b`
pub fn build_subcommand_pattern(cmd: &str, subs: &[String], flags: &[String]) -> String {
    let alternatives: Vec<String> = subs
        .iter()
        .map(|s| format!("{}{}", literal(s), boundary(s)))
        .collect();
    format!(
        r"^{}\s+{}(?:{})",
        literal(cmd),
        build_flags(flags),
        alternatives.join("|")
    )
}

/// `^cmd\s+[flags...]`: a prefix to strip, not a full match
pub fn build_wrapper_pattern(cmd: &str, flags: &[String]) -> String {
    format!(r"^{}\s+{}", literal(cmd), build_flags(flags))
}

fn describe_flags(flags: &[String]) -> String {
    flags
        .iter()
        .filter(|f| !f.trim().is_empty())
        .map(|f| format!(" [{}]", f.trim()))
        .collect()
}

/// Compile a whole rule list. Wrapper lists compile to prefix matchers,
/// allow/deny lists to full-command matchers.
pub fn compile_rules(list: RuleList, specs: &[RuleSpec]) -> Result<Vec<Pattern>, CompileError> {
    let mut patterns = Vec::with_capacity(specs.len());
    for (index, spec) in specs.iter().enumerate() {
        compile_rule(list, index, spec, &mut patterns)?;
    }
    Ok(patterns)
}

fn compile_rule(
    list: RuleList,
    index: usize,
    spec: &RuleSpec,
    out: &mut Vec<Pattern>,
) -> Result<(), CompileError> {
    let incomplete = |problem: &'static str| CompileError::Incomplete {
        list,
        index,
        name: display_name(spec),
        problem,
    };
    let compile = |pattern: &str| {
        Regex::new(pattern).map_err(|source| CompileError::InvalidRegex {
            list,
            index,
            name: display_name(spec),
            source,
        })
    };
    let wrapper = list == RuleList::Wrapper;

    match spec {
        RuleSpec::Simple { name, commands } => {
            if name.trim().is_empty() {
                return Err(incomplete("simple rule has no name"));
            }
            if commands.is_empty() {
                return Err(incomplete("simple rule has no commands"));
            }
            for cmd in commands {
                if cmd.trim().is_empty() {
                    return Err(incomplete("simple rule has an empty command"));
                }
                let regex = if wrapper {
                    build_wrapper_pattern(cmd, &[])
                } else {
                    build_simple_pattern(cmd)
                };
                out.push(Pattern::new(
                    compile(&regex)?,
                    name,
                    PatternType::Simple,
                    cmd.trim().to_string(),
                ));
            }
        }
        RuleSpec::Command { command, flags } => {
            if command.trim().is_empty() {
                return Err(incomplete("command rule has no command"));
            }
            let regex = if wrapper {
                build_wrapper_pattern(command, flags)
            } else {
                build_command_pattern(command, flags)
            };
            out.push(Pattern::new(
                compile(&regex)?,
                command.trim(),
                PatternType::Command,
                format!("{}{}", command.trim(), describe_flags(flags)),
            ));
        }
        RuleSpec::Subcommand {
            command,
            subcommands,
            flags,
        } => {
            if command.trim().is_empty() {
                return Err(incomplete("subcommand rule has no command"));
            }
            if subcommands.is_empty() {
                return Err(incomplete("subcommand rule has no subcommands"));
            }
            if subcommands.iter().any(|s| s.trim().is_empty()) {
                return Err(incomplete("subcommand rule has an empty subcommand"));
            }
            let mut regex = build_subcommand_pattern(command, subcommands, flags);
            if wrapper {
                regex.push_str(r"\s+");
            }
            out.push(Pattern::new(
                compile(&regex)?,
                command.trim(),
                PatternType::Subcommand,
                format!(
                    "{}{} {{{}}}",
                    command.trim(),
                    describe_flags(flags),
                    subcommands.join(",")
                ),
            ));
        }
        RuleSpec::Regex { pattern, name } => {
            if name.trim().is_empty() {
                return Err(incomplete("regex rule has no name"));
            }
            if pattern.is_empty() {
                return Err(incomplete("regex rule has no pattern"));
            }
            out.push(Pattern::new(
                compile(pattern)?,
                name,
                PatternType::Regex,
                pattern.clone(),
            ));
        }
    }

    Ok(())
}

fn display_name(spec: &RuleSpec) -> String {
    match spec.name().trim() {
        "" => "<unnamed>".to_string(),
        name => name.to_string(),
    }
}
