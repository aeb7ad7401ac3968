//! Wrapper prefix stripping
//!
//! Handles commands like `sudo`, `timeout 30`, `FOO=bar` or `.venv/bin/`
//! that run another command. Wrappers are configured as patterns; the first
//! one (in declaration order) that matches at the start of the text is
//! removed and the scan restarts from the top until nothing matches.

use crate::rules::Pattern;

/// A segment with its wrapper prefixes removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedCommand {
    /// What is left after stripping, trimmed
    pub core: String,
    /// Names of the stripped wrappers, outermost first
    pub wrappers: Vec<String>,
}

/// Example: `sudo timeout 30 rm -rf /` → core `rm -rf /`, wrappers `[sudo, timeout]`
///
/// The word exposed by each strip is unquoted (`sudo 'rm'` → `rm`) so that
/// deny rules see the same command name the decomposer would produce.
pub fn strip_wrappers(command: &str, wrappers: &[Pattern]) -> StrippedCommand {
    let mut rest = command.trim().to_string();
    let mut names = Vec::new();

    // Every iteration consumes at least one byte and unquoting only shrinks
    // the text, so this terminates
    while let Some((pattern, len)) = wrappers
        .iter()
        .find_map(|p| p.prefix_len(&rest).map(|len| (p, len)))
    {
        names.push(pattern.name().to_string());
        rest = unquote_head(rest[len..].trim_start());
    }

    StrippedCommand {
        core: rest.trim_end().to_string(),
        wrappers: names,
    }
}

/// Byte offset where the first shell word ends
fn head_word_end(text: &str) -> usize {
    let mut quote = None;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (None | Some('"'), '\\') => escaped = true,
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, c) if c.is_whitespace() => return i,
            _ => {}
        }
    }
    text.len()
}

/// Remove quoting from a literal head word: `sh"re"d -u f` → `shred -u f`
fn unquote_head(text: &str) -> String {
    let (head, tail) = text.split_at(head_word_end(text));
    if !head.contains(['\'', '"', '\\']) || head.contains(['$', '`']) {
        return text.to_string();
    }

    match shlex::split(head) {
        Some(words) if words.len() == 1 => match shlex::try_quote(&words[0]) {
            Ok(word) if word.len() < head.len() => format!("{word}{tail}"),
            _ => text.to_string(),
        },
        _ => text.to_string(),
    }
}
