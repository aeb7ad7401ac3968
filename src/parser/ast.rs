//! AST-based command decomposition using tree-sitter-bash
//!
//! Splits a raw command into the simple commands it would execute, in source
//! order. The walker is a total match over node kinds: a construct it does
//! not know is an error, never a silently skipped subtree.

use std::ops::Range;

use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};

/// Deepest statement nesting the walker follows before giving up
pub const MAX_NESTING_DEPTH: usize = 128;

/// One executable unit of a (possibly compound) command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSegment {
    /// Canonical single-line rendering of the command
    pub command: String,
    /// Byte range of the command in the original text
    pub span: Range<usize>,
}

/// Why a command could not be decomposed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecomposeError {
    #[error("failed to load tree-sitter-bash language")]
    Language,

    #[error("failed to parse command")]
    ParseFailed,

    #[error("syntax error at byte {0}")]
    Syntax(usize),

    #[error("unsupported shell construct: {0}")]
    Unsupported(&'static str),

    #[error("command nesting exceeds {MAX_NESTING_DEPTH} levels")]
    TooDeep,
}

/// Parse bash source with tree-sitter
pub fn parse_bash(source: &str) -> Result<Tree, DecomposeError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_bash::LANGUAGE.into())
        .map_err(|_| DecomposeError::Language)?;
    parser.parse(source, None).ok_or(DecomposeError::ParseFailed)
}

/// Parse and decompose a command. Empty input yields no segments.
pub fn decompose(source: &str) -> Result<Vec<ShellSegment>, DecomposeError> {
    if source.trim().is_empty() {
        return Ok(Vec::new());
    }
    let tree = parse_bash(source)?;
    decompose_tree(&tree, source)
}

/// Decompose an already-parsed tree
pub fn decompose_tree(tree: &Tree, source: &str) -> Result<Vec<ShellSegment>, DecomposeError> {
    let root = tree.root_node();
    if root.has_error() {
        return Err(DecomposeError::Syntax(first_error_offset(&root).unwrap_or(0)));
    }

    let mut walker = Walker {
        source,
        segments: Vec::new(),
    };
    walker.statement(root, 0)?;
    Ok(walker.segments)
}

fn first_error_offset(node: &Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_byte());
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .iter()
        .filter(|c| c.has_error() || c.is_missing())
        .find_map(first_error_offset)
}

/// Statements that become exactly one segment
fn is_leaf(node: &Node) -> bool {
    match node.kind() {
        "command" | "declaration_command" | "unset_command" | "test_command"
        | "variable_assignment" | "variable_assignments" => true,
        "compound_statement" => is_arithmetic(node),
        _ => false,
    }
}

/// `(( expr ))` in statement position
fn is_arithmetic(node: &Node) -> bool {
    let mut cursor = node.walk();
    let first = node.children(&mut cursor).next();
    first.is_some_and(|c| c.kind() == "((")
}

/// Words, expressions and other non-statement nodes
fn is_operand(kind: &str) -> bool {
    matches!(
        kind,
        "word"
            | "string"
            | "raw_string"
            | "ansi_c_string"
            | "translated_string"
            | "string_content"
            | "concatenation"
            | "number"
            | "simple_expansion"
            | "expansion"
            | "command_substitution"
            | "process_substitution"
            | "arithmetic_expansion"
            | "brace_expression"
            | "array"
            | "variable_name"
            | "special_variable_name"
            | "subscript"
            | "command_name"
            | "comment"
            | "extglob_pattern"
            | "regex"
            | "test_operator"
            | "binary_expression"
            | "unary_expression"
            | "ternary_expression"
            | "postfix_expression"
            | "parenthesized_expression"
            | "heredoc_start"
            | "heredoc_body"
            | "heredoc_content"
            | "heredoc_end"
            | "file_descriptor"
            | "file_redirect"
            | "herestring_redirect"
    )
}

struct Walker<'s> {
    source: &'s str,
    segments: Vec<ShellSegment>,
}

impl<'s> Walker<'s> {
    fn statement(&mut self, node: Node, depth: usize) -> Result<(), DecomposeError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(DecomposeError::TooDeep);
        }

        if is_leaf(&node) {
            let command = self.render(&node);
            self.push(command, node.byte_range());
            return Ok(());
        }

        match node.kind() {
            "redirected_statement" => self.redirected(node, depth),
            "program" | "list" | "pipeline" | "subshell" | "compound_statement" | "do_group"
            | "negated_command" | "if_statement" | "elif_clause" | "else_clause"
            | "while_statement" | "case_statement" | "case_item" | "function_definition" => {
                self.children(node, depth)
            }
            // Loop headers are words or arithmetic; only the body executes commands
            "for_statement" | "c_style_for_statement" => match node.child_by_field_name("body") {
                Some(body) => self.statement(body, depth + 1),
                None => Ok(()),
            },
            "heredoc_redirect" => self.heredoc_chain(node, depth),
            kind if is_operand(kind) => Ok(()),
            kind => Err(DecomposeError::Unsupported(kind)),
        }
    }

    fn children(&mut self, node: Node, depth: usize) -> Result<(), DecomposeError> {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children {
            self.statement(child, depth + 1)?;
        }
        Ok(())
    }

    /// `cmd > file`, `cat <<EOF ... EOF`, `{ ...; } 2>/dev/null`
    fn redirected(&mut self, node: Node, depth: usize) -> Result<(), DecomposeError> {
        let body = node.child_by_field_name("body");
        let mut cursor = node.walk();
        let redirects: Vec<Node> = node
            .named_children(&mut cursor)
            .filter(|c| body.map_or(true, |b| b.id() != c.id()))
            .collect();

        match body {
            Some(body) if !is_leaf(&body) => {
                self.statement(body, depth + 1)?;
                // `{ ...; } > file` writes through the group, so the output
                // redirect is checked as a segment of its own
                let outputs: Vec<&Node> = redirects
                    .iter()
                    .filter(|r| r.kind() == "file_redirect" && self.text(r).contains('>'))
                    .collect();
                if let (Some(first), Some(last)) = (outputs.first(), outputs.last()) {
                    let parts: Vec<String> =
                        outputs.iter().map(|r| self.render_redirect(r)).collect();
                    self.push(parts.join(" "), first.start_byte()..last.end_byte());
                }
            }
            body => {
                let mut parts: Vec<String> = body.iter().map(|b| self.render(b)).collect();
                parts.extend(
                    redirects
                        .iter()
                        .filter(|r| r.kind() != "comment")
                        .map(|r| self.render_redirect(r)),
                );
                parts.retain(|p| !p.is_empty());
                self.push(parts.join(" "), node.byte_range());
            }
        }

        // Pipelines and && / || chains written after a heredoc operator
        // hang off the redirect node itself
        for redirect in redirects {
            if redirect.kind() == "heredoc_redirect" {
                self.heredoc_chain(redirect, depth + 1)?;
            }
        }
        Ok(())
    }

    fn heredoc_chain(&mut self, redirect: Node, depth: usize) -> Result<(), DecomposeError> {
        let mut cursor = redirect.walk();
        let children: Vec<Node> = redirect.named_children(&mut cursor).collect();
        for child in children {
            if child.kind() == "heredoc_redirect" || is_operand(child.kind()) {
                continue;
            }
            self.statement(child, depth + 1)?;
        }
        Ok(())
    }

    fn push(&mut self, command: String, span: Range<usize>) {
        if !command.is_empty() {
            self.segments.push(ShellSegment { command, span });
        }
    }

    fn text(&self, node: &Node) -> &'s str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// Canonical single-line text for a leaf statement
    fn render(&self, node: &Node) -> String {
        if node.kind() != "command" {
            return flatten(self.text(node));
        }

        let mut cursor = node.walk();
        let parts: Vec<String> = node
            .children(&mut cursor)
            .filter(|c| c.kind() != "comment")
            .map(|c| match c.kind() {
                "command_name" => normalize_command_name(&c, self.source),
                "file_redirect" | "herestring_redirect" | "heredoc_redirect" => {
                    self.render_redirect(&c)
                }
                _ => flatten(self.text(&c)),
            })
            .filter(|p| !p.is_empty())
            .collect();
        parts.join(" ")
    }

    /// Redirect text without any heredoc body: `<<'EOF'`, `2> /dev/null`
    fn render_redirect(&self, node: &Node) -> String {
        if node.kind() != "heredoc_redirect" {
            return flatten(self.text(node));
        }

        let mut rendered = String::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "<<" | "<<-" => rendered.push_str(child.kind()),
                "heredoc_start" => rendered.push_str(self.text(&child)),
                "heredoc_body" | "heredoc_end" => {}
                kind if child.is_named() && is_operand(kind) => {
                    rendered.push(' ');
                    rendered.push_str(&flatten(self.text(&child)));
                }
                _ => {}
            }
        }
        rendered
    }
}

/// Collapse line continuations and surrounding whitespace. Newlines left
/// inside quoted words become spaces so a segment is always one line.
fn flatten(text: &str) -> String {
    text.replace("\\\r\n", "")
        .replace("\\\n", "")
        .replace(['\r', '\n'], " ")
        .trim()
        .to_string()
}

/// Unquote a literal command name (`ba'sh'` → `bash`, `"ls"` → `ls`)
fn normalize_command_name(node: &Node, source: &str) -> String {
    let text = node.utf8_text(source.as_bytes()).unwrap_or("");
    if !text.contains(['\'', '"', '\\']) || has_dynamic_parts(node) {
        return flatten(text);
    }

    match shlex::split(text) {
        Some(words) if words.len() == 1 => match shlex::try_quote(&words[0]) {
            Ok(quoted) => quoted.into_owned(),
            Err(_) => flatten(text),
        },
        _ => flatten(text),
    }
}

/// Check if a node contains expansions or substitutions
fn has_dynamic_parts(node: &Node) -> bool {
    match node.kind() {
        "simple_expansion" | "expansion" | "command_substitution" | "arithmetic_expansion"
        | "process_substitution" => true,
        _ => {
            let mut cursor = node.walk();
            let children: Vec<Node> = node.children(&mut cursor).collect();
            children.iter().any(has_dynamic_parts)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands(source: &str) -> Vec<String> {
        decompose(source)
            .unwrap_or_else(|e| panic!("failed to decompose {source:?}: {e}"))
            .into_iter()
            .map(|s| s.command)
            .collect()
    }

    #[test]
    fn test_simple_command() {
        assert_eq!(commands("ls -la"), vec!["ls -la"]);
    }

    #[test]
    fn test_whitespace_normalized() {
        assert_eq!(commands("  ls    -la   /tmp  "), vec!["ls -la /tmp"]);
        assert_eq!(commands("ls \\\n  -la"), vec!["ls -la"]);
    }

    #[test]
    fn test_quoted_newline_rendered_on_one_line() {
        assert_eq!(
            commands("echo \"multi\nline\" done"),
            vec!["echo \"multi line\" done"]
        );
        assert_eq!(
            commands("git log 'x\n' --output=/tmp/f"),
            vec!["git log 'x ' --output=/tmp/f"]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(decompose("").unwrap().is_empty());
        assert!(decompose("   \n\t ").unwrap().is_empty());
    }

    #[test]
    fn test_compound_operators_in_order() {
        assert_eq!(
            commands("ls && curl http://x || echo failed; pwd"),
            vec!["ls", "curl http://x", "echo failed", "pwd"]
        );
    }

    #[test]
    fn test_pipeline_and_background() {
        assert_eq!(
            commands("cat file | grep x | wc -l & sleep 1"),
            vec!["cat file", "grep x", "wc -l", "sleep 1"]
        );
    }

    #[test]
    fn test_quoted_operators_not_split() {
        assert_eq!(commands("echo 'a && b; c | d'"), vec!["echo 'a && b; c | d'"]);
    }

    #[test]
    fn test_subshell_and_brace_group() {
        assert_eq!(
            commands("(cd src && ls) ; { pwd; whoami; }"),
            vec!["cd src", "ls", "pwd", "whoami"]
        );
    }

    #[test]
    fn test_control_flow_condition_and_body() {
        assert_eq!(
            commands("if test -f a; then cat a; elif true; then ls; else rm a; fi"),
            vec!["test -f a", "cat a", "true", "ls", "rm a"]
        );
        assert_eq!(
            commands("while read line; do echo \"$line\"; done"),
            vec!["read line", "echo \"$line\""]
        );
    }

    #[test]
    fn test_for_loop_body_only() {
        assert_eq!(commands("for f in a b c; do cat $f; done"), vec!["cat $f"]);
        assert_eq!(
            commands("for ((i = 0; i < 3; i++)); do echo $i; done"),
            vec!["echo $i"]
        );
    }

    #[test]
    fn test_case_items() {
        assert_eq!(
            commands("case $x in a) ls ;; *) rm -rf tmp ;; esac"),
            vec!["ls", "rm -rf tmp"]
        );
    }

    #[test]
    fn test_function_body() {
        assert_eq!(commands("f() { rm -rf build; }"), vec!["rm -rf build"]);
    }

    #[test]
    fn test_negated_command() {
        assert_eq!(commands("! grep -q x file"), vec!["grep -q x file"]);
    }

    #[test]
    fn test_assignments_and_declarations() {
        assert_eq!(commands("FOO=bar"), vec!["FOO=bar"]);
        assert_eq!(commands("export PATH=/bin"), vec!["export PATH=/bin"]);
        assert_eq!(commands("FOO=bar git status"), vec!["FOO=bar git status"]);
    }

    #[test]
    fn test_test_command_is_a_segment() {
        assert_eq!(
            commands("[[ -f Cargo.toml ]] && cargo build"),
            vec!["[[ -f Cargo.toml ]]", "cargo build"]
        );
    }

    #[test]
    fn test_redirections_kept() {
        assert_eq!(commands("ls > out.txt"), vec!["ls > out.txt"]);
        assert_eq!(commands("cargo test 2>&1"), vec!["cargo test 2>&1"]);
    }

    #[test]
    fn test_redirected_compound_recurses() {
        assert_eq!(
            commands("{ ls; pwd; } > out.txt"),
            vec!["ls", "pwd", "> out.txt"]
        );
        assert_eq!(
            commands("while read l; do echo \"$l\"; done < in.txt"),
            vec!["read l", "echo \"$l\""]
        );
    }

    #[test]
    fn test_heredoc_body_dropped() {
        let segments = decompose("cat << 'EOF'\nhello `world`\nEOF\n").unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].command, "cat <<'EOF'");
    }

    #[test]
    fn test_heredoc_pipeline_extracted() {
        assert_eq!(
            commands("cat <<'EOF' | sh\nrm -rf /\nEOF\n"),
            vec!["cat <<'EOF'", "sh"]
        );
    }

    #[test]
    fn test_quoted_command_name_normalized() {
        assert_eq!(commands("ba'sh' -c 'id'"), vec!["bash -c 'id'"]);
        assert_eq!(commands("\"rm\" -rf /"), vec!["rm -rf /"]);
    }

    #[test]
    fn test_dynamic_command_name_untouched() {
        assert_eq!(commands("\"$cmd\" arg"), vec!["\"$cmd\" arg"]);
    }

    #[test]
    fn test_substitution_not_extracted() {
        assert_eq!(commands("echo $(whoami)"), vec!["echo $(whoami)"]);
    }

    #[test]
    fn test_spans_point_into_source() {
        let source = "ls && echo hi";
        let segments = decompose(source).unwrap();
        assert_eq!(&source[segments[0].span.clone()], "ls");
        assert_eq!(&source[segments[1].span.clone()], "echo hi");
    }

    #[test]
    fn test_unparseable() {
        assert!(matches!(
            decompose("echo 'unterminated"),
            Err(DecomposeError::Syntax(_))
        ));
        assert!(decompose("if true; then ls").is_err());
        assert!(decompose("ls &&").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}ls{}", "( ".repeat(200), " )".repeat(200));
        assert_eq!(decompose(&deep), Err(DecomposeError::TooDeep));
    }

    #[test]
    fn test_comment_only() {
        assert!(decompose("# just a comment").unwrap().is_empty());
    }
}
