//! Command substitution detection
//!
//! A literal scan for `$(` and backticks over the whole command text. The
//! only exclusion is the body of a heredoc whose delimiter is quoted, since
//! the shell never expands those. Process substitution (`<(..)`, `>(..)`) is
//! found through the AST.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::{Node, Tree};

static SUBSTITUTION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\(|`").expect("static pattern"));

/// Byte offsets of every substitution that the shell would run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DangerScan {
    markers: Vec<usize>,
}

impl DangerScan {
    /// Scan `source`. With a parse tree, quoted heredoc bodies are excluded
    /// and process substitutions are added.
    pub fn scan(source: &str, tree: Option<&Tree>) -> Self {
        let (excluded, process_subs) = match tree {
            Some(tree) => {
                let root = tree.root_node();
                (quoted_heredoc_bodies(&root, source), process_substitutions(&root))
            }
            None => (Vec::new(), Vec::new()),
        };

        let mut markers: Vec<usize> = SUBSTITUTION_MARKER
            .find_iter(source)
            .map(|m| m.start())
            .filter(|offset| !excluded.iter().any(|r| r.contains(offset)))
            .collect();
        markers.extend(process_subs);
        markers.sort_unstable();
        markers.dedup();

        Self { markers }
    }

    pub fn is_dangerous(&self) -> bool {
        !self.markers.is_empty()
    }

    pub fn markers(&self) -> &[usize] {
        &self.markers
    }

    /// Flag each span that contains a marker. A marker outside every span
    /// cannot be attributed, so it flags all of them.
    pub fn attribute(&self, spans: &[Range<usize>]) -> Vec<bool> {
        let orphaned = self
            .markers
            .iter()
            .any(|m| !spans.iter().any(|span| span.contains(m)));
        if orphaned {
            return vec![true; spans.len()];
        }

        spans
            .iter()
            .map(|span| self.markers.iter().any(|m| span.contains(m)))
            .collect()
    }
}

/// Parse and scan in one step
pub fn has_command_substitution(source: &str) -> bool {
    let tree = super::ast::parse_bash(source).ok();
    DangerScan::scan(source, tree.as_ref()).is_dangerous()
}

/// Bodies of heredocs introduced with `<<'EOF'`, `<<"EOF"` or `<<\EOF`
fn quoted_heredoc_bodies(root: &Node, source: &str) -> Vec<Range<usize>> {
    let mut starts = Vec::new();
    let mut bodies = Vec::new();
    collect_heredoc_parts(root, &mut starts, &mut bodies);

    // Starts and bodies pair up in document order
    starts
        .iter()
        .zip(bodies)
        .filter(|(start, _)| {
            start
                .utf8_text(source.as_bytes())
                .is_ok_and(|delim| delim.contains(['\'', '"', '\\']))
        })
        .map(|(_, body)| body.byte_range())
        .collect()
}

fn collect_heredoc_parts<'t>(node: &Node<'t>, starts: &mut Vec<Node<'t>>, bodies: &mut Vec<Node<'t>>) {
    match node.kind() {
        "heredoc_start" => starts.push(*node),
        "heredoc_body" => bodies.push(*node),
        _ => {
            let mut cursor = node.walk();
            let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
            for child in &children {
                collect_heredoc_parts(child, starts, bodies);
            }
        }
    }
}

fn process_substitutions(node: &Node) -> Vec<usize> {
    let mut found = Vec::new();
    let mut stack = vec![*node];
    while let Some(current) = stack.pop() {
        if current.kind() == "process_substitution" {
            found.push(current.start_byte());
        }
        let mut cursor = current.walk();
        stack.extend(current.children(&mut cursor));
    }
    found
}
