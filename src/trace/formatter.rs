use crate::flow::NodePath;
use crate::interpreter::NodeResult;
use std::fmt::Write;

/// Formats evaluation results into human-readable strings
pub struct TraceFormatter;

impl TraceFormatter {
    /// Format a result tree as a compact one-line explanation.
    ///
    /// Nodes skipped by a `failFast` combinator are left out, the same way a
    /// short-circuited branch never shows up in the outcome.
    pub fn format_trace(result: &NodeResult) -> String {
        let mut out = String::new();
        Self::format_inline(result, &mut out);
        out
    }

    fn format_inline(result: &NodeResult, out: &mut String) {
        match result {
            NodeResult::Composite {
                combinator,
                children,
                ..
            } => {
                out.push_str(combinator.name());
                out.push('(');
                let mut first = true;
                for child in children
                    .iter()
                    .filter(|c| !matches!(c, NodeResult::Skipped { .. }))
                {
                    if !first {
                        out.push_str(", ");
                    }
                    first = false;
                    Self::format_inline(child, out);
                }
                out.push(')');
            }
            NodeResult::Leaf { path, kind, outcome } => {
                let _ = write!(
                    out,
                    "{}@{} {}",
                    kind,
                    Self::path_label(path),
                    Self::mark(outcome.passed)
                );
            }
            NodeResult::Skipped { .. } => {}
        }
    }

    /// Format a result tree with one line per node and the leaf feedback inline.
    pub fn format_tree(result: &NodeResult) -> String {
        let mut out = String::new();
        Self::format_line(result, &mut out);
        if let NodeResult::Composite { children, .. } = result {
            Self::format_children(children, "", &mut out);
        }
        out
    }

    fn format_children(children: &[NodeResult], prefix: &str, out: &mut String) {
        for (index, child) in children.iter().enumerate() {
            let is_last = index + 1 == children.len();
            out.push_str(prefix);
            out.push_str(if is_last { "└── " } else { "├── " });
            Self::format_line(child, out);

            if let NodeResult::Composite { children, .. } = child {
                let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
                Self::format_children(children, &child_prefix, out);
            }
        }
    }

    fn format_line(result: &NodeResult, out: &mut String) {
        let path = Self::path_label(result.path());
        let _ = match result {
            NodeResult::Composite {
                combinator, passed, ..
            } => {
                let tally = result.leaf_tally();
                writeln!(
                    out,
                    "{} flow ({}) at {}: {}/{}",
                    Self::mark(*passed),
                    combinator.name(),
                    path,
                    tally.passed,
                    tally.total
                )
            }
            NodeResult::Leaf { kind, outcome, .. } => match &outcome.message {
                Some(message) => writeln!(
                    out,
                    "{} {} at {}: {}",
                    Self::mark(outcome.passed),
                    kind,
                    path,
                    message
                ),
                None => writeln!(out, "{} {} at {}", Self::mark(outcome.passed), kind, path),
            },
            NodeResult::Skipped {
                kind, leaf_count, ..
            } => writeln!(out, "[SKIP] {} at {} ({} checks)", kind, path, leaf_count),
        };
    }

    fn mark(passed: bool) -> &'static str {
        if passed { "[PASS]" } else { "[FAIL]" }
    }

    fn path_label(path: &NodePath) -> String {
        if path.is_root() {
            "root".to_string()
        } else {
            path.to_string()
        }
    }
}
