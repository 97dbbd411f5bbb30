//! Offline validation of rule documents.

use std::fmt;
use svnhook_eval::{HookError, Registry};
use svnhook_syntax::{ConfigNode, Span};

/// A configuration mistake found without running the hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub span: Span,
    pub node: String,
    pub message: String,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.span, self.node, self.message)
    }
}

/// Builds every recognized element of the document, collecting the
/// construction errors. Unrecognized elements below the root are parameters
/// of their parent and are only descended into.
pub fn check_document(root: &ConfigNode, registry: &Registry) -> Vec<Problem> {
    let mut problems = Vec::new();
    if !registry.contains(root.name()) {
        problems.push(Problem {
            span: root.span(),
            node: root.name().to_string(),
            message: HookError::UnknownNode {
                node: root.name().to_string(),
                span: root.span(),
            }
            .to_string(),
        });
    }
    visit(root, registry, &mut problems);
    problems
}

fn visit(node: &ConfigNode, registry: &Registry, problems: &mut Vec<Problem>) {
    if let Some(constructor) = registry.lookup(node.name()) {
        if let Err(err) = constructor(node) {
            let span = err
                .downcast_ref::<HookError>()
                .and_then(HookError::span)
                .unwrap_or(node.span());
            problems.push(Problem {
                span,
                node: node.name().to_string(),
                message: format!("{:#}", err),
            });
        }
    }
    for child in node.children() {
        visit(child, registry, problems);
    }
}
