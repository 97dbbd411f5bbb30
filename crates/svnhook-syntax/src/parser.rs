//! XML front end for the rule document.

use crate::error::{ParseError, Span};
use crate::node::ConfigNode;
use anyhow::{Context, Result};
use std::path::Path;

/// Parses a rule document held in memory.
pub fn parse(source: &str) -> Result<ConfigNode, ParseError> {
    if source.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let doc = roxmltree::Document::parse(source).map_err(|e| {
        let pos = e.pos();
        ParseError::Malformed {
            message: e.to_string(),
            span: Span::point(pos.row as usize, pos.col as usize),
        }
    })?;

    Ok(convert(&doc, doc.root_element()))
}

/// Reads and parses a rule document from disk.
///
/// Malformed documents are reported with a source excerpt in the error chain.
pub fn parse_file(path: &Path) -> Result<ConfigNode> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration: {}", path.display()))?;
    parse(&source).map_err(|e| {
        let rendered = e.render(&source);
        anyhow::Error::new(e).context(format!("{}:\n{}", path.display(), rendered))
    })
}

fn convert(doc: &roxmltree::Document<'_>, element: roxmltree::Node<'_, '_>) -> ConfigNode {
    let range = element.range();
    let pos = doc.text_pos_at(range.start);
    let mut node = ConfigNode::new(element.tag_name().name()).with_span(Span::new(
        pos.row as usize,
        pos.col as usize,
        range.start,
        range.end,
    ));

    for attr in element.attributes() {
        node = node.with_attr(attr.name(), attr.value());
    }

    if let Some(text) = element.text() {
        node = node.with_text(text);
    }

    for child in element.children().filter(|c| c.is_element()) {
        node = node.with_child(convert(doc, child));
    }

    node
}
