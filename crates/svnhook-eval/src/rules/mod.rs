//! Executable counterparts of rule document elements.
//!
//! - [`filters`] – predicates that gate their children
//! - [`actions`] – terminal side effects

pub mod actions;
pub mod filters;

use crate::bail_hook;
use crate::error::HookError;
use crate::executor::Executor;
use crate::outcome::Outcome;
use crate::predicate::parse_bool;
use crate::tokens::Tokens;
use anyhow::Result;
use svnhook_syntax::ConfigNode;
use tracing::debug;

/// A filter or action built from one [`ConfigNode`].
pub trait Rule {
    /// Evaluates the rule. `node` is the element the rule was built from.
    fn run(&self, node: &ConfigNode, exec: &Executor<'_>, tokens: &mut Tokens) -> Result<Outcome>;
}

/// Tokens a filter discovered for one matching item.
pub type Bindings = Vec<(&'static str, String)>;

/// The gating condition of a filter.
pub trait Predicate {
    /// Bindings for every matching item, in order. Empty when nothing matches.
    fn select(&self, exec: &Executor<'_>, tokens: &Tokens) -> Result<Vec<Bindings>>;
}

/// Runs the children of its element once per item its predicate selects.
///
/// Each run gets a copy of the caller's tokens with the item's bindings
/// added. With `matchFirst="true"` only the first item is used.
pub struct Filter<P> {
    predicate: P,
    consumed: &'static [&'static str],
    match_first: bool,
}

impl<P: Predicate + 'static> Filter<P> {
    /// `consumed` lists the predicate elements that must not be run as children.
    pub fn boxed(node: &ConfigNode, predicate: P, consumed: &'static [&'static str]) -> Result<Box<dyn Rule>> {
        Ok(Box::new(Self {
            predicate,
            consumed,
            match_first: bool_attr(node, "matchFirst", false),
        }))
    }
}

impl<P: Predicate> Rule for Filter<P> {
    fn run(&self, node: &ConfigNode, exec: &Executor<'_>, tokens: &mut Tokens) -> Result<Outcome> {
        let matches = self.predicate.select(exec, tokens)?;
        if matches.is_empty() {
            debug!(filter = node.name(), "predicate did not match");
            return Ok(Outcome::ok());
        }

        let children: Vec<&ConfigNode> = node
            .children()
            .iter()
            .filter(|child| !self.consumed.contains(&child.name()))
            .collect();

        let limit = if self.match_first { 1 } else { matches.len() };
        for bindings in matches.into_iter().take(limit) {
            let mut scope = tokens.clone();
            for (name, value) in bindings {
                scope.set(name, value);
            }
            let outcome = exec.execute_children(children.iter().copied(), &mut scope);
            if outcome.should_stop() {
                return Ok(outcome);
            }
        }

        Ok(Outcome::ok())
    }
}

pub(crate) fn required_attr<'n>(node: &'n ConfigNode, name: &str) -> Result<&'n str> {
    match node.attr(name) {
        Some(value) => Ok(value),
        None => bail_hook!(HookError::MissingAttribute {
            node: node.name().to_string(),
            attribute: name.to_string(),
            span: node.span(),
        }),
    }
}

pub(crate) fn required_text(node: &ConfigNode) -> Result<&str> {
    match node.text() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => bail_hook!(HookError::MissingText {
            node: node.name().to_string(),
            span: node.span(),
        }),
    }
}

/// Text of a required child element such as `<Subject>`.
pub(crate) fn required_child_text<'n>(node: &'n ConfigNode, tag: &str) -> Result<&'n str> {
    match node.child(tag) {
        Some(child) => Ok(child.text().unwrap_or("")),
        None => bail_hook!(HookError::MissingTag {
            tag: tag.to_string(),
            span: node.span(),
        }),
    }
}

pub(crate) fn bool_attr(node: &ConfigNode, name: &str, default: bool) -> bool {
    node.attr(name).map(parse_bool).unwrap_or(default)
}

/// Parses an integer attribute, rejecting values outside `range`.
pub(crate) fn int_attr<T>(
    node: &ConfigNode,
    name: &str,
    range: std::ops::RangeInclusive<T>,
) -> Result<Option<T>>
where
    T: std::str::FromStr + PartialOrd,
{
    let Some(raw) = node.attr(name) else {
        return Ok(None);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if range.contains(&value) => Ok(Some(value)),
        _ => bail_hook!(HookError::InvalidAttribute {
            node: node.name().to_string(),
            attribute: name.to_string(),
            value: raw.to_string(),
            span: node.span(),
        }),
    }
}
