//! Element name to rule constructor lookup.
//!
//! Names are searched in catalog order: control elements, built-in filters,
//! built-in actions, then any extension catalog registered at runtime.

use crate::rules::{Rule, actions, filters};
use anyhow::Result;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use svnhook_syntax::ConfigNode;

/// Builds a rule from its element, validating required parameters.
pub type Constructor = fn(&ConfigNode) -> Result<Box<dyn Rule>>;

type Catalog = HashMap<&'static str, Constructor>;

static CONTROL: Lazy<Catalog> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert("Actions", filters::group as Constructor);
    map
});

static FILTERS: Lazy<Catalog> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert("FilterAddNameCase", filters::add_name_case as Constructor);
    map.insert("FilterAuthor", filters::author as Constructor);
    map.insert("FilterBreakUnlock", filters::break_unlock as Constructor);
    map.insert("FilterCapabilities", filters::capabilities as Constructor);
    map.insert("FilterChanges", filters::commit_list as Constructor);
    map.insert("FilterChgType", filters::change_type as Constructor);
    map.insert("FilterComment", filters::comment as Constructor);
    map.insert("FilterCommitList", filters::commit_list as Constructor);
    map.insert("FilterFileContent", filters::file_content as Constructor);
    map.insert("FilterLockOwner", filters::lock_owner as Constructor);
    map.insert("FilterLockToken", filters::lock_token as Constructor);
    map.insert("FilterLogMsg", filters::log_message as Constructor);
    map.insert("FilterPath", filters::path as Constructor);
    map.insert("FilterPathList", filters::path_list as Constructor);
    map.insert("FilterPropList", filters::prop_list as Constructor);
    map.insert("FilterRevProp", filters::rev_prop as Constructor);
    map.insert("FilterStealLock", filters::steal_lock as Constructor);
    map.insert("FilterUser", filters::user as Constructor);
    map
});

static ACTIONS: Lazy<Catalog> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert("ExecuteCmd", actions::execute_cmd as Constructor);
    map.insert("SendError", actions::send_error as Constructor);
    map.insert("SendLogSmtp", actions::send_log_smtp as Constructor);
    map.insert("SendSmtp", actions::send_smtp as Constructor);
    map.insert("SetRevisionFile", actions::set_revision_file as Constructor);
    map.insert("SetToken", actions::set_token as Constructor);
    map
});

/// The set of element names the executor understands.
#[derive(Clone, Default)]
pub struct Registry {
    extensions: Catalog,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: registers an extension rule. Built-in names take precedence.
    pub fn with_extension(mut self, name: &'static str, constructor: Constructor) -> Self {
        self.extensions.insert(name, constructor);
        self
    }

    pub fn lookup(&self, name: &str) -> Option<Constructor> {
        [&*CONTROL, &*FILTERS, &*ACTIONS, &self.extensions]
            .into_iter()
            .find_map(|catalog| catalog.get(name).copied())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_resolve() {
        let registry = Registry::new();
        let names = [
            "Actions",
            "FilterAddNameCase",
            "FilterAuthor",
            "FilterCommitList",
            "SendError",
            "SetToken",
        ];
        for name in names {
            assert!(registry.contains(name), "{name}");
        }
    }

    #[test]
    fn test_parameter_tags_do_not_resolve() {
        let registry = Registry::new();
        for name in ["AuthorRegex", "ToAddress", "Message", "sendError"] {
            assert!(registry.lookup(name).is_none(), "{name}");
        }
    }

    #[test]
    fn test_extension_catalog() {
        let registry = Registry::new().with_extension("Noop", filters::group);
        assert!(registry.contains("Noop"));
        assert!(!Registry::new().contains("Noop"));
    }

    #[test]
    fn test_builtin_wins_over_extension() {
        let registry = Registry::new().with_extension("SendError", actions::set_token);
        let ctor = registry.lookup("SendError").unwrap();
        // SetToken would demand a `name` attribute; SendError demands text.
        let err = ctor(&ConfigNode::new("SendError").with_attr("name", "x")).err().unwrap();
        assert_eq!(err.to_string(), "Required tag content missing: SendError");
    }
}
