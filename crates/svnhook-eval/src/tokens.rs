//! Case-insensitive token store and `${NAME}` expansion.

use crate::bail_hook;
use crate::error::HookError;
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use rustc_hash::FxHashMap;

/// Number of substitution passes allowed before expansion is considered cyclic.
pub const MAX_EXPANSION_DEPTH: usize = 12;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{(\w+)\}").expect("placeholder pattern is valid"));

/// Token values visible to one rule and its descendants.
///
/// Names are case-insensitive. Cloning gives a filter its own child scope;
/// changes made there never reach the parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    values: FxHashMap<String, String>,
}

impl Tokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a context with every process environment variable.
    pub fn from_env() -> Self {
        let mut tokens = Self::new();
        for (name, value) in std::env::vars() {
            tokens.set(&name, value);
        }
        tokens
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_uppercase(), value.into());
    }

    /// Looks up a token; unset tokens raise [`HookError::TokenNotFound`].
    pub fn get(&self, name: &str) -> Result<&str> {
        match self.lookup(name) {
            Some(value) => Ok(value),
            None => bail_hook!(HookError::TokenNotFound { name: name.to_string() }),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.values.get(&name.to_uppercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(&name.to_uppercase())
    }

    /// Replaces every `${NAME}` whose token is set, repeating until nothing
    /// changes. Unknown names are left as they are.
    ///
    /// Fails with [`HookError::DepthExceeded`] when substitution is still
    /// producing work after [`MAX_EXPANSION_DEPTH`] passes.
    pub fn expand(&self, text: &str) -> Result<String> {
        let mut current = text.to_string();

        for _ in 0..MAX_EXPANSION_DEPTH {
            let mut substituted = false;
            let next = PLACEHOLDER.replace_all(&current, |caps: &Captures<'_>| {
                match self.lookup(&caps[1]) {
                    Some(value) => {
                        substituted = true;
                        value.to_string()
                    }
                    None => caps[0].to_string(),
                }
            });

            if !substituted {
                return Ok(current);
            }
            current = next.into_owned();
        }

        bail_hook!(HookError::DepthExceeded { text: text.to_string() })
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Tokens {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tokens = Tokens::new();
        for (name, value) in iter {
            tokens.set(name.as_ref(), value);
        }
        tokens
    }
}
