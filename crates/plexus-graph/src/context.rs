//! Evaluation contexts.
//!
//! A [`Context`] is an immutable map of named variables under which plug
//! values and hashes are evaluated. The same plug may be evaluated under
//! many contexts concurrently; contexts are cheap to clone and carry their
//! own precomputed content hash.
//!
//! Each thread also has an ambient *current* context, entered with
//! [`ContextScope::enter`] and read with [`Context::current`].

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use crate::hash::{ContentHash, ContentHasher};
use crate::value::Value;

thread_local! {
    static CURRENT: RefCell<Vec<Context>> = const { RefCell::new(Vec::new()) };
}

static EMPTY: LazyLock<Context> = LazyLock::new(|| Context::from_vars(BTreeMap::new()));

#[derive(PartialEq)]
struct ContextInner {
    vars: BTreeMap<String, Value>,
    hash: ContentHash,
}

/// Immutable key-value environment for evaluation.
#[derive(Clone, PartialEq)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    /// Returns the empty context.
    pub fn new() -> Self {
        EMPTY.clone()
    }

    fn from_vars(vars: BTreeMap<String, Value>) -> Self {
        let mut hasher = ContentHasher::new();
        hasher.append_int(vars.len() as i64);
        for (key, value) in &vars {
            hasher.append_str(key).append_value(value);
        }

        Self {
            inner: Arc::new(ContextInner {
                vars,
                hash: hasher.finish(),
            }),
        }
    }

    /// Returns a new context with `key` bound to `value`.
    pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut vars = self.inner.vars.clone();
        vars.insert(key.into(), value.into());
        Self::from_vars(vars)
    }

    /// Returns a new context with every binding in `overrides` applied on
    /// top of this one.
    pub fn scoped<K, V>(&self, overrides: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut vars = self.inner.vars.clone();
        for (key, value) in overrides {
            vars.insert(key.into(), value.into());
        }
        Self::from_vars(vars)
    }

    /// Returns a new context with `keys` removed.
    ///
    /// Returns a clone of `self` when none of the keys are bound.
    pub fn without<S: AsRef<str>>(&self, keys: &[S]) -> Self {
        if !keys.iter().any(|key| self.inner.vars.contains_key(key.as_ref())) {
            return self.clone();
        }

        let vars = self
            .inner
            .vars
            .iter()
            .filter(|(name, _)| !keys.iter().any(|key| key.as_ref() == name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        Self::from_vars(vars)
    }

    /// Returns the value bound to `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.vars.get(key)
    }

    /// Returns whether `key` is bound.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.vars.contains_key(key)
    }

    /// Returns the number of bound variables.
    pub fn len(&self) -> usize {
        self.inner.vars.len()
    }

    /// Returns whether no variables are bound.
    pub fn is_empty(&self) -> bool {
        self.inner.vars.is_empty()
    }

    /// Returns an iterator over the bound variables in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.inner.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the content hash of this context.
    #[inline]
    pub fn hash(&self) -> ContentHash {
        self.inner.hash
    }

    /// Returns the innermost context entered on this thread, or the empty
    /// context when none is entered.
    pub fn current() -> Self {
        CURRENT.with(|stack| stack.borrow().last().cloned().unwrap_or_default())
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.inner.vars.iter()).finish()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_vars(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Guard that makes a context current on this thread until dropped.
///
/// Scopes nest; dropping a guard restores the context that was current
/// when it was entered.
#[must_use = "the context is only current while the scope is alive"]
pub struct ContextScope {
    depth: usize,
}

impl ContextScope {
    /// Makes `context` the current context of this thread.
    pub fn enter(context: Context) -> Self {
        let depth = CURRENT.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.push(context);
            stack.len()
        });
        Self { depth }
    }
}

impl Drop for ContextScope {
    fn drop(&mut self) {
        CURRENT.with(|stack| stack.borrow_mut().truncate(self.depth - 1));
    }
}

impl fmt::Debug for ContextScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextScope")
            .field("depth", &self.depth)
            .finish()
    }
}
