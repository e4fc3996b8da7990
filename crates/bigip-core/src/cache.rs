// Session-scoped lookup memo.
//
// Rule bodies and data-group records are fetched once per client session
// and never refreshed mid-poll: topology within one cycle is assumed
// stable. Misses are cached too, so an absent name costs one fetch, not
// one per reference. Not synchronized -- callers serialize first access
// (the `&mut self` methods make the borrow checker enforce that in
// single-owner use).

use std::collections::HashMap;

/// Populate-if-empty memo keyed by object name.
///
/// The outer `Option` distinguishes "never fetched" from "fetched and
/// absent" (`Some(None)`).
#[derive(Debug)]
pub struct SessionCache<T> {
    entries: HashMap<String, Option<T>>,
}

impl<T> SessionCache<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Look up a name. `None` means the name was never populated;
    /// `Some(None)` means it was fetched and found absent.
    pub fn lookup(&self, name: &str) -> Option<&Option<T>> {
        self.entries.get(name)
    }

    pub fn is_populated(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Record a fetch result for `name`. First write wins; a name is
    /// populated at most once per session.
    pub fn populate(&mut self, name: impl Into<String>, value: Option<T>) {
        self.entries.entry(name.into()).or_insert(value);
    }
}

impl<T> Default for SessionCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinguishes_unfetched_from_absent() {
        let mut cache: SessionCache<u32> = SessionCache::new();

        assert!(cache.lookup("a").is_none());
        cache.populate("a", None);
        assert_eq!(cache.lookup("a"), Some(&None));
        assert!(cache.is_populated("a"));
    }

    #[test]
    fn first_populate_wins() {
        let mut cache = SessionCache::new();
        cache.populate("a", Some(1));
        cache.populate("a", Some(2));
        assert_eq!(cache.lookup("a"), Some(&Some(1)));
    }
}
