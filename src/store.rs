// Copyright (c) 2021 James O. D. Hunt.
//
// SPDX-License-Identifier: Apache-2.0
//

use std::collections::HashMap;
use std::sync::Arc;

/// Literal stored for a boolean flag that is set.
const TRUE_STR: &str = "true";

/// Literal stored for a boolean flag that is unset.
const FALSE_STR: &str = "false";

/// Read-write configuration store, written while the command-line is parsed.
///
/// Keys hold at most one live value; setting overwrites. An absent key is a
/// distinct observable state from a stored empty string or a stored
/// `"false"`. There is no deletion.
///
/// Once parsing has finished, call [FlagStore::freeze] to obtain a read-only
/// [FlagView] for the concurrent part of the program. The split is what
/// enforces the access rule: all writes happen single-threaded before any
/// reader can exist on another thread.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FlagStore {
    entries: HashMap<String, String>,
}

impl FlagStore {
    /// Create an empty store.
    pub fn new() -> Self {
        FlagStore::default()
    }

    /// Returns the value stored under `key`, or [None] if the key was never
    /// set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Store `value` under `key`, overwriting any previous value.
    pub fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.into(), value.into());
    }

    /// Returns `true` iff the value stored under `key` is the literal
    /// `"true"`. Unset keys and any other stored value read as `false`.
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key) == Some(TRUE_STR)
    }

    /// Store the literal `"true"` or `"false"` under `key`.
    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, if value { TRUE_STR } else { FALSE_STR });
    }

    /// Consume the store, producing a shared read-only view.
    pub fn freeze(self) -> FlagView {
        FlagView {
            entries: Arc::new(self.entries),
        }
    }
}

/// Read-only view of a [FlagStore], safe to hand to concurrent workers.
///
/// Cloning is cheap; all clones share one snapshot.
#[derive(Clone, Debug)]
pub struct FlagView {
    entries: Arc<HashMap<String, String>>,
}

impl FlagView {
    /// Returns the value stored under `key`, or [None] if the key was never
    /// set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns `true` iff the value stored under `key` is the literal
    /// `"true"`.
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key) == Some(TRUE_STR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let mut store = FlagStore::new();

        assert_eq!(store.get("OUTPUT"), None);

        store.set("OUTPUT", "out.csv");
        assert_eq!(store.get("OUTPUT"), Some("out.csv"));

        // Overwrite wins
        store.set("OUTPUT", "other.csv");
        assert_eq!(store.get("OUTPUT"), Some("other.csv"));
    }

    #[test]
    fn test_unset_is_distinct() {
        let mut store = FlagStore::new();

        // Unset, empty string and "false" are three different observations.
        assert_eq!(store.get("A"), None);

        store.set("A", "");
        assert_eq!(store.get("A"), Some(""));
        assert!(!store.get_bool("A"));

        store.set_bool("B", false);
        assert_eq!(store.get("B"), Some("false"));
        assert_eq!(store.get("C"), None);
    }

    #[test]
    fn test_bool_literals() {
        let mut store = FlagStore::new();

        store.set_bool("EXIT_ON_ERR", true);
        assert_eq!(store.get("EXIT_ON_ERR"), Some("true"));
        assert!(store.get_bool("EXIT_ON_ERR"));

        store.set_bool("EXIT_ON_ERR", false);
        assert_eq!(store.get("EXIT_ON_ERR"), Some("false"));
        assert!(!store.get_bool("EXIT_ON_ERR"));

        // Only the exact literal reads as true
        store.set("EXIT_ON_ERR", "True");
        assert!(!store.get_bool("EXIT_ON_ERR"));
        store.set("EXIT_ON_ERR", "1");
        assert!(!store.get_bool("EXIT_ON_ERR"));
    }

    #[test]
    fn test_freeze() {
        let mut store = FlagStore::new();
        store.set("N_THREADS", "4");
        store.set_bool("EXIT_ON_ERR", true);

        let view = store.freeze();
        assert_eq!(view.get("N_THREADS"), Some("4"));
        assert!(view.get_bool("EXIT_ON_ERR"));
        assert_eq!(view.get("OUTPUT"), None);
    }

    #[test]
    fn test_view_shared_across_threads() {
        let mut store = FlagStore::new();
        store.set("INPUT", "data/*");

        let view = store.freeze();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let v = view.clone();
                std::thread::spawn(move || v.get("INPUT").map(String::from))
            })
            .collect();

        for h in handles {
            assert_eq!(h.join().unwrap(), Some("data/*".to_string()));
        }
    }
}
