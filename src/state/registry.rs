use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Set of normalized URLs admitted during one crawl run
///
/// Admission is a single check-and-set under one lock, so each key is
/// admitted exactly once no matter how many tasks race for it. Keys are never
/// removed; the registry lives as long as the run that created it.
#[derive(Debug, Default)]
pub struct VisitedRegistry {
    keys: Mutex<HashSet<String>>,
}

impl VisitedRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits `key` if it has not been seen before
    ///
    /// Returns `true` for the first caller and `false` for every later one.
    pub fn try_admit(&self, key: &str) -> bool {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        if keys.contains(key) {
            return false;
        }
        keys.insert(key.to_string())
    }

    /// Returns true if `key` has already been admitted
    pub fn contains(&self, key: &str) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    /// Number of admitted keys
    pub fn len(&self) -> usize {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
