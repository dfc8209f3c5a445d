//! Shared category lists for discrete variables.

use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

/// Hands out one shared `Arc<[String]>` per distinct category list, so that
/// many discrete columns (and many resampled copies of them) do not each
/// carry their own category strings.
///
/// The interner is an explicit service: construct one and pass it to the
/// places that build discrete data. Cloning a [`DataSet`](super::DataSet)
/// shares the interned lists by reference count.
#[derive(Debug, Default)]
pub struct CategoryInterner {
    table: Mutex<FxHashMap<Vec<String>, Arc<[String]>>>,
}

impl CategoryInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared list equal to `categories`, created on first use.
    pub fn intern(&self, categories: &[String]) -> Arc<[String]> {
        let mut table = self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(shared) = table.get(categories) {
            return Arc::clone(shared);
        }
        let shared: Arc<[String]> = categories.into();
        table.insert(categories.to_vec(), Arc::clone(&shared));
        shared
    }

    /// Number of distinct lists held.
    pub fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every list. Lists already handed out stay valid.
    pub fn clear(&self) {
        self.table
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}
