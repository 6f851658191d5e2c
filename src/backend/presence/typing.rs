//! Ephemeral typing sets, one per notebook.
//!
//! Nothing here is persisted. A notebook's entry disappears as soon as its
//! last typist stops.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::shared::NotebookId;

#[derive(Debug, Default)]
pub struct TypingTracker {
    sets: DashMap<NotebookId, HashSet<String>>,
}

impl TypingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` as typing; false when it already was
    pub fn start(&self, notebook_id: NotebookId, key: &str) -> bool {
        self.sets
            .entry(notebook_id)
            .or_default()
            .insert(key.to_string())
    }

    /// Clear `key`; false when it was not typing
    pub fn stop(&self, notebook_id: NotebookId, key: &str) -> bool {
        let removed = {
            match self.sets.get_mut(&notebook_id) {
                Some(mut set) => set.remove(key),
                None => false,
            }
        };
        self.sets.remove_if(&notebook_id, |_, set| set.is_empty());
        removed
    }

    pub fn typing_in(&self, notebook_id: NotebookId) -> Vec<String> {
        let mut keys: Vec<String> = self
            .sets
            .get(&notebook_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    pub fn has_entry(&self, notebook_id: NotebookId) -> bool {
        self.sets.contains_key(&notebook_id)
    }
}
