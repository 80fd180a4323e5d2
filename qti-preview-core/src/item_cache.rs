//! Item cache
//!
//! Keeps every item definition fetched during a preview together with the
//! last state the runner submitted for it. Entries are never evicted: a
//! preview is small and short-lived.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::resolver::{ItemData, ResolvedItem};

/// One cached item.
///
/// `item_data` is shared so repeated hits hand out the very same definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemCacheEntry {
    pub item_data: Arc<ItemData>,
    pub item_state: Map<String, Value>,
}

impl From<ResolvedItem> for ItemCacheEntry {
    fn from(item: ResolvedItem) -> Self {
        Self {
            item_data: Arc::new(item.item_data),
            item_state: item.item_state,
        }
    }
}

impl ItemCacheEntry {
    /// Owned copy for handing to callers.
    pub fn to_resolved(&self) -> ResolvedItem {
        ResolvedItem {
            item_data: ItemData::clone(&self.item_data),
            item_state: self.item_state.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ItemCache {
    entries: HashMap<String, ItemCacheEntry>,
}

impl ItemCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    pub fn get(&self, identifier: &str) -> Option<&ItemCacheEntry> {
        self.entries.get(identifier)
    }

    pub fn put(&mut self, identifier: impl Into<String>, entry: ItemCacheEntry) {
        self.entries.insert(identifier.into(), entry);
    }

    /// Merge `partial` into the stored item state, key by key.
    ///
    /// Returns false when the item has not been cached yet.
    pub fn update_state(&mut self, identifier: &str, partial: Map<String, Value>) -> bool {
        match self.entries.get_mut(identifier) {
            Some(entry) => {
                entry.item_state.extend(partial);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. Only used when the session ends.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
