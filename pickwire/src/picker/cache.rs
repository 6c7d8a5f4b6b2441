use std::collections::HashSet;
use std::hash::Hash;

/// Selected-set cache kept beside a picker's items.
///
/// Updated every time an item's own selected flag flips, so reading the
/// current selection never walks the item tree. Iterates in selection order.
#[derive(Debug, Clone)]
pub struct SelectedSet<K: Clone + Eq + Hash> {
    order: Vec<K>,
    members: HashSet<K>,
}

impl<K: Clone + Eq + Hash> Default for SelectedSet<K> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            members: HashSet::new(),
        }
    }
}

impl<K: Clone + Eq + Hash> SelectedSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the key was not selected before.
    pub fn insert(&mut self, key: K) -> bool {
        if self.members.insert(key.clone()) {
            self.order.push(key);
            true
        } else {
            false
        }
    }

    /// Returns true if the key was selected.
    pub fn remove(&mut self, key: &K) -> bool {
        if self.members.remove(key) {
            self.order.retain(|k| k != key);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.members.contains(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The selection in single mode.
    pub fn single(&self) -> Option<&K> {
        self.order.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    /// Clear and return what was selected, in selection order.
    pub fn clear(&mut self) -> Vec<K> {
        self.members.clear();
        std::mem::take(&mut self.order)
    }
}
