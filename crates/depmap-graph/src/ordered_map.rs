//! Insertion-ordered string-keyed map.
//!
//! Layout output must be deterministic, so every registry that is iterated while laying out uses
//! this map instead of a hash map.

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

#[derive(Debug, Clone)]
pub struct OrderedStringMap<T> {
    inner: IndexMap<String, T, FxBuildHasher>,
}

impl<T> Default for OrderedStringMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OrderedStringMap<T> {
    pub fn new() -> Self {
        Self {
            inner: IndexMap::default(),
        }
    }

    /// Inserts or replaces `value`. Replacing keeps the key's original position.
    pub fn insert(&mut self, key: impl Into<String>, value: T) -> Option<T> {
        self.inner.insert(key.into(), value)
    }

    /// Returns the value for `key`, inserting `make()` at the end first if it is missing.
    pub fn get_or_insert_with<F>(&mut self, key: impl Into<String>, make: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        self.inner.entry(key.into()).or_insert_with(make)
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.inner.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.inner.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.inner.get_index_of(key)
    }

    /// Removes `key`, shifting later entries down so iteration order is preserved.
    pub fn remove(&mut self, key: &str) -> Option<T> {
        self.inner.shift_remove(key)
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str, &mut T) -> bool,
    {
        self.inner.retain(|k, v| keep(k.as_str(), v));
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(|k| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.inner.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.inner.values_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut T)> {
        self.inner.iter_mut().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, T> FromIterator<(K, T)> for OrderedStringMap<T>
where
    K: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_keeps_the_original_position() {
        let mut m: OrderedStringMap<i32> = OrderedStringMap::new();
        m.insert("b", 1);
        m.insert("a", 2);
        m.insert("b", 3);
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(m.get("b"), Some(&3));
    }

    #[test]
    fn remove_preserves_order_of_the_rest() {
        let mut m: OrderedStringMap<()> = ["a", "b", "c", "d"].into_iter().map(|k| (k, ())).collect();
        m.remove("b");
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["a", "c", "d"]);
        assert_eq!(m.index_of("d"), Some(2));
    }
}
