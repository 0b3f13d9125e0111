//! Fixed-capacity LRU cache.
//!
//! # Layout
//! ```text
//! index: HashMap<K, slot>      slots: Vec<Option<Node>>
//!
//!   head (LRU) ⇄ node ⇄ node ⇄ ... ⇄ tail (MRU)
//! ```
//!
//! Entries live in a slab of slots linked into a doubly linked list by slot
//! index. The hash index gives O(1) lookup; the list gives O(1) move-to-tail
//! and pop-from-head. Freed slots are recycled through a free list.

use parking_lot::Mutex;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

struct LruList<K, V> {
    index: HashMap<K, usize>,
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    /// Least recently used.
    head: Option<usize>,
    /// Most recently used.
    tail: Option<usize>,
}

impl<K, V> LruList<K, V>
where
    K: Hash + Eq + Clone,
{
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
        }
    }

    fn node(&self, idx: usize) -> Option<&Node<K, V>> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, idx: usize) -> Option<&mut Node<K, V>> {
        self.slots.get_mut(idx).and_then(Option::as_mut)
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.node(idx) {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(node) = self.node_mut(p) {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.node_mut(n) {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }

        if let Some(node) = self.node_mut(idx) {
            node.prev = None;
            node.next = None;
        }
    }

    fn push_back(&mut self, idx: usize) {
        let old_tail = self.tail;
        if let Some(node) = self.node_mut(idx) {
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail {
            Some(t) => {
                if let Some(node) = self.node_mut(t) {
                    node.next = Some(idx);
                }
            }
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }

    fn touch(&mut self, idx: usize) {
        if self.tail != Some(idx) {
            self.unlink(idx);
            self.push_back(idx);
        }
    }

    fn take(&mut self, idx: usize) -> Option<(K, V)> {
        self.unlink(idx);
        let node = self.slots.get_mut(idx)?.take()?;
        self.index.remove(&node.key);
        self.free.push(idx);
        Some((node.key, node.value))
    }

    fn pop_front(&mut self) -> Option<(K, V)> {
        let idx = self.head?;
        self.take(idx)
    }

    fn insert_back(&mut self, key: K, value: V) {
        let node = Some(Node {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        });
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = node;
                idx
            }
            None => {
                self.slots.push(node);
                self.slots.len() - 1
            }
        };
        self.index.insert(key, idx);
        self.push_back(idx);
    }

    fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }
}

/// A thread-safe key/value cache bounded to `max_size` entries.
///
/// Both [`get`](Self::get) and [`set`](Self::set) mark an entry as most
/// recently used. When a new key arrives at capacity, the entry touched
/// longest ago is evicted. [`has`](Self::has) is a pure observer.
pub struct BoundedLruCache<K, V> {
    max_size: usize,
    inner: Mutex<LruList<K, V>>,
}

impl<K, V> BoundedLruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create an empty cache holding at most `max_size` entries.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            inner: Mutex::new(LruList::new()),
        }
    }

    /// Look up `key`, marking it most recently used when present.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut list = self.inner.lock();
        let idx = *list.index.get(key)?;
        list.touch(idx);
        list.node(idx).map(|node| node.value.clone())
    }

    /// Insert or update `key`.
    ///
    /// Returns the entry evicted to make room, if any. With a capacity of
    /// zero nothing is stored and the new entry itself is returned.
    pub fn set(&self, key: K, value: V) -> Option<(K, V)> {
        if self.max_size == 0 {
            return Some((key, value));
        }

        let mut list = self.inner.lock();
        if let Some(&idx) = list.index.get(&key) {
            if let Some(node) = list.node_mut(idx) {
                node.value = value;
            }
            list.touch(idx);
            return None;
        }

        let evicted = if list.index.len() >= self.max_size {
            list.pop_front()
        } else {
            None
        };
        list.insert_back(key, value);
        evicted
    }

    /// Presence check. Does not change recency order.
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().index.contains_key(key)
    }

    /// Remove `key`, returning its value.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut list = self.inner.lock();
        let idx = *list.index.get(key)?;
        list.take(idx).map(|(_, value)| value)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> Vec<K> {
        let list = self.inner.lock();
        let mut keys = Vec::with_capacity(list.index.len());
        let mut cursor = list.head;
        while let Some(idx) = cursor {
            match list.node(idx) {
                Some(node) => {
                    keys.push(node.key.clone());
                    cursor = node.next;
                }
                None => break,
            }
        }
        keys
    }
}

impl<K, V> fmt::Debug for BoundedLruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedLruCache")
            .field("max_size", &self.max_size)
            .field("len", &self.inner.lock().index.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_key() {
        let cache: BoundedLruCache<String, u32> = BoundedLruCache::new(4);
        assert!(cache.get("nope").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_existing_key_updates_value() {
        let cache = BoundedLruCache::new(2);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        assert!(cache.set("a".to_string(), 10).is_none());

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(10));
        // "a" was refreshed by the update, so "b" is now the oldest.
        assert_eq!(cache.keys(), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_eviction_returns_lru_entry() {
        let cache = BoundedLruCache::new(2);
        cache.set("a", 1);
        cache.set("b", 2);
        let evicted = cache.set("c", 3);
        assert_eq!(evicted, Some(("a", 1)));
        assert_eq!(cache.keys(), vec!["b", "c"]);
    }

    #[test]
    fn test_has_does_not_refresh() {
        let cache = BoundedLruCache::new(2);
        cache.set("a", 1);
        cache.set("b", 2);
        assert!(cache.has(&"a"));
        cache.set("c", 3);
        assert!(!cache.has(&"a"));
        assert!(cache.has(&"b"));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let cache = BoundedLruCache::new(0);
        assert_eq!(cache.set("a", 1), Some(("a", 1)));
        assert_eq!(cache.len(), 0);
        assert!(cache.get(&"a").is_none());
    }

    #[test]
    fn test_capacity_one() {
        let cache = BoundedLruCache::new(1);
        cache.set("a", 1);
        assert_eq!(cache.set("b", 2), Some(("a", 1)));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"b"), Some(2));
        for _ in 0..5 {
            cache.set("b", 3);
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove_and_slot_reuse() {
        let cache = BoundedLruCache::new(3);
        cache.set(1, "one");
        cache.set(2, "two");
        cache.set(3, "three");
        assert_eq!(cache.remove(&2), Some("two"));
        assert_eq!(cache.keys(), vec![1, 3]);

        cache.set(4, "four");
        assert_eq!(cache.keys(), vec![1, 3, 4]);
        assert_eq!(cache.inner.lock().slots.len(), 3);

        cache.set(5, "five");
        assert_eq!(cache.keys(), vec![3, 4, 5]);
    }

    #[test]
    fn test_clear() {
        let cache = BoundedLruCache::new(3);
        cache.set(1, 1);
        cache.set(2, 2);
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.keys().is_empty());
        cache.set(3, 3);
        assert_eq!(cache.keys(), vec![3]);
    }

    #[test]
    fn test_concurrent_sets_respect_capacity() {
        use std::sync::Arc;
        use std::thread;

        let cache = Arc::new(BoundedLruCache::new(16));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..200 {
                        cache.set(format!("{t}-{i}"), i);
                        let _ = cache.get(&format!("{t}-{}", i / 2));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 16);
        assert_eq!(cache.keys().len(), 16);
    }
}
