use dashmap::DashMap;
use std::hash::Hash;

/// In-process document store keyed by document id.
///
/// Every mutation goes through a DashMap shard lock, so a single `update`
/// is atomic with respect to other operations on the same key. Callers that
/// need read-modify-write sequences spanning an `.await` must serialize
/// them themselves (the chat layer does this with a per-room writer).
pub struct DocumentStore<K, V> {
    documents: DashMap<K, V>,
}

impl<K, V> DocumentStore<K, V>
where
    K: Clone + Hash + Eq + Send + Sync,
    V: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    /// Inserts or replaces a document, returning the previous version.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        self.documents.insert(key, value)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.documents.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.documents.contains_key(key)
    }

    /// Applies `f` to the stored document in place.
    ///
    /// Returns `None` when the key is absent.
    pub fn update<F, R>(&self, key: &K, f: F) -> Option<R>
    where
        F: FnOnce(&mut V) -> R,
    {
        self.documents.get_mut(key).map(|mut entry| f(entry.value_mut()))
    }

    /// Snapshot of every stored document, in no particular order.
    pub fn values(&self) -> Vec<V> {
        self.documents
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl<K, V> Default for DocumentStore<K, V>
where
    K: Clone + Hash + Eq + Send + Sync,
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}
