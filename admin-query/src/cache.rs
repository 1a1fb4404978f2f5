use std::{
    any::Any,
    collections::{HashMap, hash_map::Entry},
    fmt::Debug,
    future::Future,
    sync::Arc,
};

use crate::{
    QueryOptions,
    query::Query,
    query_scope::ScopeCacheKey,
    utils::KeyHash,
};

#[derive(Debug)]
pub(crate) struct Scope<V> {
    cache: HashMap<KeyHash, Query<V>>,
    // To make sure parallel fetches for the same key aren't happening across different callers.
    fetcher_mutexes: HashMap<KeyHash, Arc<futures::lock::Mutex<()>>>,
}

impl<V> Default for Scope<V> {
    fn default() -> Self {
        Self {
            cache: HashMap::new(),
            fetcher_mutexes: HashMap::new(),
        }
    }
}

impl<V> Scope<V> {
    pub fn insert(&mut self, key_hash: KeyHash, query: Query<V>) {
        self.cache.insert(key_hash, query);
    }

    pub fn get(&self, key_hash: &KeyHash) -> Option<&Query<V>> {
        self.cache.get(key_hash)
    }

    pub fn get_mut(&mut self, key_hash: &KeyHash) -> Option<&mut Query<V>> {
        self.cache.get_mut(key_hash)
    }

    pub fn contains_key(&self, key_hash: &KeyHash) -> bool {
        self.cache.contains_key(key_hash)
    }

    pub fn remove_entry(&mut self, key_hash: &KeyHash) -> Option<(KeyHash, Query<V>)> {
        self.cache.remove_entry(key_hash)
    }

    fn is_empty(&self) -> bool {
        self.cache.is_empty() && self.fetcher_mutexes.is_empty()
    }

    /// Evicts queries not updated within their gc time, returns how many were removed.
    fn gc(&mut self, now: chrono::DateTime<chrono::Utc>) -> usize {
        let before = self.cache.len();
        self.cache.retain(|_, query| !query.expired(now));
        // Only drop mutexes nobody is holding, an in-flight fetch must keep its lock:
        let cache = &self.cache;
        self.fetcher_mutexes.retain(|key_hash, mutex| {
            cache.contains_key(key_hash) || Arc::strong_count(mutex) > 1
        });
        before - self.cache.len()
    }
}

pub(crate) trait ScopeTrait: Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn invalidate_scope(&mut self);
    fn clear(&mut self);
    fn size(&self) -> usize;
}

impl<V: Send + Sync + 'static> ScopeTrait for Scope<V> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn invalidate_scope(&mut self) {
        for query in self.cache.values_mut() {
            query.invalidate();
        }
    }

    fn clear(&mut self) {
        self.cache.clear();
    }

    fn size(&self) -> usize {
        self.cache.len()
    }
}

pub(crate) type Scopes = HashMap<ScopeCacheKey, Box<dyn ScopeTrait>>;

/// The storage behind a [`crate::QueryClient`], one typed [`Scope`] per scope name.
#[derive(Default)]
pub(crate) struct Cache {
    scopes: parking_lot::Mutex<Scopes>,
}

impl Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("scopes", &self.scopes.lock().len())
            .finish()
    }
}

impl Cache {
    pub fn with_scope<V, T>(
        &self,
        cache_key: &ScopeCacheKey,
        cb: impl FnOnce(Option<&Scope<V>>) -> T,
    ) -> T
    where
        V: Send + Sync + 'static,
    {
        let guard = self.scopes.lock();
        let maybe_scope = guard.get(cache_key).map(|scope| {
            scope
                .as_any()
                .downcast_ref::<Scope<V>>()
                .expect("Cache entry type mismatch.")
        });
        cb(maybe_scope)
    }

    pub fn with_scope_mut<V, T>(
        &self,
        cache_key: ScopeCacheKey,
        create_scope_if_missing: bool,
        cb: impl FnOnce(Option<&mut Scope<V>>) -> T,
    ) -> T
    where
        V: Send + Sync + 'static,
    {
        let mut guard = self.scopes.lock();
        let maybe_scope = match guard.entry(cache_key) {
            Entry::Occupied(entry) => Some(entry.into_mut()),
            Entry::Vacant(entry) => {
                if create_scope_if_missing {
                    Some(entry.insert(Box::new(Scope::<V>::default())))
                } else {
                    None
                }
            }
        };

        if let Some(scope) = maybe_scope {
            cb(Some(
                scope
                    .as_any_mut()
                    .downcast_mut::<Scope<V>>()
                    .expect("Cache entry type mismatch."),
            ))
        } else {
            cb(None)
        }
    }

    pub fn with_all_scopes_mut<T>(&self, cb: impl FnOnce(&mut Scopes) -> T) -> T {
        cb(&mut self.scopes.lock())
    }

    pub fn with_cached_query<V, T>(
        &self,
        key_hash: &KeyHash,
        cache_key: &ScopeCacheKey,
        cb: impl FnOnce(Option<&Query<V>>) -> T,
    ) -> T
    where
        V: Send + Sync + 'static,
    {
        self.with_scope::<V, _>(cache_key, |maybe_scope| {
            cb(maybe_scope.and_then(|scope| scope.get(key_hash)))
        })
    }

    pub fn fetcher_mutex<V>(
        &self,
        key_hash: KeyHash,
        cache_key: ScopeCacheKey,
    ) -> Arc<futures::lock::Mutex<()>>
    where
        V: Send + Sync + 'static,
    {
        self.with_scope_mut::<V, _>(cache_key, true, |scope| {
            scope
                .expect("provided a default")
                .fetcher_mutexes
                .entry(key_hash)
                .or_insert_with(|| Arc::new(futures::lock::Mutex::new(())))
                .clone()
        })
    }

    /// Whether a fetch currently holds the lock for this key.
    pub fn is_fetching<V>(&self, key_hash: &KeyHash, cache_key: &ScopeCacheKey) -> bool
    where
        V: Send + Sync + 'static,
    {
        self.with_scope::<V, _>(cache_key, |maybe_scope| {
            maybe_scope
                .and_then(|scope| scope.fetcher_mutexes.get(key_hash))
                .is_some_and(|mutex| mutex.try_lock().is_none())
        })
    }

    pub fn gc_scope<V>(&self, cache_key: ScopeCacheKey)
    where
        V: Send + Sync + 'static,
    {
        let now = chrono::Utc::now();
        let mut guard = self.scopes.lock();
        let (removed, remove_scope) = if let Some(scope) = guard.get_mut(&cache_key) {
            let scope = scope
                .as_any_mut()
                .downcast_mut::<Scope<V>>()
                .expect("Cache entry type mismatch.");
            let removed = scope.gc(now);
            (removed, scope.is_empty())
        } else {
            (0, false)
        };
        if remove_scope {
            guard.remove(&cache_key);
        }
        if removed > 0 {
            tracing::debug!(removed, "Garbage collected expired queries.");
        }
    }

    /// Fetch the value and store it, unless another caller is already fetching the same key,
    /// in which case wait for it and reuse its result if it stored a fresh one.
    ///
    /// Errors are returned to the caller but never cached.
    pub async fn cached_or_fetch<V, E, Fut>(
        &self,
        key_hash: KeyHash,
        cache_key: ScopeCacheKey,
        combined_options: QueryOptions,
        fetcher: impl FnOnce() -> Fut,
    ) -> Result<V, E>
    where
        V: Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>>,
    {
        let fetcher_mutex = self.fetcher_mutex::<V>(key_hash, cache_key);
        let _fetcher_guard = match fetcher_mutex.try_lock() {
            Some(fetcher_guard) => fetcher_guard,
            None => {
                // If have to wait, should check cache again in case it was fetched while waiting.
                let fetcher_guard = fetcher_mutex.lock().await;
                if let Some(cached) =
                    self.with_cached_query::<V, _>(&key_hash, &cache_key, |maybe_cached| {
                        maybe_cached
                            .filter(|cached| !cached.stale())
                            .map(|cached| cached.value().clone())
                    })
                {
                    tracing::debug!("Reused the result of a concurrent fetch.");
                    return Ok(cached);
                }
                fetcher_guard
            }
        };

        let result = fetcher().await;

        match &result {
            Ok(new_value) => {
                self.with_scope_mut::<V, _>(cache_key, true, |scope| {
                    let scope = scope.expect("provided a default");
                    if let Some(existing) = scope.get_mut(&key_hash) {
                        existing.set_value(new_value.clone());
                        existing.combined_options = combined_options;
                    } else {
                        scope.insert(key_hash, Query::new(new_value.clone(), combined_options));
                    }
                });
            }
            Err(_) => tracing::debug!("Fetch failed, leaving the cache untouched."),
        }

        result
    }
}
