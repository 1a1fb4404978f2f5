use std::{
    any::TypeId,
    fmt::{self, Debug, Formatter},
    future::Future,
    hash::{DefaultHasher, Hash, Hasher},
    pin::Pin,
    sync::Arc,
};

use crate::QueryOptions;

/// Identifies the cache of one query scope, the resource-type half of a `(scope, key)` cache key.
///
/// The key and value types are hashed in alongside the name, scopes that share a name
/// but store different types get separate caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScopeCacheKey(u64);

impl ScopeCacheKey {
    pub fn new<K: 'static, V: 'static>(name: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        TypeId::of::<(K, V)>().hash(&mut hasher);
        Self(hasher.finish())
    }
}

impl Hash for ScopeCacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

type QueryFut<V, E> = Pin<Box<dyn Future<Output = Result<V, E>>>>;

type QueryFn<K, V, E> = dyn Fn(K) -> QueryFut<V, E> + Send + Sync;

/// A named wrapper for a query function, the unit the [`crate::QueryClient`] caches by.
///
/// Two scopes with the same name and the same key and value types share one cache, so the name should be unique per resource type,
/// e.g. `"users"` for user pages and `"user"` for single users.
///
/// The [`QueryOptions`] set here are combined with the ones on the [`crate::QueryClient`], with the scope's taking precedence.
pub struct QueryScope<K, V, E> {
    name: &'static str,
    query: Arc<QueryFn<K, V, E>>,
    cache_key: ScopeCacheKey,
    options: QueryOptions,
}

impl<K, V, E> Clone for QueryScope<K, V, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            query: self.query.clone(),
            cache_key: self.cache_key,
            options: self.options,
        }
    }
}

impl<K, V, E> Debug for QueryScope<K, V, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryScope")
            .field("name", &self.name)
            .field("query", &"Arc<dyn Fn(K) -> Pin<Box<dyn Future<Output = Result<V, E>>>>")
            .field("options", &self.options)
            .finish()
    }
}

impl<K, V, E> QueryScope<K, V, E>
where
    K: 'static,
    V: 'static,
    E: 'static,
{
    /// Create a new [`QueryScope`] under the given name.
    pub fn new<Fut>(name: &'static str, query: impl Fn(K) -> Fut + Send + Sync + 'static) -> Self
    where
        Fut: Future<Output = Result<V, E>> + 'static,
    {
        Self {
            name,
            query: Arc::new(move |key: K| -> QueryFut<V, E> { Box::pin(query(key)) }),
            cache_key: ScopeCacheKey::new::<K, V>(name),
            options: QueryOptions::default(),
        }
    }

    /// Set specific [`QueryOptions`] to only apply to this query scope.
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }
}

impl<K, V, E> QueryScope<K, V, E> {
    /// The name this scope was registered under.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The options specific to this scope.
    pub fn options(&self) -> QueryOptions {
        self.options
    }

    pub(crate) fn cache_key(&self) -> ScopeCacheKey {
        self.cache_key
    }

    pub(crate) fn query(&self, key: K) -> QueryFut<V, E> {
        (self.query)(key)
    }
}
