use std::{borrow::Borrow, fmt::Display, hash::Hash, sync::Arc};

use leptos::prelude::{expect_context, provide_context};

use crate::{
    QueryOptions, QueryScope,
    cache::Cache,
    options_combine,
    query::Query,
    utils::KeyHash,
};

/// The [`QueryClient`] stores all query data, and is used to manage queries.
///
/// It is a cheap handle to one cache: clones share the same cache, separate clients never do.
/// Should be provided via leptos context at the top of the app.
///
/// # Example
///
/// ```ignore
/// use leptos::prelude::*;
/// use admin_query::QueryClient;
///
/// #[component]
/// pub fn App() -> impl IntoView {
///     QueryClient::new().provide();
///     // ...
/// }
///
/// #[component]
/// pub fn MyComponent() -> impl IntoView {
///     let client = QueryClient::expect();
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryClient {
    cache: Arc<Cache>,
    options: QueryOptions,
}

impl QueryClient {
    /// Creates a new [`QueryClient`] with an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base [`QueryOptions`] for this client.
    ///
    /// These options will be combined with any options for a specific query scope.
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// Provide the client via leptos context, returning it for further use.
    ///
    /// The client can then be accessed with [`QueryClient::expect()`] from any child component.
    pub fn provide(self) -> Self {
        provide_context(self.clone());
        self
    }

    /// Extract the [`QueryClient`] out of leptos context.
    ///
    /// # Panics
    ///
    /// Panics if the [`QueryClient`] has not been provided via leptos context by a parent component.
    #[track_caller]
    pub fn expect() -> Self {
        expect_context()
    }

    /// Read the base [`QueryOptions`] for this [`QueryClient`].
    pub fn options(&self) -> QueryOptions {
        self.options
    }

    /// Fetch a query, store it in the cache and return it.
    ///
    /// - Entry doesn't exist: fetched and stored in the cache.
    /// - Entry exists and **not** stale: the cached value is returned without fetching.
    /// - Entry exists but stale: refetched and updated in the cache.
    ///
    /// A concurrent call for the same key waits for the in-flight fetch instead of starting another one.
    /// Errors are returned but not cached, the next call will try again.
    pub async fn fetch_query<K, V, E>(
        &self,
        query_scope: &QueryScope<K, V, E>,
        key: impl Borrow<K>,
    ) -> Result<V, E>
    where
        K: Clone + Hash + 'static,
        V: Clone + Send + Sync + 'static,
        E: 'static,
    {
        let key = key.borrow();
        let key_hash = KeyHash::new(key);
        let cache_key = query_scope.cache_key();

        if let Some(cached) = self.cache.with_cached_query::<V, _>(&key_hash, &cache_key, |maybe_cached| {
            maybe_cached
                .filter(|cached| !cached.stale())
                .map(|cached| cached.value().clone())
        }) {
            tracing::debug!(scope = query_scope.name(), "Cache hit.");
            return Ok(cached);
        }

        self.cache.gc_scope::<V>(cache_key);

        tracing::debug!(scope = query_scope.name(), "Fetching.");
        let key = key.clone();
        self.cache
            .cached_or_fetch(
                key_hash,
                cache_key,
                self.combined_options(query_scope),
                move || query_scope.query(key),
            )
            .await
    }

    /// Prefetch a query and store it in the cache, without returning it.
    ///
    /// - Entry doesn't exist: fetched and stored in the cache.
    /// - Entry exists and **not** stale: nothing happens.
    /// - Entry exists but stale: refetched and updated in the cache.
    ///
    /// A failed prefetch is only logged, nothing is cached.
    pub async fn prefetch_query<K, V, E>(&self, query_scope: &QueryScope<K, V, E>, key: impl Borrow<K>)
    where
        K: Clone + Hash + 'static,
        V: Clone + Send + Sync + 'static,
        E: Display + 'static,
    {
        if let Err(e) = self.fetch_query(query_scope, key).await {
            tracing::warn!(scope = query_scope.name(), "Prefetch failed: {e}");
        }
    }

    /// Retrieve the current cached value of a query, if it exists, whether stale or not.
    pub fn get_cached_query<K, V, E>(
        &self,
        query_scope: &QueryScope<K, V, E>,
        key: impl Borrow<K>,
    ) -> Option<V>
    where
        K: Hash + 'static,
        V: Clone + Send + Sync + 'static,
        E: 'static,
    {
        self.cache.with_cached_query::<V, _>(
            &KeyHash::new(key.borrow()),
            &query_scope.cache_key(),
            |maybe_cached| maybe_cached.map(|cached| cached.value().clone()),
        )
    }

    /// Check if a query exists in the cache, whether stale or not.
    pub fn query_exists<K, V, E>(&self, query_scope: &QueryScope<K, V, E>, key: impl Borrow<K>) -> bool
    where
        K: Hash + 'static,
        V: Send + Sync + 'static,
        E: 'static,
    {
        self.cache.with_cached_query::<V, _>(
            &KeyHash::new(key.borrow()),
            &query_scope.cache_key(),
            |maybe_cached| maybe_cached.is_some(),
        )
    }

    /// Whether the query is missing, invalidated or past its stale time.
    pub fn is_stale<K, V, E>(&self, query_scope: &QueryScope<K, V, E>, key: impl Borrow<K>) -> bool
    where
        K: Hash + 'static,
        V: Send + Sync + 'static,
        E: 'static,
    {
        self.cache.with_cached_query::<V, _>(
            &KeyHash::new(key.borrow()),
            &query_scope.cache_key(),
            |maybe_cached| maybe_cached.is_none_or(|cached| cached.stale()),
        )
    }

    /// Whether a fetch for this query is currently in flight.
    pub fn is_fetching<K, V, E>(&self, query_scope: &QueryScope<K, V, E>, key: impl Borrow<K>) -> bool
    where
        K: Hash + 'static,
        V: Send + Sync + 'static,
        E: 'static,
    {
        self.cache
            .is_fetching::<V>(&KeyHash::new(key.borrow()), &query_scope.cache_key())
    }

    /// Set the value of a query in the cache, replacing any existing value and marking it fresh.
    pub fn set_query<K, V, E>(&self, query_scope: &QueryScope<K, V, E>, key: impl Borrow<K>, new_value: V)
    where
        K: Hash + 'static,
        V: Send + Sync + 'static,
        E: 'static,
    {
        let key_hash = KeyHash::new(key.borrow());
        let combined_options = self.combined_options(query_scope);
        self.cache
            .with_scope_mut::<V, _>(query_scope.cache_key(), true, |scope| {
                let scope = scope.expect("provided a default");
                if let Some(existing) = scope.get_mut(&key_hash) {
                    existing.set_value(new_value);
                } else {
                    scope.insert(key_hash, Query::new(new_value, combined_options));
                }
            });
    }

    /// Set the value of a query only if nothing is cached for it yet.
    ///
    /// Used to hand over initial data, returns `true` if the value was stored.
    pub fn seed_query<K, V, E>(
        &self,
        query_scope: &QueryScope<K, V, E>,
        key: impl Borrow<K>,
        initial_value: V,
    ) -> bool
    where
        K: Hash + 'static,
        V: Send + Sync + 'static,
        E: 'static,
    {
        let key_hash = KeyHash::new(key.borrow());
        let combined_options = self.combined_options(query_scope);
        self.cache
            .with_scope_mut::<V, _>(query_scope.cache_key(), true, |scope| {
                let scope = scope.expect("provided a default");
                if scope.contains_key(&key_hash) {
                    false
                } else {
                    scope.insert(key_hash, Query::new(initial_value, combined_options));
                    true
                }
            })
    }

    /// Synchronously update the value of a cached query in place.
    ///
    /// The callback receives `None` if the query isn't cached. The return value of the callback is passed through.
    pub fn update_query<K, V, E, T>(
        &self,
        query_scope: &QueryScope<K, V, E>,
        key: impl Borrow<K>,
        modifier: impl FnOnce(Option<&mut V>) -> T,
    ) -> T
    where
        K: Hash + 'static,
        V: Send + Sync + 'static,
        E: 'static,
    {
        let key_hash = KeyHash::new(key.borrow());
        self.cache
            .with_scope_mut::<V, _>(query_scope.cache_key(), false, |maybe_scope| {
                modifier(
                    maybe_scope
                        .and_then(|scope| scope.get_mut(&key_hash))
                        .map(|query| query.value_mut()),
                )
            })
    }

    /// Mark a query as stale, the next access will refetch it. The stale value stays readable until then.
    ///
    /// Returns `true` if the query existed.
    pub fn invalidate_query<K, V, E>(&self, query_scope: &QueryScope<K, V, E>, key: impl Borrow<K>) -> bool
    where
        K: Hash + 'static,
        V: Send + Sync + 'static,
        E: 'static,
    {
        let key_hash = KeyHash::new(key.borrow());
        let invalidated = self
            .cache
            .with_scope_mut::<V, _>(query_scope.cache_key(), false, |maybe_scope| {
                if let Some(query) = maybe_scope.and_then(|scope| scope.get_mut(&key_hash)) {
                    query.invalidate();
                    true
                } else {
                    false
                }
            });
        tracing::debug!(scope = query_scope.name(), invalidated, "Invalidated query.");
        invalidated
    }

    /// Mark every query of a scope as stale.
    pub fn invalidate_query_scope<K, V, E>(&self, query_scope: &QueryScope<K, V, E>)
    where
        V: Send + Sync + 'static,
    {
        self.cache.with_all_scopes_mut(|scopes| {
            if let Some(scope) = scopes.get_mut(&query_scope.cache_key()) {
                scope.invalidate_scope();
            }
        });
        tracing::debug!(scope = query_scope.name(), "Invalidated query scope.");
    }

    /// Mark every query in the cache as stale.
    pub fn invalidate_all_queries(&self) {
        self.cache.with_all_scopes_mut(|scopes| {
            for scope in scopes.values_mut() {
                scope.invalidate_scope();
            }
        });
        tracing::debug!("Invalidated all queries.");
    }

    /// Remove a query from the cache, returning its value if it existed.
    pub fn remove_query<K, V, E>(&self, query_scope: &QueryScope<K, V, E>, key: impl Borrow<K>) -> Option<V>
    where
        K: Hash + 'static,
        V: Send + Sync + 'static,
        E: 'static,
    {
        let key_hash = KeyHash::new(key.borrow());
        self.cache
            .with_scope_mut::<V, _>(query_scope.cache_key(), false, |maybe_scope| {
                maybe_scope
                    .and_then(|scope| scope.remove_entry(&key_hash))
                    .map(|(_, query)| query.into_value())
            })
    }

    /// Empty the cache, in-flight fetches will still store their results when they finish.
    pub fn clear(&self) {
        self.cache.with_all_scopes_mut(|scopes| {
            for scope in scopes.values_mut() {
                scope.clear();
            }
        });
    }

    /// The number of queries currently cached, across all scopes.
    pub fn size(&self) -> usize {
        self.cache
            .with_all_scopes_mut(|scopes| scopes.values().map(|scope| scope.size()).sum())
    }

    fn combined_options<K, V, E>(&self, query_scope: &QueryScope<K, V, E>) -> QueryOptions {
        options_combine(self.options, query_scope.options())
    }
}
