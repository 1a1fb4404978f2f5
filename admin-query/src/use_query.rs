use std::{
    fmt::{self, Debug, Formatter},
    hash::Hash,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use leptos::{
    prelude::{ArcRwSignal, Effect, Get, Set, on_cleanup},
    task::spawn_local,
};

use crate::{QueryClient, QueryScope};

/// The reactive state of a query driven by [`use_query`].
///
/// Every getter tracks, so reading one inside a view or memo re-renders when it changes.
pub struct QueryState<V: 'static, E: 'static> {
    data: ArcRwSignal<Option<V>>,
    error: ArcRwSignal<Option<E>>,
    is_fetching: ArcRwSignal<bool>,
}

impl<V, E> Clone for QueryState<V, E> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            is_fetching: self.is_fetching.clone(),
        }
    }
}

impl<V, E> Debug for QueryState<V, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryState").finish()
    }
}

impl<V, E> QueryState<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn new() -> Self {
        Self {
            data: ArcRwSignal::new(None),
            error: ArcRwSignal::new(None),
            is_fetching: ArcRwSignal::new(false),
        }
    }

    /// The value for the current key, `None` until loaded or after a failed fetch.
    pub fn data(&self) -> Option<V> {
        self.data.get()
    }

    /// The error of the last fetch for the current key, if it failed.
    pub fn error(&self) -> Option<E> {
        self.error.get()
    }

    /// A fetch for the current key is in flight, whether or not a value is already shown.
    pub fn is_fetching(&self) -> bool {
        self.is_fetching.get()
    }

    /// A fetch is in flight and there is nothing to show yet.
    pub fn is_loading(&self) -> bool {
        self.is_fetching.get() && self.data.get().is_none()
    }
}

/// Drive a query from a reactive key.
///
/// Whenever `keyer` changes, the cached value for the new key is shown straight away (if any)
/// and, if missing or stale, fetched through the [`QueryClient`].
///
/// `initial_value` is seeded into the cache for the first key only, and only if nothing is cached for it yet,
/// so the first render doesn't need a fetch.
///
/// Results arriving after the key changed, or after the owner was cleaned up, are dropped.
#[track_caller]
pub fn use_query<K, V, E>(
    client: &QueryClient,
    query_scope: QueryScope<K, V, E>,
    keyer: impl Fn() -> K + 'static,
    initial_value: Option<V>,
) -> QueryState<V, E>
where
    K: Clone + Hash + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    let state = QueryState::<V, E>::new();
    let generation = Arc::new(AtomicU64::new(0));
    let disposed = Arc::new(AtomicBool::new(false));

    on_cleanup({
        let disposed = disposed.clone();
        move || disposed.store(true, Ordering::Relaxed)
    });

    let client = client.clone();
    let mut initial_value = initial_value;
    Effect::new({
        let state = state.clone();
        move |_: Option<()>| {
            let key = keyer();
            if let Some(initial_value) = initial_value.take() {
                client.seed_query(&query_scope, &key, initial_value);
            }
            let this_generation = generation.fetch_add(1, Ordering::Relaxed) + 1;

            state.error.set(None);
            state.data.set(client.get_cached_query(&query_scope, &key));
            if !client.is_stale(&query_scope, &key) {
                state.is_fetching.set(false);
                return;
            }

            state.is_fetching.set(true);
            let client = client.clone();
            let query_scope = query_scope.clone();
            let state = state.clone();
            let generation = generation.clone();
            let disposed = disposed.clone();
            spawn_local(async move {
                let result = client.fetch_query(&query_scope, &key).await;
                if disposed.load(Ordering::Relaxed)
                    || generation.load(Ordering::Relaxed) != this_generation
                {
                    tracing::debug!(
                        scope = query_scope.name(),
                        "Dropping a result for an abandoned key."
                    );
                    return;
                }
                match result {
                    Ok(value) => state.data.set(Some(value)),
                    Err(e) => {
                        state.data.set(None);
                        state.error.set(Some(e));
                    }
                }
                state.is_fetching.set(false);
            });
        }
    });

    state
}
