#![allow(clippy::type_complexity)]
#![warn(missing_docs)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod cache;
mod query;
mod query_client;
mod query_options;
mod query_scope;
mod use_query;
mod utils;

pub use query_client::*;
pub use query_options::*;
pub use query_scope::*;
pub use use_query::*;

#[cfg(test)]
mod test {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use any_spawner::Executor;
    use leptos::prelude::*;

    use rstest::*;

    use super::*;

    const DEFAULT_FETCHER_MS: u64 = 30;

    macro_rules! prep {
        () => {{
            _ = Executor::init_tokio();
            let owner = Owner::new();
            owner.set();
            (QueryClient::new(), owner)
        }};
    }

    /// Let spawned effects and fetches make progress for `ms`.
    async fn settle(ms: u64) {
        Executor::tick().await;
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    fn default_fetcher(
        name: &'static str,
        options: QueryOptions,
    ) -> (QueryScope<u64, u64, String>, Arc<AtomicUsize>) {
        let fetch_calls = Arc::new(AtomicUsize::new(0));
        let fetcher_src = {
            let fetch_calls = fetch_calls.clone();
            move |key: u64| {
                let fetch_calls = fetch_calls.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(DEFAULT_FETCHER_MS)).await;
                    fetch_calls.fetch_add(1, Ordering::Relaxed);
                    Ok(key * 2)
                }
            }
        };
        (
            QueryScope::new(name, fetcher_src).with_options(options),
            fetch_calls,
        )
    }

    /// Fails the first `failures` calls, then succeeds.
    fn flaky_fetcher(failures: usize) -> (QueryScope<u64, u64, String>, Arc<AtomicUsize>) {
        let fetch_calls = Arc::new(AtomicUsize::new(0));
        let scope = QueryScope::new("flaky", {
            let fetch_calls = fetch_calls.clone();
            move |key: u64| {
                let call = fetch_calls.fetch_add(1, Ordering::Relaxed);
                async move {
                    if call < failures {
                        Err(format!("call {call} failed"))
                    } else {
                        Ok(key * 2)
                    }
                }
            }
        });
        (scope, fetch_calls)
    }

    /// Revisiting a fresh key is served from the cache, each new key is fetched once.
    #[rstest]
    #[tokio::test]
    async fn test_fresh_cache_hit(#[values(1, 2, 7)] page: u64) {
        let client = QueryClient::new();
        let (fetcher, fetch_calls) = default_fetcher("pages", QueryOptions::new());

        assert_eq!(client.fetch_query(&fetcher, page).await, Ok(page * 2));
        assert_eq!(fetch_calls.load(Ordering::Relaxed), 1);
        assert_eq!(client.fetch_query(&fetcher, page).await, Ok(page * 2));
        assert_eq!(fetch_calls.load(Ordering::Relaxed), 1);

        assert_eq!(client.fetch_query(&fetcher, page + 1).await, Ok((page + 1) * 2));
        assert_eq!(fetch_calls.load(Ordering::Relaxed), 2);
        assert_eq!(client.fetch_query(&fetcher, page).await, Ok(page * 2));
        assert_eq!(fetch_calls.load(Ordering::Relaxed), 2);
    }

    /// Concurrent requests for one key share a single fetch, different keys don't block each other.
    #[rstest]
    #[tokio::test]
    async fn test_concurrent_fetches_deduplicated() {
        let client = QueryClient::new();
        let (fetcher, fetch_calls) = default_fetcher("pages", QueryOptions::new());

        let (a, b, c) = futures::join!(
            client.fetch_query(&fetcher, 1),
            client.fetch_query(&fetcher, 1),
            client.fetch_query(&fetcher, 1),
        );
        assert_eq!((a, b, c), (Ok(2), Ok(2), Ok(2)));
        assert_eq!(fetch_calls.load(Ordering::Relaxed), 1);

        let (a, b) = futures::join!(client.fetch_query(&fetcher, 2), client.fetch_query(&fetcher, 3));
        assert_eq!((a, b), (Ok(4), Ok(6)));
        assert_eq!(fetch_calls.load(Ordering::Relaxed), 3);
    }

    #[rstest]
    #[tokio::test]
    async fn test_is_fetching_during_fetch() {
        let client = QueryClient::new();
        let (fetcher, _fetch_calls) = default_fetcher("pages", QueryOptions::new());

        assert!(!client.is_fetching(&fetcher, 1));
        let (result, ()) = futures::join!(client.fetch_query(&fetcher, 1), async {
            tokio::time::sleep(Duration::from_millis(DEFAULT_FETCHER_MS / 3)).await;
            assert!(client.is_fetching(&fetcher, 1));
            assert!(!client.is_fetching(&fetcher, 2));
        });
        assert_eq!(result, Ok(2));
        assert!(!client.is_fetching(&fetcher, 1));
    }

    /// Repeated prefetches within the freshness window hit the network once.
    #[rstest]
    #[tokio::test]
    async fn test_prefetch_idempotent_while_fresh() {
        let client = QueryClient::new();
        let (fetcher, fetch_calls) = default_fetcher(
            "user",
            QueryOptions::new().with_stale_time(Duration::from_secs(60 * 10)),
        );

        client.prefetch_query(&fetcher, 5).await;
        client.prefetch_query(&fetcher, 5).await;
        futures::join!(client.prefetch_query(&fetcher, 5), client.prefetch_query(&fetcher, 5));
        assert_eq!(fetch_calls.load(Ordering::Relaxed), 1);
        assert_eq!(client.get_cached_query(&fetcher, 5), Some(10));
    }

    #[rstest]
    #[tokio::test]
    async fn test_stale_refetched_on_next_access() {
        const STALE_MS: u64 = 20;
        let client = QueryClient::new();
        let (fetcher, fetch_calls) = default_fetcher(
            "pages",
            QueryOptions::new().with_stale_time(Duration::from_millis(STALE_MS)),
        );

        client.prefetch_query(&fetcher, 1).await;
        assert!(!client.is_stale(&fetcher, 1));
        tokio::time::sleep(Duration::from_millis(STALE_MS * 2)).await;
        assert!(client.is_stale(&fetcher, 1));
        // Stale value stays readable until replaced:
        assert_eq!(client.get_cached_query(&fetcher, 1), Some(2));

        client.prefetch_query(&fetcher, 1).await;
        assert_eq!(fetch_calls.load(Ordering::Relaxed), 2);
        assert!(!client.is_stale(&fetcher, 1));
    }

    /// Failures are returned but never cached, so a later call can succeed.
    #[rstest]
    #[tokio::test]
    async fn test_errors_not_cached() {
        let client = QueryClient::new();
        let (fetcher, fetch_calls) = flaky_fetcher(2);

        assert_eq!(
            client.fetch_query(&fetcher, 1).await,
            Err("call 0 failed".to_string())
        );
        assert!(!client.query_exists(&fetcher, 1));

        client.prefetch_query(&fetcher, 1).await;
        assert!(!client.query_exists(&fetcher, 1));

        assert_eq!(client.fetch_query(&fetcher, 1).await, Ok(2));
        assert_eq!(client.fetch_query(&fetcher, 1).await, Ok(2));
        assert_eq!(fetch_calls.load(Ordering::Relaxed), 3);
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum InvalidationType {
        Query,
        Scope,
        All,
    }

    #[rstest]
    #[tokio::test]
    async fn test_invalidation(
        #[values(InvalidationType::Query, InvalidationType::Scope, InvalidationType::All)]
        invalidation_type: InvalidationType,
    ) {
        let client = QueryClient::new();
        let (fetcher, fetch_calls) = default_fetcher("pages", QueryOptions::new());
        let (other, other_calls) = default_fetcher("other", QueryOptions::new());

        client.prefetch_query(&fetcher, 1).await;
        client.prefetch_query(&fetcher, 2).await;
        client.prefetch_query(&other, 1).await;

        match invalidation_type {
            InvalidationType::Query => {
                assert!(client.invalidate_query(&fetcher, 1));
                assert!(!client.invalidate_query(&fetcher, 99));
            }
            InvalidationType::Scope => client.invalidate_query_scope(&fetcher),
            InvalidationType::All => client.invalidate_all_queries(),
        }

        assert!(client.is_stale(&fetcher, 1));
        assert_eq!(
            client.is_stale(&fetcher, 2),
            invalidation_type != InvalidationType::Query
        );
        assert_eq!(
            client.is_stale(&other, 1),
            invalidation_type == InvalidationType::All
        );

        // Invalidated values are still readable:
        assert_eq!(client.get_cached_query(&fetcher, 1), Some(2));

        client.prefetch_query(&fetcher, 1).await;
        client.prefetch_query(&fetcher, 2).await;
        client.prefetch_query(&other, 1).await;
        let expected_fetcher_calls = match invalidation_type {
            InvalidationType::Query => 3,
            InvalidationType::Scope | InvalidationType::All => 4,
        };
        assert_eq!(fetch_calls.load(Ordering::Relaxed), expected_fetcher_calls);
        assert_eq!(
            other_calls.load(Ordering::Relaxed),
            if invalidation_type == InvalidationType::All { 2 } else { 1 }
        );
    }

    /// set_query
    /// seed_query
    /// update_query
    /// remove_query
    /// query_exists
    /// clear
    /// size
    #[rstest]
    #[tokio::test]
    async fn test_declaratives() {
        let client = QueryClient::new();
        let (fetcher, fetch_calls) = default_fetcher("pages", QueryOptions::new());

        let key = 1;
        assert!(!client.query_exists(&fetcher, key));
        assert!(client.seed_query(&fetcher, key, 100));
        // Seeding never overwrites:
        assert!(!client.seed_query(&fetcher, key, 200));
        assert_eq!(client.get_cached_query(&fetcher, key), Some(100));
        // Seeded values are fresh, so no fetch happens:
        assert_eq!(client.fetch_query(&fetcher, key).await, Ok(100));
        assert_eq!(fetch_calls.load(Ordering::Relaxed), 0);

        client.set_query(&fetcher, key, 3);
        assert_eq!(client.get_cached_query(&fetcher, key), Some(3));
        assert!(client.update_query(&fetcher, key, |value| value
            .map(|v| {
                *v *= 2;
                true
            })
            .unwrap_or(false)));
        assert_eq!(client.get_cached_query(&fetcher, key), Some(6));
        assert!(!client.update_query(&fetcher, 99, |value| value.is_some()));

        client.set_query(&fetcher, 2, 4);
        assert_eq!(client.size(), 2);
        assert_eq!(client.remove_query(&fetcher, key), Some(6));
        assert_eq!(client.remove_query(&fetcher, key), None);
        assert!(!client.query_exists(&fetcher, key));
        assert_eq!(client.size(), 1);

        client.clear();
        assert_eq!(client.size(), 0);
        assert_eq!(client.fetch_query(&fetcher, 2).await, Ok(4));
        assert_eq!(fetch_calls.load(Ordering::Relaxed), 1);
    }

    /// The same key under different scope names, or in different clients, never collides.
    #[rstest]
    #[tokio::test]
    async fn test_cache_isolation() {
        let client = QueryClient::new();
        let (pages, _) = default_fetcher("pages", QueryOptions::new());
        let (users, _) = default_fetcher("users", QueryOptions::new());

        client.set_query(&pages, 1, 10);
        assert_eq!(client.get_cached_query(&users, 1), None);
        client.set_query(&users, 1, 20);
        assert_eq!(client.get_cached_query(&pages, 1), Some(10));

        // A clone shares the cache, a new client doesn't:
        assert_eq!(client.clone().get_cached_query(&pages, 1), Some(10));
        assert_eq!(QueryClient::new().get_cached_query(&pages, 1), None);
    }

    /// Scopes sharing a name but storing different types get separate caches.
    #[rstest]
    #[tokio::test]
    async fn test_same_name_different_types_isolated() {
        let client = QueryClient::new();
        let (numbers, _) = default_fetcher("users", QueryOptions::new());
        let names = QueryScope::new("users", |key: u64| async move {
            Ok::<_, String>(format!("user {key}"))
        });

        client.set_query(&numbers, 1, 1);
        assert_eq!(client.get_cached_query(&names, 1), None);
        assert!(!client.query_exists(&names, 1));
        assert_eq!(client.fetch_query(&names, 1).await, Ok("user 1".to_string()));
        assert_eq!(client.get_cached_query(&numbers, 1), Some(1));
        assert_eq!(client.size(), 2);

        client.invalidate_query_scope(&names);
        assert!(client.is_stale(&names, 1));
        assert!(!client.is_stale(&numbers, 1));
    }

    #[rstest]
    #[tokio::test]
    async fn test_gc() {
        const GC_MS: u64 = 20;
        let client =
            QueryClient::new().with_options(QueryOptions::new().with_gc_time(Duration::from_millis(GC_MS)));
        let (fetcher, fetch_calls) = default_fetcher("pages", QueryOptions::new());

        client.prefetch_query(&fetcher, 1).await;
        tokio::time::sleep(Duration::from_millis(GC_MS * 2)).await;
        // Eviction happens lazily when the scope next fetches:
        assert!(client.query_exists(&fetcher, 1));
        client.prefetch_query(&fetcher, 2).await;
        assert!(!client.query_exists(&fetcher, 1));
        assert_eq!(client.size(), 1);

        client.prefetch_query(&fetcher, 1).await;
        assert_eq!(fetch_calls.load(Ordering::Relaxed), 3);
    }

    /// Walks a reactive key through a failure, a new key, a retry, a stale revisit and an abandoned fetch.
    #[rstest]
    #[tokio::test]
    async fn test_use_query_key_changes() {
        const STALE_MS: u64 = 100;
        tokio::task::LocalSet::new()
            .run_until(async move {
                let (client, _owner) = prep!();
                let fetch_calls = Arc::new(AtomicUsize::new(0));
                let fetcher = QueryScope::new("hook", {
                    let fetch_calls = fetch_calls.clone();
                    move |key: u64| {
                        let call = fetch_calls.fetch_add(1, Ordering::Relaxed);
                        async move {
                            tokio::time::sleep(Duration::from_millis(DEFAULT_FETCHER_MS)).await;
                            if call == 0 {
                                Err("boom".to_string())
                            } else {
                                Ok(key * 2)
                            }
                        }
                    }
                })
                .with_options(QueryOptions::new().with_stale_time(Duration::from_millis(STALE_MS)));

                let key = RwSignal::new(1_u64);
                let state = use_query(&client, fetcher.clone(), move || key.get(), None);

                // First load fails:
                settle(10).await;
                assert!(state.is_loading());
                assert!(state.is_fetching());
                assert_eq!(state.data(), None);
                settle(50).await;
                assert_eq!(state.error(), Some("boom".to_string()));
                assert_eq!(state.data(), None);
                assert!(!state.is_loading());
                assert!(!state.is_fetching());

                // A new key loads from scratch:
                key.set(2);
                settle(10).await;
                assert!(state.is_loading());
                assert!(state.is_fetching());
                assert_eq!(state.error(), None);
                settle(50).await;
                assert_eq!(state.data(), Some(4));
                assert!(!state.is_fetching());

                // The failed key wasn't cached, so returning to it retries:
                key.set(1);
                settle(10).await;
                assert!(state.is_loading());
                assert_eq!(state.data(), None);
                settle(50).await;
                assert_eq!(state.data(), Some(2));
                assert_eq!(state.error(), None);
                assert_eq!(fetch_calls.load(Ordering::Relaxed), 3);

                // A stale revisit shows the cached value while refetching in the background:
                settle(STALE_MS).await;
                key.set(2);
                settle(10).await;
                assert_eq!(state.data(), Some(4));
                assert!(!state.is_loading());
                assert!(state.is_fetching());
                settle(50).await;
                assert_eq!(state.data(), Some(4));
                assert!(!state.is_fetching());
                assert_eq!(fetch_calls.load(Ordering::Relaxed), 4);

                // Leaving a key mid-fetch drops its result from the state, the cache still keeps it:
                key.set(1);
                settle(10).await;
                assert_eq!(state.data(), Some(2));
                assert!(state.is_fetching());
                key.set(2);
                settle(10).await;
                assert_eq!(state.data(), Some(4));
                assert!(!state.is_fetching());
                settle(50).await;
                assert_eq!(state.data(), Some(4));
                assert!(!state.is_fetching());
                assert_eq!(fetch_calls.load(Ordering::Relaxed), 5);
                assert!(!client.is_stale(&fetcher, 1));
                assert_eq!(client.get_cached_query(&fetcher, 1), Some(2));
            })
            .await;
    }

    /// The initial value is served for the first key without a fetch.
    #[rstest]
    #[tokio::test]
    async fn test_use_query_initial_value() {
        tokio::task::LocalSet::new()
            .run_until(async move {
                let (client, _owner) = prep!();
                let (fetcher, fetch_calls) = default_fetcher("hook", QueryOptions::new());

                let key = RwSignal::new(1_u64);
                let state = use_query(&client, fetcher.clone(), move || key.get(), Some(100));
                settle(10).await;
                assert_eq!(state.data(), Some(100));
                assert!(!state.is_fetching());
                assert_eq!(fetch_calls.load(Ordering::Relaxed), 0);

                // Only the first key is seeded:
                key.set(2);
                settle(10).await;
                assert!(state.is_loading());
                settle(50).await;
                assert_eq!(state.data(), Some(4));
                assert_eq!(fetch_calls.load(Ordering::Relaxed), 1);
                assert_eq!(client.get_cached_query(&fetcher, 1), Some(100));
            })
            .await;
    }

    /// A fetch finishing after its owner was cleaned up leaves the state untouched.
    #[rstest]
    #[tokio::test]
    async fn test_use_query_result_dropped_after_cleanup() {
        tokio::task::LocalSet::new()
            .run_until(async move {
                let (client, owner) = prep!();
                let (fetcher, fetch_calls) = default_fetcher("hook", QueryOptions::new());

                let child = owner.child();
                let state = child.with(|| use_query(&client, fetcher.clone(), || 3, None));
                settle(10).await;
                assert!(state.is_loading());

                child.cleanup();
                settle(50).await;
                assert_eq!(state.data(), None);
                assert!(state.is_fetching());
                assert_eq!(fetch_calls.load(Ordering::Relaxed), 1);
                assert_eq!(client.get_cached_query(&fetcher, 3), Some(6));
            })
            .await;
    }
}
