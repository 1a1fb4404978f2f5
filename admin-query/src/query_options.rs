use std::time::Duration;

pub(crate) const DEFAULT_STALE_TIME: Duration = Duration::from_secs(10);
pub(crate) const DEFAULT_GC_TIME: Duration = Duration::from_secs(300);

/// Configuration to be used with [`crate::QueryClient`] and individual query scopes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct QueryOptions {
    stale_time: Option<Duration>,
    gc_time: Option<Duration>,
}

impl QueryOptions {
    /// Create new [`QueryOptions`] with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration that should pass before a query is considered stale.
    ///
    /// Once stale, the next access to the query refetches it, whilst the stale value stays available.
    ///
    /// To never mark as stale, set [`std::time::Duration::MAX`].
    ///
    /// Default: `10 seconds`
    #[track_caller]
    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        if let Some(gc_time) = self.gc_time {
            // If stale_time is greater than gc_time, stale_time will be set to gc_time.
            if stale_time > gc_time {
                self.stale_time = Some(gc_time);
                return self;
            }
        }
        self.stale_time = Some(stale_time);
        self
    }

    /// Set the duration after which a query that hasn't been updated is evicted from the cache.
    ///
    /// To never garbage collect, set [`std::time::Duration::MAX`].
    ///
    /// Default: `5 minutes`
    #[track_caller]
    pub fn with_gc_time(mut self, gc_time: Duration) -> Self {
        if let Some(stale_time) = self.stale_time {
            if stale_time > gc_time {
                self.stale_time = Some(gc_time);
            }
        }
        self.gc_time = Some(gc_time);
        self
    }

    /// The duration that should pass before a query is considered stale.
    ///
    /// Default: `10 seconds`
    pub fn stale_time(&self) -> Duration {
        self.stale_time.unwrap_or(DEFAULT_STALE_TIME)
    }

    /// The duration after which a query that hasn't been updated is evicted.
    ///
    /// Default: `5 minutes`
    pub fn gc_time(&self) -> Duration {
        self.gc_time.unwrap_or(DEFAULT_GC_TIME)
    }
}

/// Scope options take precedence over the client's base options.
pub(crate) fn options_combine(base: QueryOptions, scope: QueryOptions) -> QueryOptions {
    let combined = QueryOptions {
        stale_time: scope.stale_time.or(base.stale_time),
        gc_time: scope.gc_time.or(base.gc_time),
    };
    // Re-apply the clamp, the two halves may have come from different sources:
    if combined.stale_time() > combined.gc_time() {
        QueryOptions {
            stale_time: Some(combined.gc_time()),
            ..combined
        }
    } else {
        combined
    }
}
