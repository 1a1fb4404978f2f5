use std::fmt::Debug;

use crate::{QueryOptions, utils::safe_dt_dur_add};

/// A single cached value, owned by its scope's cache.
pub(crate) struct Query<V> {
    value: V,
    pub combined_options: QueryOptions,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    invalidated: bool,
}

impl<V> Debug for Query<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("updated_at", &self.updated_at)
            .field("invalidated", &self.invalidated)
            .finish()
    }
}

impl<V> Query<V> {
    pub fn new(value: V, combined_options: QueryOptions) -> Self {
        Self {
            value,
            combined_options,
            updated_at: chrono::Utc::now(),
            invalidated: false,
        }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    /// Replaces the value in place, resetting staleness.
    pub fn set_value(&mut self, value: V) {
        self.value = value;
        self.updated_at = chrono::Utc::now();
        self.invalidated = false;
    }

    pub fn into_value(self) -> V {
        self.value
    }

    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    pub fn invalidate(&mut self) {
        self.invalidated = true;
    }

    pub fn stale(&self) -> bool {
        if self.invalidated {
            true
        } else {
            chrono::Utc::now()
                > safe_dt_dur_add(self.updated_at, self.combined_options.stale_time())
        }
    }

    pub fn expired(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        now > safe_dt_dur_add(self.updated_at, self.combined_options.gc_time())
    }
}
