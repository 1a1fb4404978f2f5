use std::{
    hash::{DefaultHasher, Hash, Hasher},
    time::Duration,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct KeyHash(u64);

impl KeyHash {
    pub fn new<K: Hash>(key: &K) -> Self {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        Self(hasher.finish())
    }
}

impl Hash for KeyHash {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// Adds a std duration to a datetime, saturating instead of overflowing on huge durations like [`Duration::MAX`].
pub(crate) fn safe_dt_dur_add(
    dt: chrono::DateTime<chrono::Utc>,
    dur: Duration,
) -> chrono::DateTime<chrono::Utc> {
    chrono::TimeDelta::from_std(dur)
        .ok()
        .and_then(|delta| dt.checked_add_signed(delta))
        .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC)
}
