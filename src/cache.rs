//! Request memoization
//!
//! Every idempotent read the client performs is memoized for the lifetime of
//! the client. The key combines the request path, the query parameters and the
//! active language, so the same endpoint requested in two languages is cached
//! twice. Entries never expire: the catalog is treated as append-mostly within
//! a session, and `Client::clear_cache` is the explicit way to refresh.
//!
//! Login and token refresh bypass this cache entirely.

use crate::response::Outcome;
use crate::transport::TransportError;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// Query parameters. A `BTreeMap` so that parameter sets compare equal
/// regardless of the order they were built in.
pub type Params = BTreeMap<String, String>;

/// Builds a [`Params`] set from key/value pairs.
pub fn params<K, V, I>(pairs: I) -> Params
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: ToString,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.to_string()))
        .collect()
}

/// Identity of a memoized `GET` request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    /// Path with identifiers already substituted, e.g. `/series/121361`
    pub path: String,
    /// Normalized query parameters
    pub params: Params,
    /// Language sent as `Accept-Language`, `None` for the API default
    pub language: Option<String>,
}

impl RequestKey {
    pub fn new(path: impl Into<String>, params: &Params, language: Option<&str>) -> Self {
        Self {
            path: path.into(),
            params: params.clone(),
            language: language.map(str::to_string),
        }
    }

    /// The parameters as query pairs for the transport.
    pub fn query(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

type Slot = Arc<Mutex<Option<Outcome>>>;

/// Memoizes classified outcomes per [`RequestKey`].
///
/// Each key owns its own slot lock, so concurrent callers for the same key
/// wait for the first call to finish and then read its outcome, while calls
/// for other keys proceed independently.
#[derive(Default)]
pub(crate) struct RequestCache {
    entries: Mutex<HashMap<RequestKey, Slot>>,
}

impl RequestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the memoized outcome for `key`, running `call` on a miss.
    ///
    /// Success, Empty and Failure outcomes are all memoized. Transport errors
    /// are not: the slot stays empty so the next caller retries.
    ///
    /// # Arguments
    ///
    /// * `key` - Identity of the request
    /// * `call` - Performs and classifies the request; only run on a miss
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let key = RequestKey::new("/series/121361", &Params::new(), Some("en"));
    /// let outcome = cache.fetch(&key, || Ok(classify(transport.get(...)?)))?;
    /// ```
    pub fn fetch<F>(&self, key: &RequestKey, call: F) -> Result<Outcome, TransportError>
    where
        F: FnOnce() -> Result<Outcome, TransportError>,
    {
        // Find or create the slot, holding the map lock only briefly
        let slot = {
            let mut entries = lock(&self.entries);
            Arc::clone(entries.entry(key.clone()).or_default())
        };

        // Callers for the same key queue up here
        let mut slot = lock(&slot);
        if let Some(outcome) = slot.as_ref() {
            trace!(path = %key.path, language = ?key.language, "request cache hit");
            return Ok(outcome.clone());
        }

        // Miss: perform the call and remember whatever it classified to
        debug!(path = %key.path, params = ?key.params, language = ?key.language, "request cache miss");
        let outcome = call()?;
        *slot = Some(outcome.clone());
        Ok(outcome)
    }

    /// Drops every memoized outcome.
    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    /// Number of keys with a memoized outcome.
    pub fn len(&self) -> usize {
        lock(&self.entries)
            .values()
            .filter(|slot| lock(slot).is_some())
            .count()
    }
}

/// Locks a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn success() -> Result<Outcome, TransportError> {
        Ok(Outcome::Success(json!({"data": []})))
    }

    #[test]
    fn test_params_are_order_independent() {
        let a = params([("airedSeason", "1"), ("page", "2")]);
        let b = params([("page", "2"), ("airedSeason", "1")]);
        assert_eq!(
            RequestKey::new("/series/1/episodes/query", &a, Some("en")),
            RequestKey::new("/series/1/episodes/query", &b, Some("en"))
        );
    }

    #[test]
    fn test_language_is_part_of_the_key() {
        let empty = Params::new();
        assert_ne!(
            RequestKey::new("/series/1", &empty, Some("en")),
            RequestKey::new("/series/1", &empty, Some("it"))
        );
        assert_ne!(
            RequestKey::new("/series/1", &empty, None),
            RequestKey::new("/series/1", &empty, Some("en"))
        );
    }

    #[test]
    fn test_fetch_runs_call_once_per_key() {
        let cache = RequestCache::new();
        let calls = AtomicUsize::new(0);
        let key = RequestKey::new("/series/1", &Params::new(), None);

        for _ in 0..3 {
            cache
                .fetch(&key, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    success()
                })
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failure_and_empty_are_memoized() {
        let cache = RequestCache::new();
        let calls = AtomicUsize::new(0);
        let failing = RequestKey::new("/series/1", &Params::new(), None);
        let missing = RequestKey::new("/series/2", &Params::new(), None);

        for _ in 0..2 {
            let outcome = cache
                .fetch(&failing, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Outcome::Failure {
                        status: 500,
                        message: "boom".to_string(),
                    })
                })
                .unwrap();
            assert!(matches!(outcome, Outcome::Failure { status: 500, .. }));

            let outcome = cache
                .fetch(&missing, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Outcome::Empty)
                })
                .unwrap();
            assert!(outcome.is_empty());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_transport_errors_are_not_memoized() {
        let cache = RequestCache::new();
        let key = RequestKey::new("/series/1", &Params::new(), None);

        let result = cache.fetch(&key, || {
            Err(TransportError::RequestError("connection refused".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(cache.len(), 0);

        let outcome = cache.fetch(&key, success).unwrap();
        assert!(matches!(outcome, Outcome::Success(_)));
    }

    #[test]
    fn test_concurrent_callers_share_one_call() {
        let cache = RequestCache::new();
        let calls = AtomicUsize::new(0);
        let key = RequestKey::new("/series/1", &Params::new(), Some("en"));

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    cache
                        .fetch(&key, || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(std::time::Duration::from_millis(10));
                            success()
                        })
                        .unwrap();
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear() {
        let cache = RequestCache::new();
        let key = RequestKey::new("/series/1", &Params::new(), None);
        cache.fetch(&key, success).unwrap();
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
