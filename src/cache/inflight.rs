//! Per-key registry of in-flight fetches
//!
//! Concurrent callers asking for the same key share one underlying future
//! and all receive its result, success or failure.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

use crate::data::ApiResult;

type SharedFetch<T> = Shared<BoxFuture<'static, ApiResult<T>>>;

/// Coalesces concurrent fetches by key
pub struct InFlight<K, T> {
    pending: Mutex<HashMap<K, SharedFetch<T>>>,
}

impl<K, T> Default for InFlight<K, T> {
    fn default() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, T> InFlight<K, T>
where
    K: Eq + Hash + Copy + std::fmt::Debug,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `fetch` for `key`, or joins the fetch already running for it
    ///
    /// When a fetch is already pending, `fetch` is dropped without being polled.
    pub async fn run<F>(&self, key: K, fetch: F) -> ApiResult<T>
    where
        F: Future<Output = ApiResult<T>> + Send + 'static,
    {
        let shared = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            match pending.get(&key) {
                Some(existing) => {
                    debug!(?key, "joining in-flight fetch");
                    existing.clone()
                }
                None => {
                    let shared = fetch.boxed().shared();
                    pending.insert(key, shared.clone());
                    shared
                }
            }
        };

        let result = shared.clone().await;

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending
            .get(&key)
            .is_some_and(|current| current.ptr_eq(&shared))
        {
            pending.remove(&key);
        }

        result
    }

    /// Number of keys with a fetch currently registered
    pub fn pending_count(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
