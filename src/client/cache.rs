use super::ClientError;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    List,
    Single,
}

/// Signature of a request: what was asked for, from where, and with which headers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub kind: RequestKind,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// Response memoization shared by every fetch of a `Client`.
///
/// Entries live until `clear` is called. Identical requests issued while one
/// is still in flight wait on that fetch instead of hitting the API again.
/// Failed fetches leave no entry behind, so the next caller retries.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<RequestKey, Arc<OnceCell<Value>>>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_fetch<F, Fut>(&self, key: RequestKey, fetch: F) -> Result<Value, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, ClientError>>,
    {
        let cell = {
            let mut entries = self.entries.lock().await;
            Arc::clone(entries.entry(key.clone()).or_default())
        };

        if cell.initialized() {
            debug!("Cache hit for {}", key.url);
        }

        let value = cell.get_or_try_init(fetch).await?;
        Ok(value.clone())
    }

    /// Drop every memoized response, forcing the next fetches to hit the API.
    pub async fn clear(&self) {
        let mut entries = self.entries.lock().await;
        let dropped = entries.len();
        entries.clear();
        debug!("Cleared {} cached responses", dropped);
    }

    /// Number of completed responses currently memoized.
    pub async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|cell| cell.initialized()).count()
    }
}
