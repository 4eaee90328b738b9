//! In-process cache of decoded directory listings.
//!
//! Listings are keyed by the URL they were fetched from and live as long as the
//! process. The map is a [`DashMap`]: lookups take a shard read lock, inserts a
//! shard write lock, and no guard is ever held across an `.await`.
//!
//! # Concurrent misses
//!
//! Two tasks that miss on the same URL at the same time will both run their
//! fetcher. Only the first value to be inserted is kept, and both callers get
//! that value back, so a URL never maps to two different trees. Collapsing the
//! duplicate fetches into one (single-flight per key) would save a request but
//! is not needed for correctness.
//!
//! # Examples
//!
//! ```rust,no_run
//! use jnu_exam::cache::DirectoryCache;
//! use jnu_exam::listing::Node;
//!
//! # async fn example(client: reqwest::Client) -> jnu_exam::core::Result<()> {
//! let cache: DirectoryCache = DirectoryCache::new();
//! let url = "https://jnuexam.xyz/directory_structure.json";
//! let tree = cache
//!     .fetch_or_load(url, || async move {
//!         let timeout = std::time::Duration::from_secs(15);
//!         jnu_exam::http::get_json::<Node>(&client, url, timeout, "directory listing").await
//!     })
//!     .await?;
//! assert!(cache.get(url).is_some());
//! # let _ = tree;
//! # Ok(())
//! # }
//! ```

use crate::core::Result;
use crate::listing::Node;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// URL-keyed cache of decoded trees. Cloning shares the underlying map.
pub struct DirectoryCache<T = Node> {
    entries: Arc<DashMap<String, Arc<T>>>,
}

impl<T> Clone for DirectoryCache<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T> Default for DirectoryCache<T> {
    fn default() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }
}

impl<T> DirectoryCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached tree for `url`. Never fetches.
    pub fn get(&self, url: &str) -> Option<Arc<T>> {
        self.entries.get(url).map(|entry| Arc::clone(entry.value()))
    }

    /// Cached tree for `url`, running `fetcher` on a miss.
    ///
    /// A successful result is stored unless another caller stored one first, in
    /// which case the earlier value is returned instead. Errors from `fetcher`
    /// are returned as-is and leave the cache untouched.
    pub async fn fetch_or_load<F, Fut>(&self, url: &str, fetcher: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(hit) = self.get(url) {
            debug!("Directory cache hit for {}", url);
            return Ok(hit);
        }

        debug!("Directory cache miss for {}", url);
        let fetched = Arc::new(fetcher().await?);

        let stored = self.entries.entry(url.to_string()).or_insert(fetched);
        Ok(Arc::clone(stored.value()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
