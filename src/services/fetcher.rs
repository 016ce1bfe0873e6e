// src/services/fetcher.rs

//! Cache-aware page fetching.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;
use crate::storage::{CachePolicy, PageCache};

/// Where page bodies come from when the cache cannot answer.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the raw body of `url`.
    async fn get(&self, url: &str) -> Result<Vec<u8>>;
}

/// Plain HTTP GET through reqwest. Non-2xx responses are errors.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Resolves URLs to page content, consulting the cache before the network.
pub struct Fetcher {
    source: Arc<dyn PageSource>,
    cache: Arc<dyn PageCache>,
    policy: CachePolicy,
    in_flight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl Fetcher {
    pub fn new(source: Arc<dyn PageSource>, cache: Arc<dyn PageCache>, policy: CachePolicy) -> Self {
        Self {
            source,
            cache,
            policy,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch `url`.
    ///
    /// With [`CachePolicy::Unconditional`] a cached entry is returned without
    /// touching the network; on a miss the page is downloaded once and written
    /// back best-effort. Concurrent fetches of the same URL wait for the first
    /// one instead of issuing a second request.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if self.policy == CachePolicy::Disabled {
            log::debug!("Fetching {} (cache disabled)", url);
            return self.source.get(url).await;
        }

        let slot = self.slot(url);
        let guard = slot.lock().await;
        let result = self.fetch_cached(url).await;
        drop(guard);
        self.release(url, &slot);
        result
    }

    async fn fetch_cached(&self, url: &str) -> Result<Vec<u8>> {
        match self.cache.get(url).await {
            Ok(Some(content)) => {
                log::debug!("Cache hit for {}", url);
                return Ok(content);
            }
            Ok(None) => log::debug!("Cache miss for {}", url),
            Err(e) => log::warn!("Cache read failed for {}: {}. Fetching live.", url, e),
        }

        let content = self.source.get(url).await?;
        if let Err(e) = self.cache.put(url, &content).await {
            log::warn!("Cannot cache {}: {}", url, e);
        }
        Ok(content)
    }

    fn slot(&self, url: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(in_flight.entry(url.to_string()).or_default())
    }

    /// Drop the lock entry once no other fetch is waiting on it.
    fn release(&self, url: &str, slot: &Arc<tokio::sync::Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one held by the caller.
        if Arc::strong_count(slot) <= 2 {
            in_flight.remove(url);
        }
    }
}
