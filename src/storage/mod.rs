//! Page cache backends.
//!
//! Fetched pages are stored verbatim, one entry per request URL. The cache is
//! unconditional: an entry that exists is returned as-is, with no TTL and no
//! revalidation against the origin. A page that changes upstream after it was
//! cached is never re-fetched unless the cache is disabled or cleared.
//!
//! ## Directory Structure
//!
//! ```text
//! cache/
//! ├── https%3A%2F%2Firr.ru%2Freal-estate%2Frent%2F
//! ├── https%3A%2F%2Firr.ru%2Freal-estate%2Frent%2Fpage2%2F
//! └── https%3A%2F%2Firr.ru%2F...%2Fadvert-7c0e...   # long URLs end in a digest
//! ```

pub mod local;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use local::LocalCache;
pub use memory::MemoryCache;

/// How a fetch may use the page cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Serve any cached entry without freshness checks; populate on miss.
    Unconditional,
    /// Never read or write the cache.
    Disabled,
}

impl CachePolicy {
    pub fn from_flag(use_cache: bool) -> Self {
        if use_cache {
            Self::Unconditional
        } else {
            Self::Disabled
        }
    }
}

/// Trait for page cache backends keyed by request URL.
#[async_trait]
pub trait PageCache: Send + Sync {
    /// Cached content for `url`, or `None` on a miss.
    async fn get(&self, url: &str) -> Result<Option<Vec<u8>>>;

    /// Store `content` for `url`, replacing any previous entry.
    async fn put(&self, url: &str, content: &[u8]) -> Result<()>;
}
