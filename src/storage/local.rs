//! Local filesystem page cache.
//!
//! Each cached URL is a single file under the root directory, named by
//! [`cache_key`]. Files hold the raw response body with no metadata.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use url::form_urlencoded;

use crate::error::{AppError, Result};
use crate::storage::PageCache;

/// Escaped keys longer than this are shortened with a digest.
const MAX_KEY_LEN: usize = 200;

/// Bytes of the escaped key kept in front of the digest.
const DIGEST_PREFIX_LEN: usize = 120;

/// Suffix for in-progress writes. `%` is always followed by two hex digits in
/// an escaped key, so no key can end this way.
const TMP_SUFFIX: &str = "%tmp";

/// Derive a file name from a request URL.
///
/// Every byte outside `[A-Za-z0-9*-._]` is percent-escaped, so distinct URLs
/// give distinct names and no name contains a path separator.
pub fn cache_key(url: &str) -> String {
    let escaped: String = form_urlencoded::byte_serialize(url.as_bytes()).collect();
    if escaped.len() <= MAX_KEY_LEN {
        return escaped;
    }

    let digest = Sha256::digest(url.as_bytes());
    format!("{}-{}", &escaped[..DIGEST_PREFIX_LEN], hex::encode(digest))
}

/// Local filesystem cache backend.
#[derive(Debug, Clone)]
pub struct LocalCache {
    root_dir: PathBuf,
}

impl LocalCache {
    /// Create a LocalCache rooted at the given directory.
    ///
    /// The directory is created on first write.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a URL.
    fn path(&self, url: &str) -> PathBuf {
        self.root_dir.join(cache_key(url))
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.root_dir).await?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(TMP_SUFFIX);
        let tmp = PathBuf::from(tmp);

        let written = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.flush().await?;
            drop(file);
            tokio::fs::rename(&tmp, path).await
        }
        .await;

        if let Err(e) = written {
            match tokio::fs::remove_file(&tmp).await {
                Err(cleanup) if cleanup.kind() != std::io::ErrorKind::NotFound => {
                    log::warn!("Cannot remove {}: {}", tmp.display(), cleanup);
                }
                _ => {}
            }
            return Err(AppError::Io(e));
        }
        Ok(())
    }
}

#[async_trait]
impl PageCache for LocalCache {
    async fn get(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(url);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn put(&self, url: &str, content: &[u8]) -> Result<()> {
        let path = self.path(url);
        self.write_bytes(&path, content).await?;
        log::debug!("Cached {} as {}", url, path.display());
        Ok(())
    }
}
