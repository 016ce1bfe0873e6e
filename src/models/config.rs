//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Page cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// CSS selectors for listing and detail pages
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Site locale settings
    #[serde(default)]
    pub locale: LocaleConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        url::Url::parse(&self.crawler.start_url).map_err(|e| {
            AppError::validation(format!(
                "crawler.start_url '{}' is invalid: {e}",
                self.crawler.start_url
            ))
        })?;
        if self.cache.dir.as_os_str().is_empty() {
            return Err(AppError::validation("cache.dir is empty"));
        }
        self.locale.offset()?;
        for (name, selector) in self.selectors.entries() {
            if selector.trim().is_empty() {
                return Err(AppError::validation(format!("selectors.{name} is empty")));
            }
            Selector::parse(selector).map_err(|e| AppError::selector(selector, format!("{e:?}")))?;
        }
        Ok(())
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Deadline for a single HTTP request in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Detail pages fetched in parallel within one listing page
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Read and populate the page cache
    #[serde(default = "defaults::use_cache")]
    pub use_cache: bool,

    /// Maximum number of announcements to accept
    #[serde(default = "defaults::limit")]
    pub limit: usize,

    /// First listing page
    #[serde(default = "defaults::start_url")]
    pub start_url: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
            use_cache: defaults::use_cache(),
            limit: defaults::limit(),
            start_url: defaults::start_url(),
        }
    }
}

/// Page cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding one file per cached URL
    #[serde(default = "defaults::cache_dir")]
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: defaults::cache_dir(),
        }
    }
}

/// CSS selectors describing the site markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Item summary on a listing page
    #[serde(default = "defaults::listing_item")]
    pub listing_item: String,

    /// Title link inside a listing item; also the validity marker
    #[serde(default = "defaults::item_title")]
    pub item_title: String,

    /// Pagination entry for the page being shown
    #[serde(default = "defaults::pagination_active")]
    pub pagination_active: String,

    /// Link inside a pagination entry
    #[serde(default = "defaults::pagination_link")]
    pub pagination_link: String,

    #[serde(default = "defaults::detail_title")]
    pub detail_title: String,

    #[serde(default = "defaults::detail_address")]
    pub detail_address: String,

    #[serde(default = "defaults::detail_date")]
    pub detail_date: String,
}

impl SelectorConfig {
    fn entries(&self) -> [(&'static str, &str); 7] {
        [
            ("listing_item", self.listing_item.as_str()),
            ("item_title", self.item_title.as_str()),
            ("pagination_active", self.pagination_active.as_str()),
            ("pagination_link", self.pagination_link.as_str()),
            ("detail_title", self.detail_title.as_str()),
            ("detail_address", self.detail_address.as_str()),
            ("detail_date", self.detail_date.as_str()),
        ]
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            listing_item: defaults::listing_item(),
            item_title: defaults::item_title(),
            pagination_active: defaults::pagination_active(),
            pagination_link: defaults::pagination_link(),
            detail_title: defaults::detail_title(),
            detail_address: defaults::detail_address(),
            detail_date: defaults::detail_date(),
        }
    }
}

/// Site locale settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleConfig {
    /// Fixed UTC offset the site renders dates in, in seconds east of UTC
    #[serde(default = "defaults::utc_offset_secs")]
    pub utc_offset_secs: i32,
}

impl LocaleConfig {
    /// The site offset as a chrono timezone.
    pub fn offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_secs).ok_or_else(|| {
            AppError::validation(format!(
                "locale.utc_offset_secs {} is out of range",
                self.utc_offset_secs
            ))
        })
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            utc_offset_secs: defaults::utc_offset_secs(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; irr-crawler/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_concurrent() -> usize {
        1
    }
    pub fn use_cache() -> bool {
        true
    }
    pub fn limit() -> usize {
        50
    }
    pub fn start_url() -> String {
        "https://irr.ru/real-estate/rent/".into()
    }

    // Cache defaults
    pub fn cache_dir() -> PathBuf {
        PathBuf::from("cache")
    }

    // Selector defaults
    pub fn listing_item() -> String {
        ".listing .listing__item".into()
    }
    pub fn item_title() -> String {
        ".listing__itemTitle".into()
    }
    pub fn pagination_active() -> String {
        ".pagination .pagination__pagesItem.pagination__pagesItem_active".into()
    }
    pub fn pagination_link() -> String {
        ".pagination__pagesLink".into()
    }
    pub fn detail_title() -> String {
        ".productPage__title".into()
    }
    pub fn detail_address() -> String {
        ".productPage__infoBlock .productPage__infoTextBold".into()
    }
    pub fn detail_date() -> String {
        ".productPage__mainInfo .productPage__createDate".into()
    }

    // Locale defaults
    pub fn utc_offset_secs() -> i32 {
        4 * 3600
    }
}
