// src/models/mod.rs

//! Domain models for the crawler.

mod announcement;
mod config;

// Re-export all public types
pub use announcement::{Announcement, Location};
pub use config::{CacheConfig, Config, CrawlerConfig, LocaleConfig, SelectorConfig};
