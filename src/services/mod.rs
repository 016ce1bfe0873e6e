//! Service layer for the crawler.
//!
//! This module contains the business logic for:
//! - Cache-aware page fetching (`Fetcher`)
//! - Listing page traversal (`ListingCrawler`)
//! - Detail page parsing (`AnnouncementBuilder`)
//! - Date phrase normalization (`DateNormalizer`)
//! - Address resolution (`Geocoder`)

pub mod announcements;
pub mod dates;
pub mod fetcher;
pub mod geocoder;
pub mod listing;
pub mod selectors;

pub use announcements::{AnnouncementBuilder, ListingItem};
pub use dates::DateNormalizer;
pub use fetcher::{Fetcher, HttpSource, PageSource};
pub use geocoder::{FixedGeocoder, Geocoder};
pub use listing::{CrawlSummary, ListingCrawler, Termination};
pub use selectors::Selectors;
