// src/services/announcements.rs

//! Announcement building from detail pages.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use scraper::Selector;

use crate::error::{AppError, Result};
use crate::models::Announcement;
use crate::services::dates::DateNormalizer;
use crate::services::fetcher::Fetcher;
use crate::services::geocoder::Geocoder;
use crate::services::selectors::{Selectors, parse_document, select_text};

/// A valid item found on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingItem {
    /// Absolute detail page URL, if the title link had one
    pub link: Option<String>,

    /// Title text shown on the listing page
    pub title: String,
}

/// Raw fields read from a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DetailFields {
    title: String,
    address: String,
    date: String,
}

/// Builds announcements from listing items.
pub struct AnnouncementBuilder {
    fetcher: Arc<Fetcher>,
    geocoder: Arc<dyn Geocoder>,
    normalizer: DateNormalizer,
    selectors: Arc<Selectors>,
}

impl AnnouncementBuilder {
    pub fn new(
        fetcher: Arc<Fetcher>,
        geocoder: Arc<dyn Geocoder>,
        normalizer: DateNormalizer,
        selectors: Arc<Selectors>,
    ) -> Self {
        Self {
            fetcher,
            geocoder,
            normalizer,
            selectors,
        }
    }

    /// Fetch the item's detail page and build an announcement from it.
    ///
    /// Any error here concerns this item only; callers log it and move on.
    pub async fn build(&self, item: &ListingItem, now: DateTime<Utc>) -> Result<Announcement> {
        let link = item
            .link
            .as_deref()
            .ok_or_else(|| AppError::markup(&item.title, "cannot find announcement url"))?;

        let content = self.fetcher.fetch(link).await?;
        let fields = self.read_detail(&content, link)?;

        let location = self.geocoder.resolve(&fields.address).await?;
        let date = self.normalizer.normalize(&fields.date, now)?;

        Ok(Announcement {
            date,
            title: fields.title,
            content: None,
            location,
            link: link.to_string(),
        })
    }

    fn read_detail(&self, content: &[u8], link: &str) -> Result<DetailFields> {
        let document = parse_document(content);
        let field = |selector: &Selector, name: &str| {
            select_text(&document, selector)
                .filter(|text| !text.is_empty())
                .ok_or_else(|| AppError::markup(link, format!("no {name} found")))
        };

        Ok(DetailFields {
            title: field(&self.selectors.detail_title, "title")?,
            address: field(&self.selectors.detail_address, "address")?,
            date: field(&self.selectors.detail_date, "publication date")?,
        })
    }
}
