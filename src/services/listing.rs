// src/services/listing.rs

//! Listing page crawler.
//!
//! Walks listing pages from the start URL, following the link after the
//! active pagination entry, and builds an announcement for every valid item
//! until the limit is reached or the pages run out.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use scraper::Html;

use crate::error::{AppError, Result};
use crate::models::{Announcement, CrawlerConfig};
use crate::services::announcements::{AnnouncementBuilder, ListingItem};
use crate::services::fetcher::Fetcher;
use crate::services::selectors::{Selectors, next_element_sibling, parse_document};
use crate::utils::resolve_url;

/// Why a crawl stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The configured number of announcements was accepted.
    LimitReached,
    /// The last listing page had no next page.
    Exhausted,
}

/// Summary of a crawl run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    pub accepted: usize,
    pub skipped: usize,
    pub pages: usize,
    pub termination: Termination,
}

/// Items and pagination read from one listing page.
#[derive(Debug)]
struct ListingPage {
    items: Vec<ListingItem>,
    /// Only consulted when the limit was not reached on this page.
    next: Result<Option<String>>,
}

/// Crawl state.
enum State {
    FetchingListing(String),
    Done(Termination),
}

/// Service for crawling announcements from listing pages.
pub struct ListingCrawler {
    fetcher: Arc<Fetcher>,
    builder: AnnouncementBuilder,
    selectors: Arc<Selectors>,
    start_url: String,
    limit: usize,
    concurrency: usize,
}

impl ListingCrawler {
    pub fn new(
        config: &CrawlerConfig,
        fetcher: Arc<Fetcher>,
        builder: AnnouncementBuilder,
        selectors: Arc<Selectors>,
    ) -> Self {
        Self {
            fetcher,
            builder,
            selectors,
            start_url: config.start_url.clone(),
            limit: config.limit,
            concurrency: config.max_concurrent.max(1),
        }
    }

    /// Crawl using the current time for date normalization.
    pub async fn crawl<F>(&self, emit: F) -> Result<CrawlSummary>
    where
        F: FnMut(Announcement),
    {
        self.crawl_at(Utc::now(), emit).await
    }

    /// Crawl, passing every accepted announcement to `emit` in page order.
    ///
    /// A listing page that cannot be fetched or has unexpected pagination
    /// markup aborts the crawl; problems with a single item only skip it.
    pub async fn crawl_at<F>(&self, now: DateTime<Utc>, mut emit: F) -> Result<CrawlSummary>
    where
        F: FnMut(Announcement),
    {
        let mut accepted = 0;
        let mut skipped = 0;
        let mut pages = 0;
        let mut state = if self.limit == 0 {
            State::Done(Termination::LimitReached)
        } else {
            State::FetchingListing(self.start_url.clone())
        };

        let termination = loop {
            let url = match state {
                State::FetchingListing(url) => url,
                State::Done(termination) => break termination,
            };

            log::info!("Fetching listing page {}", url);
            let content = self.fetcher.fetch(&url).await?;
            let page = self.read_listing(&content, &url);
            pages += 1;

            let mut remaining = page.items.iter();
            while accepted < self.limit {
                // Never start more builds than announcements still wanted.
                let batch: Vec<_> = remaining
                    .by_ref()
                    .take(self.concurrency.min(self.limit - accepted))
                    .collect();
                if batch.is_empty() {
                    break;
                }

                let mut results = stream::iter(batch)
                    .map(|item| async move { (item, self.builder.build(item, now).await) })
                    .buffered(self.concurrency);
                while let Some((item, result)) = results.next().await {
                    match result {
                        Ok(announcement) if accepted < self.limit => {
                            accepted += 1;
                            emit(announcement);
                        }
                        Ok(_) => {}
                        Err(e) => {
                            skipped += 1;
                            log::warn!("Skipping '{}': {}", item.title, e);
                        }
                    }
                }
            }

            state = if accepted >= self.limit {
                State::Done(Termination::LimitReached)
            } else {
                match page.next? {
                    Some(next) => State::FetchingListing(next),
                    None => State::Done(Termination::Exhausted),
                }
            };
        };

        log::info!(
            "Crawl finished ({:?}): {} accepted, {} skipped, {} listing page(s)",
            termination,
            accepted,
            skipped,
            pages
        );

        Ok(CrawlSummary {
            accepted,
            skipped,
            pages,
            termination,
        })
    }

    /// Collect valid items and the next page URL from a listing page.
    fn read_listing(&self, content: &[u8], url: &str) -> ListingPage {
        let document = parse_document(content);

        let mut items = Vec::new();
        for element in document.select(&self.selectors.listing_item) {
            // Items without a title element are ads or placeholders.
            let Some(title) = element.select(&self.selectors.item_title).next() else {
                continue;
            };
            let link = title.value().attr("href").and_then(|href| {
                resolve_url(url, href)
                    .inspect_err(|e| log::debug!("Bad item link '{}' on {}: {}", href, url, e))
                    .ok()
            });
            items.push(ListingItem {
                link,
                title: title.text().collect::<String>().trim().to_string(),
            });
        }

        let next = self.next_page(&document, url);
        ListingPage { items, next }
    }

    /// URL of the page after the active pagination entry.
    ///
    /// The active entry being last is the only end-of-results signal the
    /// markup gives, so a page without pagination is an error rather than
    /// the end of the crawl.
    fn next_page(&self, document: &Html, url: &str) -> Result<Option<String>> {
        let active = document
            .select(&self.selectors.pagination_active)
            .next()
            .ok_or_else(|| AppError::markup(url, "cannot find active pagination item"))?;

        let Some(wrapper) = next_element_sibling(&active) else {
            return Ok(None);
        };
        let href = wrapper
            .select(&self.selectors.pagination_link)
            .next()
            .and_then(|link| link.value().attr("href"))
            .ok_or_else(|| AppError::markup(url, "cannot find next page url"))?;
        Ok(Some(resolve_url(url, href)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Config;
    use crate::services::announcements::tests::detail_page;
    use crate::services::dates::DateNormalizer;
    use crate::services::fetcher::tests::FakeSource;
    use crate::services::geocoder::FixedGeocoder;
    use crate::storage::{CachePolicy, MemoryCache};
    use chrono::TimeZone;

    const BASE: &str = "https://irr.ru/real-estate/rent/";

    fn page_url(n: usize) -> String {
        if n == 1 {
            BASE.to_string()
        } else {
            format!("{BASE}page{n}/")
        }
    }

    fn detail_url(page: usize, item: usize) -> String {
        format!("https://irr.ru/real-estate/rent/advert-{page}-{item}.html")
    }

    /// Listing page `n` of `total` with `items` valid items and one item
    /// without a title.
    fn listing_page(n: usize, total: usize, items: usize) -> String {
        let mut html = String::from(r#"<html><body><div class="listing">"#);
        for i in 1..=items {
            html.push_str(&format!(
                r#"<div class="listing__item">
                     <a class="listing__itemTitle" href="/real-estate/rent/advert-{n}-{i}.html">Квартира {n}-{i}</a>
                   </div>"#
            ));
        }
        html.push_str(r#"<div class="listing__item"><span>Реклама</span></div></div>"#);

        html.push_str(r#"<ul class="pagination">"#);
        for p in 1..=total {
            let active = if p == n { " pagination__pagesItem_active" } else { "" };
            let href = if p == 1 {
                "/real-estate/rent/".to_string()
            } else {
                format!("/real-estate/rent/page{p}/")
            };
            html.push_str(&format!(
                r#"<li class="pagination__pagesItem{active}"><a class="pagination__pagesLink" href="{href}">{p}</a></li>"#
            ));
        }
        html.push_str("</ul></body></html>");
        html
    }

    fn site(pages: usize, items: usize) -> FakeSource {
        let mut source = FakeSource::new();
        for n in 1..=pages {
            source = source.with_page(&page_url(n), listing_page(n, pages, items));
            for i in 1..=items {
                source = source.with_page(
                    &detail_url(n, i),
                    detail_page(&format!("Квартира {n}-{i}"), "Москва", "сегодня, 10:00"),
                );
            }
        }
        source
    }

    fn crawler(source: Arc<FakeSource>, limit: usize, max_concurrent: usize) -> ListingCrawler {
        let mut config = Config::default();
        config.crawler.limit = limit;
        config.crawler.max_concurrent = max_concurrent;

        let selectors = Arc::new(Selectors::compile(&config.selectors).unwrap());
        let fetcher = Arc::new(Fetcher::new(
            source,
            Arc::new(MemoryCache::new()),
            CachePolicy::Unconditional,
        ));
        let builder = AnnouncementBuilder::new(
            Arc::clone(&fetcher),
            Arc::new(FixedGeocoder::default()),
            DateNormalizer::new(config.locale.offset().unwrap()),
            Arc::clone(&selectors),
        );
        ListingCrawler::new(&config.crawler, fetcher, builder, selectors)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    async fn run(crawler: &ListingCrawler) -> Result<(CrawlSummary, Vec<Announcement>)> {
        let mut out = Vec::new();
        let summary = crawler.crawl_at(now(), |a| out.push(a)).await?;
        Ok((summary, out))
    }

    fn listing_fetches(source: &FakeSource) -> Vec<String> {
        source
            .calls()
            .into_iter()
            .filter(|u| !u.contains("advert"))
            .collect()
    }

    #[tokio::test]
    async fn test_stops_mid_page_at_limit() {
        let source = Arc::new(site(3, 4));
        let (summary, out) = run(&crawler(source.clone(), 6, 1)).await.unwrap();

        assert_eq!(summary.accepted, 6);
        assert_eq!(summary.termination, Termination::LimitReached);
        assert_eq!(out.len(), 6);
        assert_eq!(out[5].title, "Квартира 2-2");
        assert_eq!(listing_fetches(&source), vec![page_url(1), page_url(2)]);
        assert_eq!(source.calls_to(&detail_url(2, 3)), 0);
    }

    #[tokio::test]
    async fn test_limit_on_page_boundary_fetches_no_further_page() {
        let source = Arc::new(site(3, 4));
        let (summary, out) = run(&crawler(source.clone(), 4, 1)).await.unwrap();

        assert_eq!(summary.pages, 1);
        assert_eq!(out.len(), 4);
        assert_eq!(listing_fetches(&source), vec![page_url(1)]);
    }

    #[tokio::test]
    async fn test_exhaustion_without_error() {
        let source = Arc::new(site(2, 3));
        let (summary, out) = run(&crawler(source.clone(), 50, 1)).await.unwrap();

        assert_eq!(summary.termination, Termination::Exhausted);
        assert_eq!(summary.accepted, 6);
        assert_eq!(summary.pages, 2);
        assert_eq!(out.len(), 6);
        assert_eq!(out[0].date.to_rfc3339(), "2024-06-01T10:00:00+04:00");
    }

    #[tokio::test]
    async fn test_parallel_builds_respect_limit_and_order() {
        let source = Arc::new(site(3, 4));
        let (summary, out) = run(&crawler(source.clone(), 7, 3)).await.unwrap();

        assert_eq!(summary.accepted, 7);
        let titles: Vec<_> = out.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Квартира 1-1",
                "Квартира 1-2",
                "Квартира 1-3",
                "Квартира 1-4",
                "Квартира 2-1",
                "Квартира 2-2",
                "Квартира 2-3",
            ]
        );
        assert_eq!(source.calls_to(&detail_url(2, 4)), 0);
        assert_eq!(listing_fetches(&source).len(), 2);
    }

    #[tokio::test]
    async fn test_failed_items_are_skipped() {
        // Page 1 lists four items but only two detail pages exist.
        let source = FakeSource::new()
            .with_page(&page_url(1), listing_page(1, 1, 4))
            .with_page(&detail_url(1, 1), detail_page("A", "Москва", "5 марта"))
            .with_page(&detail_url(1, 3), detail_page("C", "Москва", "5 невалид"))
            .with_page(&detail_url(1, 4), detail_page("D", "Москва", "1 мая 2023"));
        let (summary, out) = run(&crawler(Arc::new(source), 10, 1)).await.unwrap();

        assert_eq!(summary.accepted, 2);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.termination, Termination::Exhausted);
        assert_eq!(out[0].title, "A");
        assert_eq!(out[1].title, "D");
    }

    #[tokio::test]
    async fn test_missing_active_pagination_is_an_error() {
        let html = listing_page(1, 2, 1).replace(" pagination__pagesItem_active", "");
        let source = Arc::new(
            FakeSource::new()
                .with_page(&page_url(1), html)
                .with_page(&detail_url(1, 1), detail_page("A", "Москва", "5 марта")),
        );
        let err = run(&crawler(source, 10, 1)).await.unwrap_err();
        assert!(err.to_string().contains("active pagination"), "{err}");
    }

    #[tokio::test]
    async fn test_missing_pagination_ignored_once_limit_reached() {
        let html = listing_page(1, 2, 2).replace(" pagination__pagesItem_active", "");
        let source = Arc::new(
            FakeSource::new()
                .with_page(&page_url(1), html)
                .with_page(&detail_url(1, 1), detail_page("A", "Москва", "5 марта"))
                .with_page(&detail_url(1, 2), detail_page("B", "Москва", "6 марта")),
        );
        let (summary, out) = run(&crawler(source, 2, 1)).await.unwrap();
        assert_eq!(summary.termination, Termination::LimitReached);
        assert_eq!(out.len(), 2);
    }

    #[tokio::test]
    async fn test_next_entry_without_href_is_an_error() {
        let html = listing_page(1, 2, 0).replace(r#" href="/real-estate/rent/page2/""#, "");
        let source = Arc::new(FakeSource::new().with_page(&page_url(1), html));
        let err = run(&crawler(source, 10, 1)).await.unwrap_err();
        assert!(err.to_string().contains("next page url"), "{err}");
    }

    #[tokio::test]
    async fn test_listing_fetch_error_halts() {
        let source = Arc::new(FakeSource::new().with_page(&page_url(1), listing_page(1, 2, 0)));
        let err = run(&crawler(source.clone(), 10, 1)).await.unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
        assert_eq!(listing_fetches(&source), vec![page_url(1), page_url(2)]);
    }

    #[test]
    fn test_read_listing_skips_items_without_title() {
        let crawler = crawler(Arc::new(FakeSource::new()), 10, 1);
        let page = crawler
            .read_listing(listing_page(2, 3, 2).as_bytes(), &page_url(2));

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].title, "Квартира 2-1");
        assert_eq!(page.items[0].link.as_deref(), Some(detail_url(2, 1).as_str()));
        assert_eq!(page.next.unwrap(), Some(page_url(3)));
    }

    #[test]
    fn test_read_listing_trims_title_ends_only() {
        let crawler = crawler(Arc::new(FakeSource::new()), 10, 1);
        let html = r#"<div class="listing"><div class="listing__item">
              <a class="listing__itemTitle" href="advert.html">
                Сдается  квартира,
                у метро
              </a>
            </div></div>
            <ul class="pagination"><li class="pagination__pagesItem pagination__pagesItem_active">1</li></ul>"#;
        let page = crawler.read_listing(html.as_bytes(), BASE);

        assert_eq!(
            page.items[0].title,
            "Сдается  квартира,\n                у метро"
        );
        assert_eq!(page.next.unwrap(), None);
    }
}
