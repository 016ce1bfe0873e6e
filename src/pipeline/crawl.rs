// src/pipeline/crawl.rs

//! Announcement crawling pipeline.

use std::sync::Arc;

use chrono::Utc;

use crate::error::Result;
use crate::models::{Announcement, Config};
use crate::services::{
    AnnouncementBuilder, CrawlSummary, DateNormalizer, Fetcher, FixedGeocoder, Geocoder,
    HttpSource, ListingCrawler, PageSource, Selectors,
};
use crate::storage::{CachePolicy, LocalCache, PageCache};
use crate::utils::http;

/// Announcements from one crawl, in the order they were accepted.
#[derive(Debug)]
pub struct CrawlOutcome {
    pub announcements: Vec<Announcement>,
    pub summary: CrawlSummary,
}

/// Wire a crawler from configuration and explicit collaborators.
pub fn build_crawler(
    config: &Config,
    source: Arc<dyn PageSource>,
    cache: Arc<dyn PageCache>,
    geocoder: Arc<dyn Geocoder>,
) -> Result<ListingCrawler> {
    config.validate()?;

    let selectors = Arc::new(Selectors::compile(&config.selectors)?);
    let policy = CachePolicy::from_flag(config.crawler.use_cache);
    let fetcher = Arc::new(Fetcher::new(source, cache, policy));
    let builder = AnnouncementBuilder::new(
        Arc::clone(&fetcher),
        geocoder,
        DateNormalizer::new(config.locale.offset()?),
        Arc::clone(&selectors),
    );

    Ok(ListingCrawler::new(&config.crawler, fetcher, builder, selectors))
}

/// Run the crawler against the live site with the filesystem cache.
///
/// Each announcement is handed to `on_announcement` as soon as it is
/// accepted, and also collected into the returned outcome.
pub async fn run_crawler<F>(config: &Config, mut on_announcement: F) -> Result<CrawlOutcome>
where
    F: FnMut(&Announcement),
{
    let start_time = Utc::now();
    log::info!(
        "Crawling {} (limit {}, cache {})",
        config.crawler.start_url,
        config.crawler.limit,
        if config.crawler.use_cache {
            config.cache.dir.display().to_string()
        } else {
            "disabled".to_string()
        }
    );

    let client = http::create_async_client(&config.crawler)?;
    let crawler = build_crawler(
        config,
        Arc::new(HttpSource::new(client)),
        Arc::new(LocalCache::new(&config.cache.dir)),
        Arc::new(FixedGeocoder::default()),
    )?;

    let mut announcements = Vec::new();
    let summary = crawler
        .crawl_at(start_time, |announcement| {
            on_announcement(&announcement);
            announcements.push(announcement);
        })
        .await?;

    log::info!(
        "Crawl took {}s",
        (Utc::now() - start_time).num_seconds()
    );

    Ok(CrawlOutcome {
        announcements,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::Termination;
    use crate::services::announcements::tests::detail_page;
    use crate::services::fetcher::tests::FakeSource;
    use crate::storage::MemoryCache;

    const START: &str = "https://irr.ru/real-estate/rent/";
    const DETAIL: &str = "https://irr.ru/real-estate/rent/advert1.html";

    fn single_page_site() -> FakeSource {
        let listing = r#"
            <div class="listing">
              <div class="listing__item"><a class="listing__itemTitle" href="advert1.html">Квартира</a></div>
            </div>
            <ul class="pagination">
              <li class="pagination__pagesItem pagination__pagesItem_active"><a class="pagination__pagesLink" href="/real-estate/rent/">1</a></li>
            </ul>"#;
        FakeSource::new()
            .with_page(START, listing)
            .with_page(DETAIL, detail_page("Квартира у парка", "Москва", "12 мая 2023"))
    }

    #[tokio::test]
    async fn test_build_crawler_honors_cache_flag() {
        let mut config = Config::default();
        config.crawler.use_cache = false;
        let cache = Arc::new(MemoryCache::new());

        let crawler = build_crawler(
            &config,
            Arc::new(single_page_site()),
            cache.clone(),
            Arc::new(FixedGeocoder::default()),
        )
        .unwrap();
        let mut titles = Vec::new();
        let summary = crawler.crawl(|a| titles.push(a.title)).await.unwrap();

        assert_eq!(summary.termination, Termination::Exhausted);
        assert_eq!(titles, vec!["Квартира у парка".to_string()]);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_build_crawler_populates_cache() {
        let cache = Arc::new(MemoryCache::new());
        let crawler = build_crawler(
            &Config::default(),
            Arc::new(single_page_site()),
            cache.clone(),
            Arc::new(FixedGeocoder::default()),
        )
        .unwrap();
        crawler.crawl(|_| {}).await.unwrap();

        assert!(cache.contains(START));
        assert!(cache.contains(DETAIL));
    }

    #[test]
    fn test_build_crawler_rejects_invalid_config() {
        let mut config = Config::default();
        config.crawler.start_url = "not a url".to_string();
        let result = build_crawler(
            &config,
            Arc::new(FakeSource::new()),
            Arc::new(MemoryCache::new()),
            Arc::new(FixedGeocoder::default()),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_zero_limit_fetches_nothing() {
        let mut config = Config::default();
        config.crawler.limit = 0;
        let source = Arc::new(single_page_site());
        let crawler = build_crawler(
            &config,
            source.clone(),
            Arc::new(MemoryCache::new()),
            Arc::new(FixedGeocoder::default()),
        )
        .unwrap();

        let mut emitted = 0;
        let summary = crawler.crawl(|_| emitted += 1).await.unwrap();

        assert_eq!(summary.termination, Termination::LimitReached);
        assert_eq!(summary.pages, 0);
        assert_eq!(emitted, 0);
        assert!(source.calls().is_empty());
    }
}
