//! Pipeline entry points for crawler operations.
//!
//! - `run_crawler`: Crawl listing pages into announcements
//! - `run_validate`: Check configuration before a crawl

pub mod crawl;
pub mod validate;

pub use crawl::{CrawlOutcome, build_crawler, run_crawler};
pub use validate::run_validate;
