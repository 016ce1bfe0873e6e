// src/pipeline/validate.rs

use crate::error::Result;
use crate::models::Config;

/// Validate configuration and report the effective settings.
pub fn run_validate(config: &Config) -> Result<()> {
    log::info!("Validating configuration...");

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    log::info!("Start URL: {}", config.crawler.start_url);
    log::info!("Limit: {}", config.crawler.limit);
    log::info!(
        "Cache: {} ({})",
        if config.crawler.use_cache { "enabled" } else { "disabled" },
        config.cache.dir.display()
    );
    log::info!("Request timeout: {}s", config.crawler.timeout_secs);
    log::info!("Detail concurrency: {}", config.crawler.max_concurrent);
    Ok(())
}
