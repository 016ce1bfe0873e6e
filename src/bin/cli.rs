//! irr-crawler CLI
//!
//! Crawls rental listings and prints each accepted announcement.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use irr_crawler::{error::Result, models::Config, pipeline};

/// irr-crawler - Rental Listing Crawler
#[derive(Parser, Debug)]
#[command(name = "irr-crawler", version, about = "Crawl irr.ru rental announcements")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    crawl: CrawlArgs,
}

#[derive(clap::Args, Debug)]
struct CrawlArgs {
    /// Read and write the page cache (cached pages are never revalidated)
    #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
    use_cache: Option<bool>,

    /// Shorthand for --use-cache false
    #[arg(long, conflicts_with = "use_cache")]
    no_cache: bool,

    /// Maximum number of announcements to accept
    #[arg(short, long)]
    limit: Option<usize>,

    /// Directory for cached pages
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Write accepted announcements to this file as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl CrawlArgs {
    /// Apply command-line overrides on top of the loaded configuration.
    fn apply(&self, mut config: Config) -> Config {
        if let Some(use_cache) = self.use_cache {
            config.crawler.use_cache = use_cache;
        }
        if self.no_cache {
            config.crawler.use_cache = false;
        }
        if let Some(limit) = self.limit {
            config.crawler.limit = limit;
        }
        if let Some(dir) = &self.cache_dir {
            config.cache.dir = dir.clone();
        }
        config
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl listing pages (default)
    Crawl,

    /// Validate configuration and print effective settings
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.crawl.apply(Config::load_or_default(&cli.config));

    match cli.command.unwrap_or(Command::Crawl) {
        Command::Crawl => {
            let outcome = pipeline::run_crawler(&config, |announcement| {
                println!("{announcement}\n");
            })
            .await?;

            if let Some(path) = &cli.crawl.output {
                let json = serde_json::to_string_pretty(&outcome.announcements)?;
                tokio::fs::write(path, json).await?;
                log::info!(
                    "Saved {} announcements to {}",
                    outcome.announcements.len(),
                    path.display()
                );
            }
        }

        Command::Validate => pipeline::run_validate(&config)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from(["irr-crawler", "--use-cache", "false", "--limit", "3"]);
        let config = cli.crawl.apply(Config::default());
        assert!(!config.crawler.use_cache);
        assert_eq!(config.crawler.limit, 3);
    }

    #[test]
    fn test_no_cache_flag() {
        let cli = Cli::parse_from(["irr-crawler", "--no-cache", "validate"]);
        assert!(matches!(cli.command, Some(Command::Validate)));
        assert!(!cli.crawl.apply(Config::default()).crawler.use_cache);
    }

    #[test]
    fn test_defaults_untouched() {
        let cli = Cli::parse_from(["irr-crawler"]);
        let config = cli.crawl.apply(Config::default());
        assert!(config.crawler.use_cache);
        assert_eq!(config.crawler.limit, 50);
    }

    #[test]
    fn test_overrides_apply_over_missing_config() {
        let cli = Cli::parse_from(["irr-crawler", "--config", "/nonexistent/irr.toml", "-l", "2"]);
        let config = cli.crawl.apply(Config::load_or_default(&cli.config));
        assert_eq!(config.crawler.limit, 2);
        assert!(config.crawler.use_cache);
    }
}
