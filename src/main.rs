use std::time::Duration;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::Parser;
use esa_yearly::{config::DEFAULT_BASE_URL, Client, Config, DateRange, Posts};
use log::LevelFilter;
use simple_logger::SimpleLogger;

/// Lists the esa.io posts a member created in a date range, newest first.
#[derive(Debug, clap::Parser)]
#[command(author, version, about)]
struct App {
    /// esa api key
    #[arg(long, env = "ESA_API_KEY", hide_env_values = true)]
    apikey: String,

    /// esa username
    #[arg(long, env = "ESA_USER")]
    user: String,

    /// esa team
    #[arg(long, env = "ESA_TEAM")]
    team: String,

    /// from (format: 2020-01-01) (default: 1/1 of this year)
    #[arg(long, value_parser = parse_date)]
    from: Option<NaiveDate>,

    /// to (format: 2020-12-31) (default: 12/31 of this year)
    #[arg(long, value_parser = parse_date)]
    to: Option<NaiveDate>,

    /// API root
    #[arg(long, env = "ESA_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "20")]
    timeout: u64,

    /// Seconds between two requests
    #[arg(long, default_value = "2")]
    interval: u64,

    /// Give up instead of fetching more than this many pages
    #[arg(long)]
    max_pages: Option<u32>,

    /// Give up instead of waiting longer than this many seconds on a rate limit
    #[arg(long)]
    max_retry_wait: Option<u64>,

    /// Log every request and response status
    #[arg(long, short)]
    verbose: bool,
}

fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
}

impl App {
    fn config(&self) -> anyhow::Result<Config> {
        let year = DateRange::current_year();
        let range = DateRange::new(
            self.from.unwrap_or_else(|| year.from()),
            self.to.unwrap_or_else(|| year.to()),
        )?;

        let mut config = Config::new(&self.team, &self.apikey, &self.user, range)
            .base_url(&self.base_url)
            .timeout(Duration::from_secs(self.timeout))
            .request_interval(Duration::from_secs(self.interval));
        if let Some(max_pages) = self.max_pages {
            config = config.max_pages(max_pages);
        }
        if let Some(wait) = self.max_retry_wait {
            config = config.max_retry_wait(Duration::from_secs(wait));
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app = App::parse();

    let level = if app.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new()
        .with_level(LevelFilter::Warn)
        .with_module_level("esa_yearly", level)
        .init()?;

    let config = app.config()?;
    let client = Client::new(&config)?;

    let posts = tokio::select! {
        posts = Posts::new(&client, &config) => posts.context("failed to collect posts")?,
        _ = tokio::signal::ctrl_c() => bail!("interrupted"),
    };

    for post in posts.iter() {
        println!("{}", post.to_markdown());
    }
    Ok(())
}
