use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate};

use crate::{error::Error, result::Result};

/// Default API root of the hosted service.
pub const DEFAULT_BASE_URL: &str = "https://api.esa.io/";

/// Calendar dates bounding a search, without a time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    /// Constructs a range from two dates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `from` comes after `to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(Error::Config(format!("from date {from} is after to date {to}")));
        }
        Ok(Self { from, to })
    }

    /// January 1st through December 31st of `year`.
    ///
    /// Falls back to the whole representable range only for years chrono
    /// cannot express, which never happens for real calendar years.
    pub fn year(year: i32) -> Self {
        let from = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN);
        let to = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MAX);
        Self { from, to }
    }

    /// The calendar year of the local clock.
    pub fn current_year() -> Self {
        Self::year(Local::now().year())
    }

    /// First day of the range.
    pub fn from(&self) -> NaiveDate {
        self.from
    }

    /// Last day of the range.
    pub fn to(&self) -> NaiveDate {
        self.to
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::current_year()
    }
}

/// Bounds on a single walk. Both are off unless set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    /// Highest page number the walk may fetch.
    pub max_pages: Option<u32>,
    /// Longest `Retry-After` the client agrees to sleep through.
    pub max_retry_wait: Option<Duration>,
}

/// Everything one run needs: where to connect, as whom, and what to search.
#[derive(Debug, Clone)]
pub struct Config {
    team: String,
    token: String,
    base_url: String,
    timeout: Duration,
    request_interval: Duration,
    username: String,
    range: DateRange,
    limits: Limits,
}

impl Config {
    /// Constructs a `Config` with default connection settings.
    ///
    /// Defaults: base URL [`DEFAULT_BASE_URL`], 20 second request timeout,
    /// 2 seconds between requests and no walk limits.
    pub fn new(
        team: impl Into<String>,
        token: impl Into<String>,
        username: impl Into<String>,
        range: DateRange,
    ) -> Self {
        Self {
            team: team.into(),
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(20),
            request_interval: Duration::from_secs(2),
            username: username.into(),
            range,
            limits: Limits::default(),
        }
    }

    /// Overrides the API root, e.g. to point at a test double.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Minimum spacing between two requests. Zero disables pacing.
    #[must_use]
    pub fn request_interval(mut self, interval: Duration) -> Self {
        self.request_interval = interval;
        self
    }

    /// Fails the walk instead of fetching more than `max_pages` pages.
    #[must_use]
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.limits.max_pages = Some(max_pages);
        self
    }

    /// Fails the walk instead of sleeping longer than `wait` on a rate limit.
    #[must_use]
    pub fn max_retry_wait(mut self, wait: Duration) -> Self {
        self.limits.max_retry_wait = Some(wait);
        self
    }

    /// Team (workspace) the search is scoped to.
    pub fn team(&self) -> &str {
        &self.team
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    /// Configured API root, unvalidated.
    pub fn base(&self) -> &str {
        &self.base_url
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        self.timeout
    }

    /// Spacing between requests.
    pub fn interval(&self) -> Duration {
        self.request_interval
    }

    /// Member whose posts are searched.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Creation dates searched.
    pub fn range(&self) -> DateRange {
        self.range
    }

    /// Bounds applied to the walk.
    pub fn limits(&self) -> Limits {
        self.limits
    }
}
