use std::{sync::Arc, time::Duration};

use crate::{
    config::Config, error::Error, models::page::PageReply, query::SearchQuery,
    result::Result, search::PageSource,
};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderValue, ACCEPT, AUTHORIZATION, RETRY_AFTER},
    Client as ReqwestClient, StatusCode, Url,
};
use tokio::{
    runtime::Handle,
    sync::{Semaphore, SemaphorePermit},
    task::JoinHandle,
    time::interval,
};

/// Authenticated connection to one team on the service.
///
/// Immutable after construction. When a request interval is configured the
/// client spaces its requests with a permit that is refilled on a timer, so
/// it has to be created inside a tokio runtime.
#[derive(Debug)]
pub struct Client {
    http: ReqwestClient,
    base_url: Url,
    team: String,
    authorization: HeaderValue,
    limiter: Option<RateLimit>,
}

#[derive(Debug)]
pub(crate) struct RateLimit {
    pub(crate) permit: Arc<Semaphore>,
    pub(crate) replenisher: JoinHandle<()>,
}

impl RateLimit {
    fn new(period: Duration) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|_| Error::Config("request pacing needs a tokio runtime".to_string()))?;
        let permit = Arc::new(Semaphore::new(0));
        let clone = permit.clone();

        let replenisher = runtime.spawn(async move {
            let mut interval = interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if clone.available_permits() == 0 {
                    clone.add_permits(1);
                }
            }
        });

        Ok(RateLimit {
            permit,
            replenisher,
        })
    }

    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>> {
        self.permit.acquire().await.map_err(Into::into)
    }
}

impl Drop for RateLimit {
    fn drop(&mut self) {
        self.replenisher.abort();
    }
}

impl Client {
    /// Builds a client from the connection half of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the base URL does not parse, the team is
    /// empty or not a single path segment, the token cannot be sent as a
    /// header, or pacing is on outside a tokio runtime. Returns
    /// [`Error::Reqwest`] if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Client> {
        let base_url = Url::parse(config.base())
            .map_err(|e| Error::Config(format!("base url {:?}: {e}", config.base())))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("base url {:?} cannot be a base", config.base())));
        }

        let team = config.team();
        if team.is_empty() || team.contains(['/', '?', '#', ' ']) {
            return Err(Error::Config(format!("team {team:?} is not a valid team name")));
        }

        if config.token().is_empty() {
            return Err(Error::Config("token is empty".to_string()));
        }
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", config.token()))
            .map_err(|_| Error::Config("token is not a valid header value".to_string()))?;
        authorization.set_sensitive(true);

        let http = ReqwestClient::builder()
            .timeout(config.request_timeout())
            .build()?;

        let limiter = if config.interval().is_zero() {
            None
        } else {
            Some(RateLimit::new(config.interval())?)
        };

        Ok(Client {
            http,
            base_url,
            team: team.to_string(),
            authorization,
            limiter,
        })
    }

    /// Team the client searches in.
    pub fn team(&self) -> &str {
        &self.team
    }

    /// Full request URL for `page` of `query`.
    pub fn posts_url(&self, query: &SearchQuery, page: u32) -> String {
        format!(
            "{}/v1/teams/{}/posts?{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.team,
            query.encode(page)
        )
    }

    /// Fetches a single page of `query`. Never retries.
    ///
    /// A `429` answer is not an error: it comes back as
    /// [`PageReply::RateLimited`] carrying the `Retry-After` wait.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedStatus`] for any status besides 200 and 429,
    /// [`Error::MissingRetryAfter`] or [`Error::InvalidRetryAfter`] for a 429
    /// without a usable wait, [`Error::Decode`] for a malformed body and
    /// [`Error::Reqwest`] for transport failures.
    pub async fn fetch_page(&self, query: &SearchQuery, page: u32) -> Result<PageReply> {
        let url = self.posts_url(query, page);

        let permit = match &self.limiter {
            Some(limiter) => Some(limiter.acquire().await?),
            None => None,
        };
        let response = {
            let builder = self
                .http
                .get(&url)
                .header(AUTHORIZATION, self.authorization.clone())
                .header(ACCEPT, "application/json");
            log::info!("request for page {page} dispatched");
            builder.send().await?
        };

        // reduce the permit count
        if let Some(permit) = permit {
            permit.forget();
        }

        log::debug!("response status: {}", &response.status());

        match response.status() {
            StatusCode::OK => {
                let body = response.bytes().await?;
                Ok(PageReply::Page(serde_json::from_slice(&body)?))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .ok_or(Error::MissingRetryAfter)?;
                let retry_after = parse_retry_after(retry_after)?;
                Ok(PageReply::RateLimited { retry_after })
            }
            code => Err(Error::UnexpectedStatus(code)),
        }
    }
}

fn parse_retry_after(value: &HeaderValue) -> Result<Duration> {
    let text = value
        .to_str()
        .map_err(|_| Error::InvalidRetryAfter(String::from_utf8_lossy(value.as_bytes()).into_owned()))?;
    text.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| Error::InvalidRetryAfter(text.to_string()))
}

#[async_trait]
impl PageSource for Client {
    async fn fetch_page(&self, query: &SearchQuery, page: u32) -> Result<PageReply> {
        Client::fetch_page(self, query, page).await
    }
}
