use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can stop a search walk.
///
/// None of these are recovered from locally; the only retry in the crate is
/// the single backoff after a rate-limit signal.
#[derive(Debug, Error)]
pub enum Error {
    /// The client could not be built from the supplied settings.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Connection, timeout, TLS or body read failure.
    #[error("{0}")]
    Reqwest(#[from] reqwest::Error),

    /// Any status other than `200 OK` or `429 Too Many Requests`.
    #[error("esa status code {0}")]
    UnexpectedStatus(StatusCode),

    /// A `429` response came without a `Retry-After` header.
    #[error("rate limited without a Retry-After header")]
    MissingRetryAfter,

    /// A `429` response carried a `Retry-After` that is not whole seconds.
    #[error("Retry-After is not a number of seconds: {0:?}")]
    InvalidRetryAfter(String),

    /// A `200` response body was not a valid posts page.
    #[error("{0}")]
    Decode(#[from] serde_json::Error),

    /// The single retry of a page was rate limited again.
    #[error("still rate limited after retrying, retry after {} sec", .retry_after.as_secs())]
    RateLimited {
        /// Wait the server asked for on the second attempt.
        retry_after: Duration,
    },

    /// A page pointed at a next page that does not move the walk forward.
    #[error("page {page} reported next page {next}")]
    InvalidNextPage {
        /// Page that was fetched.
        page: u32,
        /// Next page it reported.
        next: u32,
    },

    /// The walk needed more pages than the configured maximum.
    #[error("walk exceeded the limit of {0} pages")]
    PageLimitExceeded(u32),

    /// The server asked for a longer backoff than the configured maximum.
    #[error("server asked to wait {} sec, limit is {} sec", .requested.as_secs(), .limit.as_secs())]
    RetryWaitTooLong {
        /// Wait taken from `Retry-After`.
        requested: Duration,
        /// Configured `max_retry_wait`.
        limit: Duration,
    },

    /// The request pacing semaphore was closed.
    #[error("{0}")]
    Limiter(#[from] tokio::sync::AcquireError),
}
