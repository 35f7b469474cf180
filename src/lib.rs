#![deny(clippy::all, clippy::pedantic)]
#![deny(missing_docs)]
#![allow(clippy::must_use_candidate)]
//! # esa-yearly
//!
//! esa-yearly collects every post a team member wrote on esa.io in a range
//! of dates, for yearly retrospectives and the like.
//!
//! It walks the paginated search API:
//! - one page at a time, spacing requests out.
//! - backing off once when the service answers `429 Too Many Requests`,
//!   for exactly as long as its `Retry-After` header says.
//! - returning the collected [`Post`]s newest first.
//!
//! ## Example: Listing this year's posts as markdown.
//!
//! ```no_run
//! # type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
//! use esa_yearly::{Client, Config, DateRange, Posts};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::new("kanmu", "api-token", "achiku", DateRange::current_year());
//!     let client = Client::new(&config)?;
//!
//!     let posts = Posts::new(&client, &config).await?;
//!     for post in posts.iter() {
//!         println!("{}", post.to_markdown());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! [`Post`]: crate::models::post::Post

/// Client module contains [`Client`] for requesting pages of search results.
pub mod client;

/// Run settings: connection, search and walk limits.
pub mod config;

/// Contains [`Error`]s that can be thrown by the libary.
///
/// [`Error`]: crate::error::Error
pub mod error;

/// Wire types decoded from the search API.
pub mod models;

/// Search query encoding.
pub mod query;

/// Retry, pagination and ordering of search results.
pub mod search;

pub(crate) mod result;

pub use client::Client;
pub use config::{Config, DateRange, Limits};
pub use error::Error;
pub use models::{
    page::{PageReply, PageSummary, PostsPage},
    post::{Author, Post},
    posts::Posts,
};
pub use query::SearchQuery;
pub use search::{PageSource, Walk};
