use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::{de_page, post::Post};

/// One page of `/v1/teams/{team}/posts` search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostsPage {
    /// Largest page size the service allows.
    #[serde(default)]
    max_per_page: u32,
    /// Posts per page for this search.
    per_page: u32,
    /// Number of this page, starting at 1.
    page: u32,
    /// Posts matching the search across every page.
    total_count: u32,
    /// Next page, `None` on the last page.
    #[serde(default, deserialize_with = "de_page")]
    next_page: Option<u32>,
    /// Previous page, `None` on the first page.
    #[serde(default, deserialize_with = "de_page")]
    prev_page: Option<u32>,
    /// Posts on this page, in service order.
    posts: Vec<Post>,
}

impl PostsPage {
    /// Returns the largest page size the service allows.
    pub fn max_per_page(&self) -> u32 {
        self.max_per_page
    }
    /// Returns the number of posts per page.
    pub fn per_page(&self) -> u32 {
        self.per_page
    }
    /// Returns the number of this page.
    pub fn page(&self) -> u32 {
        self.page
    }
    /// Returns the number of matching posts across all pages.
    pub fn total_count(&self) -> u32 {
        self.total_count
    }
    /// Returns the next page, if there is one.
    pub fn next_page(&self) -> Option<u32> {
        self.next_page
    }
    /// Returns the previous page, if there is one.
    pub fn prev_page(&self) -> Option<u32> {
        self.prev_page
    }
    /// Returns the posts on this page.
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Summary of the walk as of this page.
    pub fn summary(&self) -> PageSummary {
        PageSummary {
            total_count: self.total_count,
            per_page: self.per_page,
        }
    }

    /// Number of pages needed for `total_count` posts at `per_page` each.
    pub fn total_pages(&self) -> u32 {
        self.summary().total_pages()
    }

    pub(crate) fn into_posts(self) -> Vec<Post> {
        self.posts
    }
}

/// Totals reported by the last page of a walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    /// Posts matching the search across every page.
    pub total_count: u32,
    /// Posts per page.
    pub per_page: u32,
}

impl PageSummary {
    /// Number of pages needed to hold `total_count` posts.
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        self.total_count.div_ceil(self.per_page)
    }
}

/// What one fetch of a page produced.
#[derive(Debug, Clone)]
pub enum PageReply {
    /// A decoded content page.
    Page(PostsPage),
    /// The service answered `429`; the same page must be asked for again
    /// after `retry_after`. Carries no posts.
    RateLimited {
        /// Wait taken from the `Retry-After` header.
        retry_after: Duration,
    },
}

impl PageReply {
    /// Returns the requested wait when the reply is a rate-limit signal.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            PageReply::Page(_) => None,
            PageReply::RateLimited { retry_after } => Some(*retry_after),
        }
    }
}
