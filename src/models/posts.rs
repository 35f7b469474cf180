use crate::{
    config::{Config, Limits},
    models::{page::PageSummary, post::Post},
    query::SearchQuery,
    result::Result,
    search::{sort_newest_first, walk, PageSource, Walk},
    Client,
};

/// Every post a member created in a date range, newest first.
#[derive(Debug, Clone, Default)]
pub struct Posts {
    posts: Vec<Post>,
    summary: PageSummary,
}

impl Posts {
    /// Collects the posts described by `config`, walking every result page.
    ///
    /// # Errors
    ///
    /// This function will return an error if any page fails to fetch or
    /// decode, or if a page is still rate limited after its one retry.
    /// Nothing gathered before the failure is returned.
    pub async fn new(client: &Client, config: &Config) -> Result<Self> {
        let query = SearchQuery::new(config.username(), config.range());
        Self::fetch(client, &query, &config.limits()).await
    }

    /// Walks `query` on any [`PageSource`] and orders the result.
    ///
    /// # Errors
    ///
    /// Same as [`walk`].
    pub async fn fetch<S>(source: &S, query: &SearchQuery, limits: &Limits) -> Result<Self>
    where
        S: PageSource + ?Sized,
    {
        let Walk { mut posts, summary } = walk(source, query, limits).await?;
        sort_newest_first(&mut posts);
        Ok(Self { posts, summary })
    }

    /// Totals reported by the last page of the walk.
    pub fn summary(&self) -> PageSummary {
        self.summary
    }

    /// Consumes the collection, returning the ordered posts.
    pub fn into_inner(self) -> Vec<Post> {
        self.posts
    }
}

impl std::ops::Deref for Posts {
    type Target = Vec<Post>;

    fn deref(&self) -> &Self::Target {
        &self.posts
    }
}
