use std::cmp::Reverse;

use async_trait::async_trait;

use crate::{
    config::Limits,
    error::Error,
    models::{
        page::{PageReply, PageSummary},
        post::Post,
    },
    query::SearchQuery,
    result::Result,
};

/// Anything that can fetch one page of search results.
///
/// [`Client`](crate::Client) is the real implementation; the walk only ever
/// talks to this trait.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches `page` of `query` exactly once.
    async fn fetch_page(&self, query: &SearchQuery, page: u32) -> Result<PageReply>;
}

/// Fetches `page`, backing off once if the source signals a rate limit.
///
/// The wait is exactly what the server asked for. Whatever the second
/// attempt yields is returned as is, including another rate-limit signal.
/// Dropping the returned future cancels a pending backoff.
///
/// # Errors
///
/// Propagates any error from either attempt, and returns
/// [`Error::RetryWaitTooLong`] when the requested wait exceeds
/// `limits.max_retry_wait`.
pub async fn fetch_with_retry<S>(
    source: &S,
    query: &SearchQuery,
    page: u32,
    limits: &Limits,
) -> Result<PageReply>
where
    S: PageSource + ?Sized,
{
    let reply = source.fetch_page(query, page).await?;
    let Some(retry_after) = reply.retry_after() else {
        return Ok(reply);
    };

    if let Some(limit) = limits.max_retry_wait {
        if retry_after > limit {
            return Err(Error::RetryWaitTooLong {
                requested: retry_after,
                limit,
            });
        }
    }

    log::warn!("retry after {} sec", retry_after.as_secs());
    tokio::time::sleep(retry_after).await;
    source.fetch_page(query, page).await
}

/// Every post a walk collected, plus the totals of its last page.
#[derive(Debug, Clone, Default)]
pub struct Walk {
    /// Posts in fetch order.
    pub posts: Vec<Post>,
    /// Totals reported by the final page.
    pub summary: PageSummary,
}

/// Follows `next_page` from page 1 until the service reports no next page.
///
/// Pages are fetched one after another, never concurrently. Any error ends
/// the walk and the posts gathered so far are dropped.
///
/// # Errors
///
/// Propagates errors from [`fetch_with_retry`]. Returns
/// [`Error::RateLimited`] when a page is still rate limited after its retry,
/// [`Error::InvalidNextPage`] when a page points backwards and
/// [`Error::PageLimitExceeded`] when `limits.max_pages` would be passed.
pub async fn walk<S>(source: &S, query: &SearchQuery, limits: &Limits) -> Result<Walk>
where
    S: PageSource + ?Sized,
{
    let mut posts = Vec::new();
    let mut current = 1;

    loop {
        if let Some(max) = limits.max_pages {
            if current > max {
                return Err(Error::PageLimitExceeded(max));
            }
        }

        let page = match fetch_with_retry(source, query, current, limits).await? {
            PageReply::Page(page) => page,
            PageReply::RateLimited { retry_after } => {
                return Err(Error::RateLimited { retry_after })
            }
        };

        if current == 1 {
            log::info!(
                "total posts: {}, total pages: {}",
                page.total_count(),
                page.total_pages()
            );
        }
        log::info!("current page {}", page.page());

        let next = page.next_page();
        let summary = page.summary();
        posts.extend(page.into_posts());

        match next {
            None => return Ok(Walk { posts, summary }),
            Some(next) if next <= current => {
                return Err(Error::InvalidNextPage {
                    page: current,
                    next,
                })
            }
            Some(next) => current = next,
        }
    }
}

/// Sorts `posts` by creation time, newest first.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by_key(|post| Reverse(post.created_at()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::DateRange, models::page::PostsPage};
    use std::{
        collections::VecDeque,
        sync::Mutex,
        time::Duration,
    };
    use tokio::time::Instant;

    /// Replays canned replies and records which pages were asked for.
    struct Scripted {
        replies: Mutex<VecDeque<Result<PageReply>>>,
        requested: Mutex<Vec<(u32, Instant)>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<PageReply>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn pages(&self) -> Vec<u32> {
            self.requested.lock().unwrap().iter().map(|(p, _)| *p).collect()
        }
    }

    #[async_trait]
    impl PageSource for Scripted {
        async fn fetch_page(&self, _query: &SearchQuery, page: u32) -> Result<PageReply> {
            self.requested.lock().unwrap().push((page, Instant::now()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("no reply scripted for this fetch")
        }
    }

    fn post(url: &str, created_at: &str) -> serde_json::Value {
        serde_json::json!({
            "url": url,
            "full_name": format!("日報/{url}"),
            "created_at": created_at,
            "updated_at": created_at,
            "created_by": { "screen_name": "achiku", "name": "Akira Chiku" }
        })
    }

    fn page(number: u32, next: u32, posts: Vec<serde_json::Value>) -> Result<PageReply> {
        let page: PostsPage = serde_json::from_value(serde_json::json!({
            "max_per_page": 100,
            "per_page": 2,
            "page": number,
            "total_count": 5,
            "next_page": next,
            "prev_page": number - 1,
            "posts": posts
        }))
        .unwrap();
        Ok(PageReply::Page(page))
    }

    fn limited(secs: u64) -> Result<PageReply> {
        Ok(PageReply::RateLimited {
            retry_after: Duration::from_secs(secs),
        })
    }

    fn query() -> SearchQuery {
        SearchQuery::new("achiku", DateRange::year(2020))
    }

    fn three_pages() -> Vec<Result<PageReply>> {
        vec![
            page(1, 2, vec![post("a", "2020-03-01T00:00:00+09:00"), post("b", "2020-11-01T00:00:00+09:00")]),
            page(2, 3, vec![post("c", "2020-01-05T00:00:00+09:00"), post("d", "2020-12-24T00:00:00+09:00")]),
            page(3, 0, vec![post("e", "2020-06-15T00:00:00+09:00")]),
        ]
    }

    #[tokio::test]
    async fn walk_collects_every_page() {
        let source = Scripted::new(three_pages());
        let walk = walk(&source, &query(), &Limits::default()).await.unwrap();

        assert_eq!(source.pages(), vec![1, 2, 3]);
        assert_eq!(walk.posts.len(), 5);
        assert_eq!(walk.posts.len() as u32, walk.summary.total_count);
        assert_eq!(walk.summary.per_page, 2);
    }

    #[tokio::test]
    async fn sorted_walk_is_newest_first() {
        let source = Scripted::new(three_pages());
        let mut posts = walk(&source, &query(), &Limits::default()).await.unwrap().posts;
        sort_newest_first(&mut posts);

        let urls: Vec<_> = posts.iter().map(Post::url).collect();
        assert_eq!(urls, vec!["d", "b", "e", "a", "c"]);
        assert!(posts.windows(2).all(|w| w[0].created_at() >= w[1].created_at()));
    }

    #[tokio::test]
    async fn sorting_sorted_posts_changes_nothing() {
        let source = Scripted::new(three_pages());
        let mut posts = walk(&source, &query(), &Limits::default()).await.unwrap().posts;
        sort_newest_first(&mut posts);
        let once = posts.clone();
        sort_newest_first(&mut posts);
        assert_eq!(posts, once);
    }

    #[tokio::test]
    async fn equal_creation_times_keep_fetch_order() {
        let source = Scripted::new(vec![page(
            1,
            0,
            vec![
                post("late", "2020-12-01T00:00:00+09:00"),
                post("first", "2020-05-01T00:00:00+09:00"),
                post("second", "2020-05-01T00:00:00+09:00"),
            ],
        )]);
        let mut posts = walk(&source, &query(), &Limits::default()).await.unwrap().posts;
        sort_newest_first(&mut posts);

        let urls: Vec<_> = posts.iter().map(Post::url).collect();
        assert_eq!(urls, vec!["late", "first", "second"]);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_waits_then_retries_once() {
        let source = Scripted::new(vec![limited(2), page(1, 0, vec![])]);
        let reply = fetch_with_retry(&source, &query(), 1, &Limits::default())
            .await
            .unwrap();

        assert!(matches!(reply, PageReply::Page(_)));
        let requested = source.requested.lock().unwrap();
        assert_eq!(requested.len(), 2);
        let waited = requested[1].1 - requested[0].1;
        assert!(waited >= Duration::from_secs(2), "{waited:?}");
        assert!(waited < Duration::from_secs(3), "{waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn second_rate_limit_is_returned_not_looped() {
        let source = Scripted::new(vec![limited(1), limited(3)]);
        let reply = fetch_with_retry(&source, &query(), 4, &Limits::default())
            .await
            .unwrap();

        assert_eq!(reply.retry_after(), Some(Duration::from_secs(3)));
        assert_eq!(source.pages(), vec![4, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn walk_fails_when_retry_is_still_limited() {
        let source = Scripted::new(vec![limited(1), limited(1)]);
        let err = walk(&source, &query(), &Limits::default()).await.unwrap_err();
        assert!(matches!(err, Error::RateLimited { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn walk_retries_the_same_page() {
        let mut replies = three_pages();
        replies.insert(1, limited(1));
        let source = Scripted::new(replies);

        let walk = walk(&source, &query(), &Limits::default()).await.unwrap();
        assert_eq!(source.pages(), vec![1, 2, 2, 3]);
        assert_eq!(walk.posts.len(), 5);
    }

    #[tokio::test]
    async fn error_from_later_page_aborts_walk() {
        let mut replies = three_pages();
        replies[1] = Err(Error::UnexpectedStatus(reqwest::StatusCode::FORBIDDEN));
        let source = Scripted::new(replies);

        let err = walk(&source, &query(), &Limits::default()).await.unwrap_err();
        assert!(matches!(err, Error::UnexpectedStatus(code) if code == reqwest::StatusCode::FORBIDDEN));
        assert_eq!(source.pages(), vec![1, 2]);
    }

    #[tokio::test]
    async fn retry_error_propagates() {
        let source = Scripted::new(vec![limited(0), Err(Error::MissingRetryAfter)]);
        let err = fetch_with_retry(&source, &query(), 1, &Limits::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingRetryAfter));
    }

    #[tokio::test]
    async fn oversized_wait_is_refused() {
        let source = Scripted::new(vec![limited(3600)]);
        let limits = Limits {
            max_retry_wait: Some(Duration::from_secs(60)),
            ..Limits::default()
        };
        let err = fetch_with_retry(&source, &query(), 1, &limits).await.unwrap_err();
        assert!(matches!(err, Error::RetryWaitTooLong { .. }));
        assert_eq!(source.pages(), vec![1]);
    }

    #[tokio::test]
    async fn page_limit_stops_walk() {
        let source = Scripted::new(three_pages());
        let limits = Limits {
            max_pages: Some(2),
            ..Limits::default()
        };
        let err = walk(&source, &query(), &limits).await.unwrap_err();
        assert!(matches!(err, Error::PageLimitExceeded(2)));
        assert_eq!(source.pages(), vec![1, 2]);
    }

    #[tokio::test]
    async fn backwards_next_page_is_rejected() {
        let source = Scripted::new(vec![page(1, 2, vec![]), page(2, 1, vec![])]);
        let err = walk(&source, &query(), &Limits::default()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidNextPage { page: 2, next: 1 }));
    }
}
