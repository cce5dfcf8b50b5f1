//! Home page listing with "load more" pagination
//!
//! [`Listing`] owns the raw summaries fetched so far and the cursor of the
//! next page. Display dates are never written back into it. [`Listing::view`]
//! derives fresh [`PostCard`]s on every call, so rendering twice gives the
//! same output.

use serde::Serialize;

use crate::api::{ContentError, ContentSource};
use crate::content::{Page, PostSummary};
use crate::helpers::{date_xml, ViewOptions};

/// Where the listing is in its load cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    /// A "load more" request is in flight
    Loading,
    /// The last "load more" failed; posts and cursor are untouched
    Failed(String),
}

/// A post summary ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostCard {
    pub uid: String,
    pub href: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    /// Formatted publication date, e.g. "19 Abr 2021"
    pub date: String,
    /// Machine-readable publication date, when parseable
    pub datetime: Option<String>,
}

impl PostCard {
    pub fn from_summary(summary: &PostSummary, options: &ViewOptions) -> Self {
        Self {
            uid: summary.uid.clone(),
            href: format!("/post/{}", summary.uid),
            title: summary.title.clone(),
            subtitle: summary.subtitle.clone(),
            author: summary.author.clone(),
            date: options.date(&summary.first_publication_date),
            datetime: date_xml(&summary.first_publication_date),
        }
    }
}

/// Format a page of summaries for display
pub fn cards(page: &Page<PostSummary>, options: &ViewOptions) -> Page<PostCard> {
    Page::new(
        page.results
            .iter()
            .map(|summary| PostCard::from_summary(summary, options))
            .collect(),
        page.next_page_cursor.clone(),
    )
}

/// Paginated post listing
#[derive(Debug, Clone)]
pub struct Listing {
    posts: Vec<PostSummary>,
    next_cursor: Option<String>,
    state: LoadState,
}

impl Listing {
    /// Start from the initial page produced at generation time
    pub fn from_page(page: Page<PostSummary>) -> Self {
        Self {
            posts: page.results,
            next_cursor: page.next_page_cursor.filter(|c| !c.is_empty()),
            state: LoadState::Idle,
        }
    }

    /// Fetch the first page from a source
    pub async fn fetch(source: &dyn ContentSource, page_size: usize) -> Result<Self, ContentError> {
        Ok(Self::from_page(source.fetch_page(page_size, None).await?))
    }

    /// Raw summaries loaded so far, in fetch order
    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Whether the "load more" affordance should be offered
    pub fn can_load_more(&self) -> bool {
        self.state != LoadState::Loading && self.next_cursor.is_some()
    }

    /// Enter `Loading` and hand out the cursor to fetch.
    ///
    /// Returns `None` without changing anything when a load is already in
    /// flight or there are no further pages.
    pub fn begin_load(&mut self) -> Option<String> {
        if !self.can_load_more() {
            return None;
        }
        self.state = LoadState::Loading;
        self.next_cursor.clone()
    }

    /// Append a fetched page and return to `Idle`. Returns the number of posts added.
    pub fn finish_load(&mut self, page: Page<PostSummary>) -> usize {
        let added = page.results.len();
        self.posts.extend(page.results);
        self.next_cursor = page.next_page_cursor.filter(|c| !c.is_empty());
        self.state = LoadState::Idle;
        added
    }

    /// Record a failed load, keeping posts and cursor so it can be retried
    pub fn fail_load(&mut self, error: &ContentError) {
        tracing::warn!("Loading more posts failed: {}", error);
        self.state = LoadState::Failed(error.to_string());
    }

    /// Run one "load more" cycle against `source`.
    ///
    /// Returns `Ok(0)` when there was nothing to load or a load was
    /// already in flight.
    pub async fn load_more(
        &mut self,
        source: &dyn ContentSource,
        page_size: usize,
    ) -> Result<usize, ContentError> {
        let Some(cursor) = self.begin_load() else {
            return Ok(0);
        };

        match source.fetch_page(page_size, Some(&cursor)).await {
            Ok(page) => Ok(self.finish_load(page)),
            Err(e) => {
                self.fail_load(&e);
                Err(e)
            }
        }
    }

    /// Display cards for every loaded post
    pub fn view(&self, options: &ViewOptions) -> Vec<PostCard> {
        self.posts
            .iter()
            .map(|summary| PostCard::from_summary(summary, options))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{FixturePost, MemorySource};
    use crate::content::PostDetail;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    fn fixtures() -> MemorySource {
        let dates = [
            ("c", "2021-04-19T12:00:00Z"),
            ("b", "2021-03-25T19:25:28+0000"),
            ("a", "2021-03-01T08:00:00Z"),
        ];
        MemorySource::new(
            dates
                .iter()
                .map(|(uid, date)| FixturePost {
                    uid: uid.to_string(),
                    first_publication_date: Some(date.to_string()),
                    title: format!("Post {}", uid),
                    ..FixturePost::default()
                })
                .collect(),
        )
    }

    struct OfflineSource;

    #[async_trait]
    impl ContentSource for OfflineSource {
        async fn fetch_page(
            &self,
            _page_size: usize,
            _after: Option<&str>,
        ) -> Result<Page<PostSummary>, ContentError> {
            Err(ContentError::Status {
                status: 503,
                url: "https://repo.example/api/v2".to_string(),
            })
        }

        async fn fetch_by_uid(&self, uid: &str) -> Result<PostDetail, ContentError> {
            Err(ContentError::NotFound(uid.to_string()))
        }
    }

    fn uids(listing: &Listing) -> Vec<&str> {
        listing.posts().iter().map(|p| p.uid.as_str()).collect()
    }

    #[tokio::test]
    async fn test_load_more_appends_in_fetch_order() {
        let source = fixtures();
        let mut listing = Listing::fetch(&source, 1).await.unwrap();
        assert_eq!(uids(&listing), vec!["c"]);
        assert!(listing.can_load_more());

        assert_eq!(listing.load_more(&source, 1).await.unwrap(), 1);
        assert_eq!(listing.load_more(&source, 1).await.unwrap(), 1);
        assert_eq!(uids(&listing), vec!["c", "b", "a"]);
        assert_eq!(listing.state(), &LoadState::Idle);

        // exhausted: affordance gone, further loads are no-ops
        assert!(!listing.can_load_more());
        assert_eq!(listing.load_more(&source, 1).await.unwrap(), 0);
    }

    #[test]
    fn test_no_affordance_without_cursor() {
        let listing = Listing::from_page(Page::new(Vec::new(), None));
        assert!(!listing.can_load_more());

        let listing = Listing::from_page(Page {
            results: Vec::new(),
            next_page_cursor: Some(String::new()),
        });
        assert!(!listing.can_load_more());

        let listing = Listing::from_page(Page::new(Vec::new(), Some("1".to_string())));
        assert!(listing.can_load_more());
    }

    #[test]
    fn test_begin_load_ignores_repeated_clicks() {
        let mut listing = Listing::from_page(Page::new(Vec::new(), Some("1".to_string())));
        assert_eq!(listing.begin_load().as_deref(), Some("1"));
        assert_eq!(listing.state(), &LoadState::Loading);
        assert!(!listing.can_load_more());
        assert_eq!(listing.begin_load(), None);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_posts_and_cursor() {
        let source = fixtures();
        let mut listing = Listing::fetch(&source, 1).await.unwrap();

        let err = listing.load_more(&OfflineSource, 1).await.unwrap_err();
        assert!(matches!(err, ContentError::Status { status: 503, .. }));
        assert_eq!(uids(&listing), vec!["c"]);
        assert_eq!(listing.next_cursor(), Some("1"));
        assert!(matches!(listing.state(), LoadState::Failed(_)));

        // retry succeeds from the same cursor
        assert!(listing.can_load_more());
        assert_eq!(listing.load_more(&source, 1).await.unwrap(), 1);
        assert_eq!(uids(&listing), vec!["c", "b"]);
    }

    #[tokio::test]
    async fn test_view_is_idempotent_and_keeps_raw_dates() {
        let source = fixtures();
        let listing = Listing::fetch(&source, 3).await.unwrap();
        let options = ViewOptions::default();

        let first = listing.view(&options);
        let second = listing.view(&options);
        assert_eq!(first, second);
        assert_eq!(first[0].date, "19 Abr 2021");
        assert_eq!(first[1].date, "25 Mar 2021");
        assert_eq!(first[0].href, "/post/c");
        assert_eq!(listing.posts()[0].first_publication_date, "2021-04-19T12:00:00Z");
    }

    #[test]
    fn test_card_with_malformed_date() {
        let summary = PostSummary {
            uid: "x".to_string(),
            first_publication_date: "yesterday".to_string(),
            title: String::new(),
            subtitle: String::new(),
            author: String::new(),
        };
        let card = PostCard::from_summary(&summary, &ViewOptions::default());
        assert_eq!(card.date, crate::helpers::INVALID_DATE);
        assert_eq!(card.datetime, None);
    }
}
