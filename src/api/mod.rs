//! Content source abstraction
//!
//! Pages never talk to the CMS directly. They receive a [`ContentSource`],
//! which is either the Prismic HTTP client or an in-memory store (used
//! for fixtures and tests).

mod memory;
mod prismic;
mod responses;

use async_trait::async_trait;
use thiserror::Error;

use crate::content::{Page, PostDetail, PostSummary};

pub use memory::{FixturePost, MemorySource};
pub use prismic::PrismicClient;

/// Page size used when walking every post for route enumeration
pub const UID_SCAN_PAGE_SIZE: usize = 100;

/// Failure modes of a content source
#[derive(Debug, Error)]
pub enum ContentError {
    /// No post carries the requested uid
    #[error("post not found: {0}")]
    NotFound(String),

    /// The cursor was not issued by this source
    #[error("invalid pagination cursor: {0:?}")]
    InvalidCursor(String),

    /// The API answered with a non-success status
    #[error("content API returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// The request never produced a response
    #[error("content API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not have the expected shape
    #[error("unexpected content API response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The API did not advertise a master ref to query against
    #[error("no master ref advertised by {0}")]
    MissingRef(String),
}

impl ContentError {
    /// Whether the error means the post simply doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Read-only access to published posts
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch up to `page_size` summaries, newest first, starting after `after`
    async fn fetch_page(
        &self,
        page_size: usize,
        after: Option<&str>,
    ) -> Result<Page<PostSummary>, ContentError>;

    /// Fetch a single post by uid
    async fn fetch_by_uid(&self, uid: &str) -> Result<PostDetail, ContentError>;

    /// Every published uid, newest first
    async fn list_all_uids(&self) -> Result<Vec<String>, ContentError> {
        let mut uids = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self
                .fetch_page(UID_SCAN_PAGE_SIZE, cursor.as_deref())
                .await?;
            uids.extend(page.results.into_iter().map(|post| post.uid));

            match page.next_page_cursor {
                Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                    tracing::warn!("Content source repeated cursor {:?}, stopping scan", next);
                    break;
                }
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        tracing::debug!("Enumerated {} post uids", uids.len());
        Ok(uids)
    }
}
