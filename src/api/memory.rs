//! In-memory content source
//!
//! Backs `--fixtures` builds and tests. Posts are kept newest first and
//! the cursor is the decimal index of the next post to return.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::{ContentError, ContentSource};
use crate::content::{ContentSection, Page, PostDetail, PostSummary};
use crate::helpers::parse_timestamp;

/// A post as written in a fixture file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FixturePost {
    pub uid: String,
    pub first_publication_date: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner_url: String,
    pub content: Vec<ContentSection>,
}

#[derive(Debug, Deserialize)]
struct FixtureFile {
    posts: Vec<FixturePost>,
}

impl FixturePost {
    fn summary(&self) -> PostSummary {
        PostSummary {
            uid: self.uid.clone(),
            first_publication_date: self.first_publication_date.clone().unwrap_or_default(),
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            author: self.author.clone(),
        }
    }

    fn detail(&self) -> PostDetail {
        PostDetail {
            uid: self.uid.clone(),
            first_publication_date: self.first_publication_date.clone(),
            title: self.title.clone(),
            banner_url: self.banner_url.clone(),
            author: self.author.clone(),
            content: self.content.clone(),
        }
    }
}

/// Posts held in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    posts: Vec<FixturePost>,
}

impl MemorySource {
    /// Create a source, ordering posts newest first. Undated posts sort last.
    pub fn new(mut posts: Vec<FixturePost>) -> Self {
        posts.sort_by_key(|post| {
            std::cmp::Reverse(
                post.first_publication_date
                    .as_deref()
                    .and_then(parse_timestamp),
            )
        });
        Self { posts }
    }

    /// Parse a fixture document: `{ "posts": [ ... ] }`
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let file: FixtureFile = serde_json::from_str(json)?;
        Ok(Self::new(file.posts))
    }

    /// Load a fixture file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let source = Self::from_json(&content)?;
        tracing::info!(
            "Loaded {} fixture posts from {:?}",
            source.posts.len(),
            path.as_ref()
        );
        Ok(source)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    async fn fetch_page(
        &self,
        page_size: usize,
        after: Option<&str>,
    ) -> Result<Page<PostSummary>, ContentError> {
        let start = match after {
            Some(cursor) => cursor
                .parse::<usize>()
                .ok()
                .filter(|index| *index <= self.posts.len())
                .ok_or_else(|| ContentError::InvalidCursor(cursor.to_string()))?,
            None => 0,
        };
        let end = (start + page_size.max(1)).min(self.posts.len());

        let results = self.posts[start..end].iter().map(FixturePost::summary).collect();
        let next = (end < self.posts.len()).then(|| end.to_string());
        Ok(Page::new(results, next))
    }

    async fn fetch_by_uid(&self, uid: &str) -> Result<PostDetail, ContentError> {
        self.posts
            .iter()
            .find(|post| post.uid == uid)
            .map(FixturePost::detail)
            .ok_or_else(|| ContentError::NotFound(uid.to_string()))
    }
}
