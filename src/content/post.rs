//! Post models

use serde::{Deserialize, Serialize};

/// A post as it appears in the listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    /// Unique, opaque post identifier
    pub uid: String,

    /// Raw ISO-8601 publication timestamp
    pub first_publication_date: String,

    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A full post, as rendered on its own page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDetail {
    pub uid: String,

    /// Raw ISO-8601 publication timestamp, absent for unpublished previews
    pub first_publication_date: Option<String>,

    pub title: String,
    pub banner_url: String,
    pub author: String,

    /// Sections in document order
    pub content: Vec<ContentSection>,
}

/// A headed block of post content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSection {
    pub heading: String,
    pub body: Vec<BodyFragment>,
}

/// One paragraph of section body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyFragment {
    pub text: String,
}

impl PostDetail {
    /// All body text in document order, fragments joined by one space
    pub fn full_text(&self) -> String {
        self.content
            .iter()
            .flat_map(|section| section.body.iter())
            .map(|fragment| fragment.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One page of results from the content source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Results in source order
    pub results: Vec<T>,

    /// Cursor of the following page; `None` once the source is exhausted
    pub next_page_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Build a page, treating an empty cursor as "no further pages"
    pub fn new(results: Vec<T>, next_page_cursor: Option<String>) -> Self {
        Self {
            results,
            next_page_cursor: next_page_cursor.filter(|c| !c.is_empty()),
        }
    }

    /// Whether another page can be requested
    pub fn has_next(&self) -> bool {
        self.next_page_cursor.is_some()
    }
}
