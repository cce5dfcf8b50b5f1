//! Post detail page assembly

use serde::Serialize;

use crate::content::PostDetail;
use crate::helpers::{date_xml, get_reading_time, ViewOptions, INVALID_DATE};

/// A post ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailView {
    pub uid: String,
    pub title: String,
    pub banner_url: String,
    pub author: String,
    /// Formatted publication date
    pub date: String,
    pub datetime: Option<String>,
    /// Estimated reading time, e.g. "4 min"
    pub reading_time: String,
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionView {
    pub heading: String,
    pub paragraphs: Vec<String>,
}

impl DetailView {
    pub fn from_post(post: &PostDetail, options: &ViewOptions) -> Self {
        let raw_date = post.first_publication_date.as_deref();
        Self {
            uid: post.uid.clone(),
            title: post.title.clone(),
            banner_url: post.banner_url.clone(),
            author: post.author.clone(),
            date: raw_date
                .map(|d| options.date(d))
                .unwrap_or_else(|| INVALID_DATE.to_string()),
            datetime: raw_date.and_then(date_xml),
            reading_time: get_reading_time(&post.full_text()),
            sections: post
                .content
                .iter()
                .map(|section| SectionView {
                    heading: section.heading.clone(),
                    paragraphs: section.body.iter().map(|b| b.text.clone()).collect(),
                })
                .collect(),
        }
    }
}

/// What the detail route renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailState {
    /// Generation is still in flight; show the placeholder
    Fallback,
    Ready(DetailView),
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{BodyFragment, ContentSection};

    fn post(sections: Vec<ContentSection>) -> PostDetail {
        PostDetail {
            uid: "criando-um-app-cra-do-zero".to_string(),
            first_publication_date: Some("2021-03-15T19:25:28+0000".to_string()),
            title: "Criando um app CRA do zero".to_string(),
            banner_url: "https://images.example/banner.png".to_string(),
            author: "Danilo Vieira".to_string(),
            content: sections,
        }
    }

    fn section(words: usize) -> ContentSection {
        ContentSection {
            heading: format!("{} words", words),
            body: vec![BodyFragment {
                text: "palavra ".repeat(words).trim_end().to_string(),
            }],
        }
    }

    #[test]
    fn test_reading_time_counts_every_section() {
        // 60 + 60 words rounds to 1 min; the last section alone would round to 0
        let view = DetailView::from_post(
            &post(vec![section(60), section(60)]),
            &ViewOptions::default(),
        );
        assert_eq!(view.reading_time, "1 min");

        let view = DetailView::from_post(
            &post(vec![section(150), section(150), section(10)]),
            &ViewOptions::default(),
        );
        assert_eq!(view.reading_time, "2 min");
    }

    #[test]
    fn test_view_fields() {
        let view = DetailView::from_post(&post(vec![section(3)]), &ViewOptions::default());
        assert_eq!(view.date, "15 Mar 2021");
        assert_eq!(view.datetime.as_deref(), Some("2021-03-15T19:25:28+00:00"));
        assert_eq!(view.sections[0].paragraphs, vec!["palavra palavra palavra"]);
    }

    #[test]
    fn test_missing_date_uses_sentinel() {
        let mut unpublished = post(Vec::new());
        unpublished.first_publication_date = None;
        let view = DetailView::from_post(&unpublished, &ViewOptions::default());
        assert_eq!(view.date, INVALID_DATE);
        assert_eq!(view.reading_time, "0 min");
    }
}
