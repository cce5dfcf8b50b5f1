//! Prismic REST API v2 response shapes

use serde::Deserialize;

use crate::content::{BodyFragment, ContentSection, PostDetail, PostSummary};

/// `GET /api/v2`
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub refs: Vec<RefEntry>,
}

#[derive(Debug, Deserialize)]
pub struct RefEntry {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
}

/// `GET /api/v2/documents/search`
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<Document>,
    pub next_page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Document {
    pub uid: Option<String>,
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub data: DocumentData,
}

#[derive(Debug, Default, Deserialize)]
pub struct DocumentData {
    #[serde(default)]
    pub title: Option<TextField>,
    #[serde(default)]
    pub subtitle: Option<TextField>,
    #[serde(default)]
    pub author: Option<TextField>,
    #[serde(default)]
    pub banner: Option<ImageField>,
    #[serde(default)]
    pub content: Vec<SectionField>,
}

/// Key text or rich text; both appear depending on the custom type
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TextField {
    Plain(String),
    Rich(Vec<RichTextSpan>),
}

#[derive(Debug, Deserialize)]
pub struct RichTextSpan {
    #[serde(default)]
    pub text: String,
}

/// An image field; empty images come back as `{}`
#[derive(Debug, Default, Deserialize)]
pub struct ImageField {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SectionField {
    #[serde(default)]
    pub heading: Option<TextField>,
    #[serde(default)]
    pub body: Vec<RichTextSpan>,
}

impl TextField {
    fn into_text(self) -> String {
        match self {
            TextField::Plain(text) => text,
            TextField::Rich(spans) => spans
                .into_iter()
                .map(|span| span.text)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn text(field: Option<TextField>) -> String {
    field.map(TextField::into_text).unwrap_or_default()
}

impl Document {
    /// Convert to a listing summary. Documents without a uid are unroutable.
    pub fn into_summary(self) -> Option<PostSummary> {
        let uid = self.uid?;
        Some(PostSummary {
            uid,
            first_publication_date: self.first_publication_date.unwrap_or_default(),
            title: text(self.data.title),
            subtitle: text(self.data.subtitle),
            author: text(self.data.author),
        })
    }

    /// Convert to a full post, falling back to `uid` when the document lacks one
    pub fn into_detail(self, uid: &str) -> PostDetail {
        let data = self.data;
        PostDetail {
            uid: self.uid.unwrap_or_else(|| uid.to_string()),
            first_publication_date: self.first_publication_date,
            title: text(data.title),
            banner_url: data.banner.and_then(|b| b.url).unwrap_or_default(),
            author: text(data.author),
            content: data
                .content
                .into_iter()
                .map(|section| ContentSection {
                    heading: text(section.heading),
                    body: section
                        .body
                        .into_iter()
                        .map(|span| BodyFragment { text: span.text })
                        .collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_rich_text_fields() {
        let json = r#"{
            "uid": "hooks",
            "first_publication_date": "2021-03-15T19:25:28+0000",
            "data": {
                "title": "Como utilizar Hooks",
                "subtitle": [{"type": "paragraph", "text": "Pensando em", "spans": []},
                             {"type": "paragraph", "text": "sincronização", "spans": []}],
                "author": null
            }
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        let summary = doc.into_summary().unwrap();
        assert_eq!(summary.title, "Como utilizar Hooks");
        assert_eq!(summary.subtitle, "Pensando em sincronização");
        assert_eq!(summary.author, "");
    }

    #[test]
    fn test_document_without_uid_is_skipped() {
        let doc: Document = serde_json::from_str(r#"{"data": {}}"#).unwrap();
        assert!(doc.into_summary().is_none());
    }

    #[test]
    fn test_detail_mapping() {
        let json = r#"{
            "uid": "hooks",
            "first_publication_date": null,
            "data": {
                "title": "Hooks",
                "author": "Joseph",
                "banner": {},
                "content": [
                    {"heading": "Intro", "body": [{"type": "paragraph", "text": "one two", "spans": []}]},
                    {"heading": [{"type": "heading2", "text": "Rich heading"}], "body": []}
                ]
            }
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        let detail = doc.into_detail("hooks");
        assert_eq!(detail.first_publication_date, None);
        assert_eq!(detail.banner_url, "");
        assert_eq!(detail.content.len(), 2);
        assert_eq!(detail.content[0].body[0].text, "one two");
        assert_eq!(detail.content[1].heading, "Rich heading");
    }
}
