//! Built-in site templates using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping stays on: every
//! string rendered comes from the CMS.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

use crate::detail::DetailView;
use crate::helpers::ViewOptions;
use crate::i18n::Labels;
use crate::listing::PostCard;

/// Seconds before the fallback placeholder reloads itself
pub const FALLBACK_RETRY_SECS: u64 = 1;

/// Template renderer with the embedded site theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("index.html", include_str!("site/index.html")),
            ("post.html", include_str!("site/post.html")),
            ("fallback.html", include_str!("site/fallback.html")),
            ("404.html", include_str!("site/404.html")),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> tera::Result<String> {
        self.tera.render(template_name, context)
    }

    /// Home page with its first page of cards
    pub fn render_index(
        &self,
        site: &SiteData,
        posts: &[PostCard],
        next_cursor: Option<&str>,
    ) -> tera::Result<String> {
        let mut context = Context::new();
        context.insert("site", site);
        context.insert("posts", posts);
        context.insert("next_cursor", &next_cursor);
        self.render("index.html", &context)
    }

    pub fn render_post(&self, site: &SiteData, post: &DetailView) -> tera::Result<String> {
        let mut context = Context::new();
        context.insert("site", site);
        context.insert("post", post);
        self.render("post.html", &context)
    }

    /// Placeholder served while a route is generated on demand
    pub fn render_fallback(&self, site: &SiteData) -> tera::Result<String> {
        let mut context = Context::new();
        context.insert("site", site);
        context.insert("retry_secs", &FALLBACK_RETRY_SECS);
        self.render("fallback.html", &context)
    }

    pub fn render_not_found(&self, site: &SiteData) -> tera::Result<String> {
        let mut context = Context::new();
        context.insert("site", site);
        self.render("404.html", &context)
    }
}

/// Site-wide template data
#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub language: String,
    pub labels: Labels,
}

impl SiteData {
    pub fn new(title: &str, options: &ViewOptions) -> Self {
        Self {
            title: title.to_string(),
            language: options.locale.code.to_string(),
            labels: options.locale.labels.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteData {
        SiteData::new("spacetraveling", &ViewOptions::default())
    }

    fn card(uid: &str) -> PostCard {
        PostCard {
            uid: uid.to_string(),
            href: format!("/post/{}", uid),
            title: "Como utilizar <Hooks>".to_string(),
            subtitle: "Pensando em sincronização".to_string(),
            author: "Joseph Oliveira".to_string(),
            date: "15 Mar 2021".to_string(),
            datetime: Some("2021-03-15T19:25:28+00:00".to_string()),
        }
    }

    #[test]
    fn test_index_offers_load_more_only_with_cursor() {
        let renderer = TemplateRenderer::new().unwrap();

        let html = renderer
            .render_index(&site(), &[card("hooks")], Some("2"))
            .unwrap();
        assert!(html.contains("Carregar mais posts"));
        assert!(html.contains(r#"data-next="2""#));
        assert!(html.contains("15 Mar 2021"));

        let html = renderer.render_index(&site(), &[card("hooks")], None).unwrap();
        assert!(!html.contains("Carregar mais posts"));
    }

    #[test]
    fn test_cms_text_is_escaped() {
        let renderer = TemplateRenderer::new().unwrap();
        let html = renderer.render_index(&site(), &[card("hooks")], None).unwrap();
        assert!(html.contains("Como utilizar &lt;Hooks&gt;"));
    }

    #[test]
    fn test_fallback_and_not_found() {
        let renderer = TemplateRenderer::new().unwrap();
        let fallback = renderer.render_fallback(&site()).unwrap();
        assert!(fallback.contains("Carregando..."));
        assert!(fallback.contains("http-equiv=\"refresh\""));

        let missing = renderer.render_not_found(&site()).unwrap();
        assert!(missing.contains("Post não encontrado"));
    }
}
