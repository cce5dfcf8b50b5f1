//! Generator module - the two generation phases and the static output
//!
//! Phase one enumerates route keys ([`static_paths`]). Phase two produces
//! the props of a single route ([`listing_props`], [`detail_props`]),
//! each tagged with how long it stays fresh. [`Generator`] turns props into
//! HTML under the public directory.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use thiserror::Error;

use crate::api::{ContentError, ContentSource};
use crate::cache::{hash_content, RevalidationCache};
use crate::content::{Page, PostDetail, PostSummary};
use crate::detail::{DetailState, DetailView};
use crate::helpers::ViewOptions;
use crate::listing::{cards, Listing};
use crate::templates::{SiteData, TemplateRenderer};
use crate::Site;

/// Route key of the home page
pub const INDEX_ROUTE: &str = "index";
/// Route key of the not-found page
pub const NOT_FOUND_ROUTE: &str = "404";
/// Directory of the pre-rendered "load more" pages
pub const LISTING_PAGE_DIR: &str = "api/posts";

/// Route keys known at build time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPaths {
    pub keys: Vec<String>,
    /// Keys outside `keys` are generated on first request instead of failing
    pub fallback: bool,
}

/// Props of one route plus its staleness interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated<T> {
    pub props: T,
    pub revalidate: Duration,
}

/// Props of the home page
pub type ListingProps = Page<PostSummary>;

/// Props of a post page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailProps {
    pub post: PostDetail,
}

/// Failure to produce a route
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The source has no post with this uid; nothing is rendered
    #[error("post not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Content(ContentError),

    #[error("template error: {0}")]
    Render(#[from] tera::Error),

    #[error("failed to serialize listing page: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<ContentError> for GenerateError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::NotFound(uid) => GenerateError::NotFound(uid),
            other => GenerateError::Content(other),
        }
    }
}

/// Phase one: one route key per published post
pub async fn static_paths(source: &dyn ContentSource) -> Result<StaticPaths, ContentError> {
    Ok(StaticPaths {
        keys: source.list_all_uids().await?,
        fallback: true,
    })
}

/// Phase two for the home page
pub async fn listing_props(
    source: &dyn ContentSource,
    page_size: usize,
    revalidate: Duration,
) -> Result<Generated<ListingProps>, ContentError> {
    Ok(Generated {
        props: source.fetch_page(page_size, None).await?,
        revalidate,
    })
}

/// Phase two for a post page
pub async fn detail_props(
    source: &dyn ContentSource,
    uid: &str,
    revalidate: Duration,
) -> Result<Generated<DetailProps>, GenerateError> {
    Ok(Generated {
        props: DetailProps {
            post: source.fetch_by_uid(uid).await?,
        },
        revalidate,
    })
}

/// Route key of a post page
pub fn post_route(uid: &str) -> String {
    format!("post/{}", uid)
}

/// Route key of a pre-rendered "load more" page
pub fn listing_page_route(cursor: &str) -> String {
    format!("{}/{}.json", LISTING_PAGE_DIR, cursor)
}

/// File a route is written to, relative to the public directory
pub fn route_file(route: &str) -> PathBuf {
    match route {
        INDEX_ROUTE => PathBuf::from("index.html"),
        NOT_FOUND_ROUTE => PathBuf::from("404.html"),
        _ if route.ends_with(".json") => PathBuf::from(route),
        _ => Path::new(route).join("index.html"),
    }
}

/// Whether a uid or cursor can be used as a path segment as-is
pub fn is_path_safe(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Output of rendering one route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRoute {
    pub route: String,
    pub body: String,
    pub hash: u64,
}

impl RenderedRoute {
    fn new(route: String, body: String) -> Self {
        let hash = hash_content(&body);
        Self { route, body, hash }
    }
}

/// Counts reported after a build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Routes written because their output changed
    pub written: usize,
    /// Routes regenerated with identical output
    pub unchanged: usize,
    /// Routes skipped because they are still fresh
    pub fresh: usize,
    /// Routes listed by the source but missing on fetch
    pub missing: usize,
    /// Unsafe uids that cannot become a path
    pub skipped: usize,
    /// Listing pages deleted because the listing got shorter
    pub pruned: usize,
}

impl BuildReport {
    pub fn summary(&self) -> String {
        format!(
            "{} written, {} unchanged, {} fresh, {} missing, {} skipped, {} pruned",
            self.written, self.unchanged, self.fresh, self.missing, self.skipped, self.pruned
        )
    }
}

/// Static site generator
pub struct Generator {
    source: Arc<dyn ContentSource>,
    renderer: TemplateRenderer,
    options: ViewOptions,
    site_data: SiteData,
    public_dir: PathBuf,
    page_size: usize,
    revalidate: Duration,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Site, source: Arc<dyn ContentSource>) -> Result<Self> {
        let options = ViewOptions::from_config(&site.config)?;
        Ok(Self {
            source,
            renderer: TemplateRenderer::new()?,
            site_data: SiteData::new(&site.config.title, &options),
            options,
            public_dir: site.public_dir.clone(),
            page_size: site.config.page_size.max(1),
            revalidate: site.config.revalidate(),
        })
    }

    pub fn source(&self) -> &dyn ContentSource {
        self.source.as_ref()
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn revalidate(&self) -> Duration {
        self.revalidate
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    /// Absolute output path of a route
    pub fn route_path(&self, route: &str) -> PathBuf {
        self.public_dir.join(route_file(route))
    }

    pub fn route_exists(&self, route: &str) -> bool {
        self.route_path(route).is_file()
    }

    /// Render the home page plus one JSON document per following listing page
    pub async fn generate_index(&self) -> Result<Vec<RenderedRoute>, GenerateError> {
        let props = listing_props(self.source(), self.page_size, self.revalidate).await?;
        let first_cards = cards(&props.props, &self.options);
        let html = self.renderer.render_index(
            &self.site_data,
            &first_cards.results,
            first_cards.next_page_cursor.as_deref(),
        )?;
        let mut routes = vec![RenderedRoute::new(INDEX_ROUTE.to_string(), html)];

        // Walk the rest of the listing the way the "load more" button does
        let mut listing = Listing::from_page(props.props);
        while let Some(cursor) = listing.begin_load() {
            if !is_path_safe(&cursor) {
                tracing::warn!("Cursor {:?} is not path safe, stopping listing export", cursor);
                break;
            }
            let page = self
                .source
                .fetch_page(self.page_size, Some(&cursor))
                .await
                .map_err(|e| {
                    listing.fail_load(&e);
                    e
                })?;
            let body = serde_json::to_string(&cards(&page, &self.options))?;
            routes.push(RenderedRoute::new(listing_page_route(&cursor), body));
            listing.finish_load(page);
        }

        tracing::debug!(
            "Rendered index with {} posts across {} pages",
            listing.posts().len(),
            routes.len()
        );
        Ok(routes)
    }

    /// Render one post page
    pub async fn generate_post(&self, uid: &str) -> Result<RenderedRoute, GenerateError> {
        let props = detail_props(self.source(), uid, self.revalidate).await?;
        let view = DetailView::from_post(&props.props.post, &self.options);
        let html = self.render_detail(&DetailState::Ready(view))?;
        Ok(RenderedRoute::new(post_route(uid), html))
    }

    /// JSON body of a "load more" request
    pub async fn listing_page_json(&self, after: Option<&str>) -> Result<String, GenerateError> {
        let page = self.source.fetch_page(self.page_size, after).await?;
        Ok(serde_json::to_string(&cards(&page, &self.options))?)
    }

    /// HTML of a post route in the given state
    pub fn render_detail(&self, state: &DetailState) -> Result<String, GenerateError> {
        let html = match state {
            DetailState::Fallback => self.renderer.render_fallback(&self.site_data)?,
            DetailState::Ready(view) => self.renderer.render_post(&self.site_data, view)?,
            DetailState::NotFound => self.renderer.render_not_found(&self.site_data)?,
        };
        Ok(html)
    }

    /// Write a rendered route if its output changed and record it
    pub fn publish(
        &self,
        rendered: &RenderedRoute,
        cache: &mut RevalidationCache,
        now: u64,
    ) -> io::Result<bool> {
        let path = self.route_path(&rendered.route);
        let changed = cache.record(&rendered.route, rendered.hash, now) || !path.is_file();
        if changed {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &rendered.body)?;
            tracing::debug!("Wrote {:?}", path);
        }
        Ok(changed)
    }

    /// Delete the output of a route the source no longer has
    pub fn remove_route(&self, route: &str) -> io::Result<()> {
        let path = self.route_path(route);
        if path.is_file() {
            fs::remove_file(&path)?;
            tracing::info!("Deleted: {:?}", path);
        }
        Ok(())
    }

    /// Delete listing pages that are not part of the freshly rendered `routes`
    pub fn prune_listing_pages(
        &self,
        routes: &[RenderedRoute],
        cache: &mut RevalidationCache,
    ) -> io::Result<usize> {
        let dir = self.public_dir.join(LISTING_PAGE_DIR);
        if !dir.is_dir() {
            return Ok(0);
        }

        let keep: HashSet<&str> = routes.iter().map(|r| r.route.as_str()).collect();
        let mut removed = 0;
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let Some(cursor) = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| name.strip_suffix(".json"))
            else {
                continue;
            };

            let route = listing_page_route(cursor);
            if keep.contains(route.as_str()) {
                continue;
            }
            fs::remove_file(&path)?;
            cache.forget(&route);
            tracing::info!("Deleted: {:?}", path);
            removed += 1;
        }
        Ok(removed)
    }

    /// Generate every stale route; `force` regenerates fresh ones too
    pub async fn build(
        &self,
        cache: &mut RevalidationCache,
        force: bool,
        now: u64,
    ) -> Result<BuildReport, GenerateError> {
        fs::create_dir_all(&self.public_dir)?;
        let mut report = BuildReport::default();

        let not_found = RenderedRoute::new(
            NOT_FOUND_ROUTE.to_string(),
            self.render_detail(&DetailState::NotFound)?,
        );
        self.tally(self.publish(&not_found, cache, now)?, &mut report);

        if force || self.needs_generation(INDEX_ROUTE, cache, now) {
            let routes = self.generate_index().await?;
            for rendered in &routes {
                self.tally(self.publish(rendered, cache, now)?, &mut report);
            }
            report.pruned = self.prune_listing_pages(&routes, cache)?;
        } else {
            report.fresh += 1;
        }

        let paths = static_paths(self.source()).await?;
        tracing::info!("Found {} posts", paths.keys.len());

        for uid in &paths.keys {
            if !is_path_safe(uid) {
                tracing::warn!("Skipping post with unsafe uid {:?}", uid);
                report.skipped += 1;
                continue;
            }

            let route = post_route(uid);
            if !force && !self.needs_generation(&route, cache, now) {
                report.fresh += 1;
                continue;
            }

            match self.generate_post(uid).await {
                Ok(rendered) => self.tally(self.publish(&rendered, cache, now)?, &mut report),
                Err(GenerateError::NotFound(uid)) => {
                    tracing::warn!("Post {} disappeared while generating", uid);
                    self.remove_route(&route)?;
                    cache.record_missing(&route, now);
                    report.missing += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }

    /// Missing output or an expired record
    pub fn needs_generation(&self, route: &str, cache: &RevalidationCache, now: u64) -> bool {
        !self.route_exists(route) || cache.is_stale(route, now, self.revalidate)
    }

    fn tally(&self, written: bool, report: &mut BuildReport) {
        if written {
            report.written += 1;
        } else {
            report.unchanged += 1;
        }
    }
}
