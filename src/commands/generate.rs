//! Generate static files

use anyhow::Result;
use std::sync::Arc;

use crate::api::ContentSource;
use crate::cache::{unix_now, RevalidationCache};
use crate::generator::BuildReport;
use crate::Site;

/// Generate every stale route (all routes with `force`)
pub async fn run(site: &Site, source: Arc<dyn ContentSource>, force: bool) -> Result<BuildReport> {
    let start = std::time::Instant::now();

    let generator = site.generator(source)?;
    let mut cache = RevalidationCache::load(&site.base_dir);

    if force || cache.is_empty() {
        tracing::info!(
            "Full generation (force={}, cache_empty={})",
            force,
            cache.is_empty()
        );
    }

    let result = generator.build(&mut cache, force, unix_now()).await;

    // Keep whatever was recorded before a failure
    cache.save(&site.base_dir)?;
    let report = result?;

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s: {}", duration.as_secs_f64(), report.summary());

    Ok(report)
}
