//! spacetraveling: a static blog generator backed by a headless CMS
//!
//! Posts live in a Prismic repository. The home page lists them with
//! cursor pagination and each post gets its own page with a reading-time
//! estimate. Pages are generated ahead of time and refreshed once they are
//! older than the revalidation interval.

pub mod api;
pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod detail;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod listing;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use api::{ContentSource, MemorySource, PrismicClient};

/// A site rooted at a base directory
#[derive(Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Site {
    /// Load `_config.yml` from a directory, applying environment overrides
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No _config.yml in {:?}, using defaults", base_dir);
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Build a site from an already loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);
        Self {
            config,
            base_dir,
            public_dir,
        }
    }

    /// The content source: a fixture file when given, the CMS otherwise
    pub fn content_source(&self, fixtures: Option<&Path>) -> Result<Arc<dyn ContentSource>> {
        match fixtures {
            Some(path) => {
                let path = if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    self.base_dir.join(path)
                };
                Ok(Arc::new(MemorySource::load(path)?))
            }
            None => Ok(Arc::new(PrismicClient::from_config(&self.config)?)),
        }
    }

    /// Create a generator reading from `source`
    pub fn generator(&self, source: Arc<dyn ContentSource>) -> Result<generator::Generator> {
        generator::Generator::new(self, source)
    }

    /// Directory holding the revalidation record
    pub fn cache_dir(&self) -> PathBuf {
        self.base_dir.join(cache::CACHE_DIR)
    }

    /// Clean the public directory and the revalidation record
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
