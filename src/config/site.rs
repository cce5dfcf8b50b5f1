//! Site configuration (_config.yml)

use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding `api_endpoint`
pub const ENV_API_ENDPOINT: &str = "PRISMIC_API_ENDPOINT";
/// Environment variable overriding `access_token`
pub const ENV_ACCESS_TOKEN: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub language: String,
    pub timezone: String,

    // Content API
    pub api_endpoint: Option<String>,
    pub access_token: Option<String>,
    pub document_type: String,

    // Generation
    pub page_size: usize,
    pub revalidate_secs: u64,

    // Directory
    pub public_dir: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            language: "pt-BR".to_string(),
            timezone: "UTC".to_string(),

            api_endpoint: None,
            access_token: None,
            document_type: "post-id".to_string(),

            page_size: 1,
            revalidate_secs: 60 * 60 * 24,

            public_dir: "public".to_string(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `PRISMIC_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_API_ENDPOINT).ok(),
            std::env::var(ENV_ACCESS_TOKEN).ok(),
        );
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, token: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|v| !v.trim().is_empty()) {
            tracing::debug!("api_endpoint overridden by {}", ENV_API_ENDPOINT);
            self.api_endpoint = Some(endpoint);
        }
        if let Some(token) = token.filter(|v| !v.trim().is_empty()) {
            tracing::debug!("access_token overridden by {}", ENV_ACCESS_TOKEN);
            self.access_token = Some(token);
        }
    }

    /// How long a generated route stays fresh
    pub fn revalidate(&self) -> Duration {
        Duration::from_secs(self.revalidate_secs)
    }

    /// Time zone used to pick the calendar day of a timestamp
    pub fn time_zone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("invalid timezone {:?}: {}", self.timezone, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "spacetraveling");
        assert_eq!(config.page_size, 1);
        assert_eq!(config.revalidate(), Duration::from_secs(86400));
        assert_eq!(config.document_type, "post-id");
        assert!(config.api_endpoint.is_none());
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
language: en
timezone: America/Sao_Paulo
api_endpoint: https://example.cdn.prismic.io/api/v2
page_size: 5
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.language, "en");
        assert_eq!(config.page_size, 5);
        assert_eq!(
            config.api_endpoint.as_deref(),
            Some("https://example.cdn.prismic.io/api/v2")
        );
        assert_eq!(config.revalidate_secs, 86400);
        assert_eq!(config.time_zone().unwrap().name(), "America/Sao_Paulo");
    }

    #[test]
    fn test_invalid_timezone() {
        let config = SiteConfig {
            timezone: "Mars/Olympus".to_string(),
            ..SiteConfig::default()
        };
        assert!(config.time_zone().is_err());
    }

    #[test]
    fn test_overrides_ignore_blank_values() {
        let mut config = SiteConfig {
            api_endpoint: Some("https://a.example/api/v2".to_string()),
            ..SiteConfig::default()
        };
        config.apply_overrides(Some("  ".to_string()), Some("secret".to_string()));
        assert_eq!(config.api_endpoint.as_deref(), Some("https://a.example/api/v2"));
        assert_eq!(config.access_token.as_deref(), Some("secret"));
    }
}
