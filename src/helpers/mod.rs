//! Formatting helpers shared by the listing and detail pages
//!
//! Both helpers are pure: the same input always gives the same output and
//! nothing outside the arguments is read.

mod date;
mod reading;

use anyhow::Result;
use chrono_tz::Tz;

pub use date::*;
pub use reading::*;

use crate::config::SiteConfig;
use crate::i18n::{Locale, PT_BR};

/// Locale and time zone applied when building page views
#[derive(Debug, Clone, Copy)]
pub struct ViewOptions {
    pub locale: &'static Locale,
    pub tz: Tz,
}

impl ViewOptions {
    /// Build options from the site configuration
    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        Ok(Self {
            locale: Locale::from_code(&config.language),
            tz: config.time_zone()?,
        })
    }

    /// Format a raw timestamp with these options
    pub fn date(&self, raw: &str) -> String {
        format_date_with(raw, self.locale, self.tz)
    }
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            locale: &PT_BR,
            tz: Tz::UTC,
        }
    }
}
