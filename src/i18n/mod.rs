//! Internationalization (i18n) support
//!
//! Built-in locale tables used when formatting dates and labelling the
//! generated pages. Only the locales the site actually ships with are
//! listed here; unknown codes fall back to Brazilian Portuguese.

use serde::Serialize;

/// A locale table: month abbreviations plus the UI strings the pages use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    /// BCP 47 language tag, e.g. "pt-BR"
    pub code: &'static str,
    /// Capitalized abbreviated month names, January first
    pub months_short: [&'static str; 12],
    /// Interface labels
    pub labels: Labels,
}

/// Text shown by the listing and detail pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Labels {
    pub load_more: &'static str,
    pub loading: &'static str,
    pub load_failed: &'static str,
    pub not_found: &'static str,
    pub back_home: &'static str,
}

pub const PT_BR: Locale = Locale {
    code: "pt-BR",
    months_short: [
        "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
    ],
    labels: Labels {
        load_more: "Carregar mais posts",
        loading: "Carregando...",
        load_failed: "Não foi possível carregar mais posts. Tente novamente.",
        not_found: "Post não encontrado",
        back_home: "Voltar para o início",
    },
};

pub const EN: Locale = Locale {
    code: "en",
    months_short: [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ],
    labels: Labels {
        load_more: "Load more posts",
        loading: "Loading...",
        load_failed: "Could not load more posts. Please try again.",
        not_found: "Post not found",
        back_home: "Back to home",
    },
};

static LOCALES: [&Locale; 2] = [&PT_BR, &EN];

impl Locale {
    /// Look up a locale by language tag.
    ///
    /// Matching is case-insensitive and accepts `_` in place of `-`. A bare
    /// language ("pt", "en-US") matches the first table with that language.
    pub fn from_code(code: &str) -> &'static Locale {
        let wanted = code.trim().replace('_', "-").to_ascii_lowercase();

        if let Some(locale) = LOCALES
            .iter()
            .find(|l| l.code.to_ascii_lowercase() == wanted)
        {
            return *locale;
        }

        let language = wanted.split('-').next().unwrap_or_default();
        LOCALES
            .iter()
            .find(|l| l.code.to_ascii_lowercase().split('-').next() == Some(language))
            .copied()
            .unwrap_or(&PT_BR)
    }

    /// Abbreviated month name for a 1-based month number
    pub fn month_abbr(&self, month: u32) -> &'static str {
        match month {
            1..=12 => self.months_short[(month - 1) as usize],
            _ => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_lookup() {
        assert_eq!(Locale::from_code("pt-BR").code, "pt-BR");
        assert_eq!(Locale::from_code("pt_br").code, "pt-BR");
        assert_eq!(Locale::from_code("en").code, "en");
    }

    #[test]
    fn test_language_fallback() {
        assert_eq!(Locale::from_code("en-US").code, "en");
        assert_eq!(Locale::from_code("pt").code, "pt-BR");
        assert_eq!(Locale::from_code("fr-FR").code, "pt-BR");
    }

    #[test]
    fn test_month_abbr() {
        assert_eq!(PT_BR.month_abbr(4), "Abr");
        assert_eq!(PT_BR.month_abbr(12), "Dez");
        assert_eq!(EN.month_abbr(5), "May");
        assert_eq!(EN.month_abbr(0), "");
        assert_eq!(EN.month_abbr(13), "");
    }
}
