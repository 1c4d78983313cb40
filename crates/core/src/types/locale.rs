//! Content locale for bilingual catalog text.

use serde::{Deserialize, Serialize};

/// Languages catalog content is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ar,
}

impl Locale {
    /// Pick the text for this locale, falling back to English when the
    /// Arabic translation is missing or blank.
    #[must_use]
    pub fn pick<'a>(self, en: &'a str, ar: Option<&'a str>) -> &'a str {
        match self {
            Self::Ar => ar.filter(|s| !s.trim().is_empty()).unwrap_or(en),
            Self::En => en,
        }
    }

    /// Resolve a locale from an `Accept-Language` header value.
    ///
    /// Only the primary tag of each entry is considered; quality weights are
    /// honored by order of appearance, which is what browsers send.
    #[must_use]
    pub fn from_accept_language(header: &str) -> Self {
        header
            .split(',')
            .filter_map(|entry| entry.split(';').next())
            .map(|tag| tag.trim().to_ascii_lowercase())
            .find_map(|tag| match tag.split('-').next() {
                Some("ar") => Some(Self::Ar),
                Some("en") => Some(Self::En),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Two-letter language code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ar => "ar",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_falls_back_to_english() {
        assert_eq!(Locale::Ar.pick("Rose", Some("وردة")), "وردة");
        assert_eq!(Locale::Ar.pick("Rose", Some("  ")), "Rose");
        assert_eq!(Locale::Ar.pick("Rose", None), "Rose");
        assert_eq!(Locale::En.pick("Rose", Some("وردة")), "Rose");
    }

    #[test]
    fn test_accept_language() {
        assert_eq!(Locale::from_accept_language("ar-SA,ar;q=0.9,en;q=0.8"), Locale::Ar);
        assert_eq!(Locale::from_accept_language("fr-FR, en-US;q=0.5"), Locale::En);
        assert_eq!(Locale::from_accept_language("de"), Locale::En);
        assert_eq!(Locale::from_accept_language(""), Locale::En);
    }
}
