//! Display strings for the handful of phrases the board renders.

/// Supported display languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Sv,
}

impl Locale {
    /// Parse a locale tag; anything unrecognized is `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "en" => Some(Self::En),
            "sv" => Some(Self::Sv),
            _ => None,
        }
    }

    pub fn departs_now(self) -> &'static str {
        match self {
            Self::En => "now",
            Self::Sv => "nu",
        }
    }

    pub fn one_minute(self) -> &'static str {
        "1 min"
    }

    pub fn minutes(self, mins: i64) -> String {
        format!("{mins} min")
    }

    pub fn no_departures(self) -> &'static str {
        match self {
            Self::En => "no departures",
            Self::Sv => "inga avgångar",
        }
    }

    pub fn unknown(self) -> &'static str {
        match self {
            Self::En => "unknown",
            Self::Sv => "okänd",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_recognizes_tags() {
        assert_eq!(Locale::parse("en"), Some(Locale::En));
        assert_eq!(Locale::parse(" SV "), Some(Locale::Sv));
        assert_eq!(Locale::parse("de"), None);
        assert_eq!(Locale::parse(""), None);
    }

    #[test]
    fn swedish_strings() {
        assert_eq!(Locale::Sv.departs_now(), "nu");
        assert_eq!(Locale::Sv.no_departures(), "inga avgångar");
        assert_eq!(Locale::Sv.minutes(7), "7 min");
    }
}
