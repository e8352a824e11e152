//! Title matcher for SOW-style identifiers.
//!
//! Grammar, matched case-insensitively at the leftmost position in a title:
//!
//! ```text
//! match      := prefix? label separator* identifier
//! prefix     := "CHR_"
//! label      := "SOW"
//! separator  := "_" | "#" | whitespace
//! identifier := ( digit | "X" )+
//! ```
//!
//! `X` is the placeholder used in titles like `SOW#1X` or `SOW_XX`.

/// Result of a successful match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleMatch<'a> {
    /// Byte offset where the match starts (prefix included)
    pub start: usize,
    /// Whether the optional prefix was present
    pub prefixed: bool,
    /// The identifier exactly as written in the title
    pub identifier: &'a str,
}

impl TitleMatch<'_> {
    /// Canonical group key, e.g. `SOW#12X`
    pub fn key(&self, label: &str) -> String {
        format!("{}#{}", label, self.identifier.to_ascii_uppercase())
    }
}

/// Scanner for `prefix? label separator* identifier`
#[derive(Debug, Clone, Copy)]
pub struct TitleMatcher {
    prefix: &'static str,
    label: &'static str,
}

impl Default for TitleMatcher {
    fn default() -> Self {
        Self::sow()
    }
}

impl TitleMatcher {
    /// Matcher for `CHR_SOW#<id>` and its looser spellings
    pub const fn sow() -> Self {
        Self {
            prefix: "CHR_",
            label: "SOW",
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Find the leftmost match in `title`
    pub fn find<'a>(&self, title: &'a str) -> Option<TitleMatch<'a>> {
        title
            .char_indices()
            .find_map(|(start, _)| self.match_at(title, start))
    }

    fn match_at<'a>(&self, title: &'a str, start: usize) -> Option<TitleMatch<'a>> {
        if starts_with_ignore_case(title, start, self.prefix) {
            let after_prefix = start + self.prefix.len();
            if let Some(identifier) = self.label_then_identifier(title, after_prefix) {
                return Some(TitleMatch {
                    start,
                    prefixed: true,
                    identifier,
                });
            }
        }

        self.label_then_identifier(title, start)
            .map(|identifier| TitleMatch {
                start,
                prefixed: false,
                identifier,
            })
    }

    fn label_then_identifier<'a>(&self, title: &'a str, pos: usize) -> Option<&'a str> {
        if !starts_with_ignore_case(title, pos, self.label) {
            return None;
        }
        let rest = &title[pos + self.label.len()..];
        let rest = rest.trim_start_matches(is_separator);
        let len = rest
            .find(|c: char| !is_identifier_char(c))
            .unwrap_or(rest.len());
        (len > 0).then(|| &rest[..len])
    }
}

fn starts_with_ignore_case(haystack: &str, pos: usize, needle: &str) -> bool {
    haystack
        .get(pos..pos + needle.len())
        .is_some_and(|window| window.eq_ignore_ascii_case(needle))
}

fn is_separator(c: char) -> bool {
    c == '_' || c == '#' || c.is_whitespace()
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_digit() || c == 'x' || c == 'X'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identifier(title: &str) -> Option<&str> {
        TitleMatcher::sow().find(title).map(|m| m.identifier)
    }

    #[test]
    fn test_prefixed_and_bare_labels() {
        let matcher = TitleMatcher::sow();

        let m = matcher.find("CHR_SOW#1 Intro").unwrap();
        assert!(m.prefixed);
        assert_eq!(m.start, 0);
        assert_eq!(m.identifier, "1");

        let m = matcher.find("Appendix to SOW#12").unwrap();
        assert!(!m.prefixed);
        assert_eq!(m.start, 12);
        assert_eq!(m.identifier, "12");
    }

    #[test]
    fn test_separators() {
        assert_eq!(identifier("SOW 3"), Some("3"));
        assert_eq!(identifier("SOW_4"), Some("4"));
        assert_eq!(identifier("SOW# _#5"), Some("5"));
        assert_eq!(identifier("SOW\t6"), Some("6"));
        assert_eq!(identifier("SOW7"), Some("7"));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(identifier("chr_sow#2 draft"), Some("2"));
        assert_eq!(identifier("Sow 9"), Some("9"));
        let m = TitleMatcher::sow().find("chr_SoW 10").unwrap();
        assert!(m.prefixed);
    }

    #[test]
    fn test_placeholder_identifier() {
        assert_eq!(identifier("SOW#XX template"), Some("XX"));
        assert_eq!(identifier("SOW#1x"), Some("1x"));
        let m = TitleMatcher::sow().find("sow#1x").unwrap();
        assert_eq!(m.key("SOW"), "SOW#1X");
    }

    #[test]
    fn test_identifier_stops_at_other_chars() {
        assert_eq!(identifier("SOW#12a"), Some("12"));
        assert_eq!(identifier("SOW#3-final"), Some("3"));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(identifier(""), None);
        assert_eq!(identifier("Random Doc"), None);
        assert_eq!(identifier("SOW documents"), None);
        assert_eq!(identifier("SOW#"), None);
        assert_eq!(identifier("CHR_ only"), None);
    }

    #[test]
    fn test_leftmost_match_wins() {
        assert_eq!(identifier("SOW overview then SOW#8 and SOW#9"), Some("8"));
        assert_eq!(identifier("Meeting notes: sow 2, sow 3"), Some("2"));
    }

    #[test]
    fn test_multibyte_titles() {
        assert_eq!(identifier("Über SOW#4 – Anhang"), Some("4"));
        assert_eq!(identifier("日本語のタイトル"), None);
    }
}
