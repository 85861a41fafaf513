//! Token protection for the free web backend.
//!
//! URLs, e-mail addresses, format placeholders and bare numbers come back
//! mangled from machine translation, so they are swapped for indexed
//! markers before sending and restored afterwards.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static PROTECTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"https?://\S+",
        r"|www\.\S+",
        r"|[\w.+-]+@[\w-]+(?:\.[\w-]+)+",
        r"|\{[^{}\s]*\}",
        r"|%(?:\d+\$)?[-+0#]*\d*(?:\.\d+)?[sdifuxXeEgGcp]",
        r"|\b\d+(?:[.,:/]\d+)*\b",
    ))
    .expect("protected token pattern is valid")
});

/// Translators sometimes insert spaces inside markers.
#[allow(clippy::expect_used)]
static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__\s*PH\s*(\d+)\s*__").expect("marker pattern is valid"));

/// Text with protected tokens replaced by `__PH<n>__` markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedText {
    pub text: String,
    tokens: Vec<String>,
}

impl ProtectedText {
    pub fn new(text: &str) -> Self {
        let mut tokens = Vec::new();
        let text = PROTECTED
            .replace_all(text, |caps: &regex::Captures<'_>| {
                tokens.push(caps[0].to_string());
                format!("__PH{}__", tokens.len() - 1)
            })
            .into_owned();
        Self { text, tokens }
    }

    pub fn has_tokens(&self) -> bool {
        !self.tokens.is_empty()
    }

    /// Put the original tokens back into a translated string.
    ///
    /// Markers the backend invented are left as they are.
    pub fn restore(&self, translated: &str) -> String {
        MARKER
            .replace_all(translated, |caps: &regex::Captures<'_>| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| self.tokens.get(i))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protects_and_restores() {
        let input = "Voir https://example.org/a?b=1 ou écrire à info@example.org, page 42.";
        let protected = ProtectedText::new(input);
        assert!(!protected.text.contains("example.org"));
        assert!(!protected.text.contains("42"));
        assert_eq!(protected.restore(&protected.text), input);
    }

    #[test]
    fn test_placeholders() {
        let protected = ProtectedText::new("Bonjour {name}, vous avez %d messages");
        assert_eq!(protected.text, "Bonjour __PH0__, vous avez __PH1__ messages");
    }

    #[test]
    fn test_restore_tolerates_spacing() {
        let protected = ProtectedText::new("Chapitre 7");
        assert_eq!(protected.restore("Chapter __ PH0 __"), "Chapter 7");
    }

    #[test]
    fn test_plain_text_untouched() {
        let protected = ProtectedText::new("Bonjour le monde");
        assert!(!protected.has_tokens());
        assert_eq!(protected.text, "Bonjour le monde");
    }

    #[test]
    fn test_unknown_marker_kept() {
        let protected = ProtectedText::new("sans jeton");
        assert_eq!(protected.restore("x __PH3__"), "x __PH3__");
    }
}
