//! Message routing.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s]+").expect("URL pattern is a valid regex"));

/// Where a chat message is answered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Open the page in a browser and ask a vision model.
    Browse(Url),
    /// Answer from the knowledge base with a text model.
    Retrieve,
}

impl Route {
    /// Picks the route for `message`.
    #[must_use]
    pub fn of(message: &str) -> Self {
        extract_url(message).map_or(Self::Retrieve, Self::Browse)
    }
}

/// Returns the first `http` or `https` URL in `text`.
///
/// Sentence punctuation stuck to the end of the link is dropped. A candidate that does not
/// parse is skipped in favor of the next one.
#[must_use]
pub fn extract_url(text: &str) -> Option<Url> {
    URL_PATTERN.find_iter(text).find_map(|m| {
        let candidate = m
            .as_str()
            .trim_end_matches(['.', ',', ';', ':', '!', '?', ')', ']', '"', '\'']);
        Url::parse(candidate).ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_url() {
        let url = extract_url("go to https://example.com and find the price").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");

        let url = extract_url("compare http://a.test/x with https://b.test/y").unwrap();
        assert_eq!(url.as_str(), "http://a.test/x");
    }

    #[test]
    fn trims_trailing_punctuation() {
        let url = extract_url("What's on https://example.com/pricing?").unwrap();
        assert_eq!(url.as_str(), "https://example.com/pricing");

        let url = extract_url("(see https://example.com/a?b=1).").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a?b=1");
    }

    #[test]
    fn no_url_means_retrieve() {
        assert_eq!(Route::of("What is the price?"), Route::Retrieve);
        assert_eq!(Route::of("ftp://example.com"), Route::Retrieve);
        assert!(matches!(Route::of("open https://example.com"), Route::Browse(_)));
    }
}
