use regex::Regex;
use url::Url;

use crate::config::FetchConfig;
use crate::error::Result;

/// Verdict for one outgoing sub-resource request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDecision {
    /// Let the request through.
    Allow,
    /// Abort the request before it leaves the session.
    Abort,
}

impl RequestDecision {
    pub fn is_abort(&self) -> bool {
        matches!(self, RequestDecision::Abort)
    }
}

/// Per-session sub-resource policy.
///
/// Blocks non-essential resource classes (images, fonts, stylesheets) and
/// known tracking hosts to cut latency and bandwidth during navigation.
/// Rules are evaluated in order, first match wins:
/// 1. blocked file extensions
/// 2. blocked host patterns
/// 3. allow
///
/// Stateless once built; `decide` has no side effects.
#[derive(Debug)]
pub struct RequestFilter {
    extension_regex: Regex,
    host_regexes: Vec<Regex>,
}

impl RequestFilter {
    /// Compile a filter from extension and host-pattern lists.
    pub fn new(extensions: &[String], host_patterns: &[String]) -> Result<Self> {
        // Anchor extensions to the end of the path, tolerating a query
        // string or fragment after the extension.
        let joined = extensions
            .iter()
            .map(|e| regex::escape(e))
            .collect::<Vec<_>>()
            .join("|");
        let extension_regex = Regex::new(&format!(r"(?i)\.({joined})([?#].*)?$"))?;

        let mut host_regexes = Vec::with_capacity(host_patterns.len());
        for pattern in host_patterns {
            host_regexes.push(Regex::new(pattern)?);
        }

        Ok(Self {
            extension_regex,
            host_regexes,
        })
    }

    /// Build the filter configured for a batch.
    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        Self::new(&config.blocked_extensions, &config.blocked_host_patterns)
    }

    /// Decide whether a sub-resource request may proceed.
    pub fn decide(&self, request_url: &str) -> RequestDecision {
        let (path, host) = match Url::parse(request_url) {
            Ok(url) => (
                url.path().to_string(),
                url.host_str().unwrap_or("").to_string(),
            ),
            // Not a parseable absolute URL; match the raw string.
            Err(_) => (request_url.to_string(), request_url.to_string()),
        };

        if self.extension_regex.is_match(&path) {
            return RequestDecision::Abort;
        }

        for regex in &self.host_regexes {
            if regex.is_match(&host) {
                return RequestDecision::Abort;
            }
        }

        RequestDecision::Allow
    }
}

impl Default for RequestFilter {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default()).expect("default patterns are valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_asset_extensions() {
        let filter = RequestFilter::default();
        for url in [
            "https://example.com/theme/site.css",
            "https://example.com/logo.svg",
            "https://cdn.example.com/fonts/inter.woff2",
            "https://example.com/hero.jpg?width=1200",
        ] {
            assert!(filter.decide(url).is_abort(), "expected abort for {url}");
        }
    }

    #[test]
    fn test_blocks_tracker_hosts() {
        let filter = RequestFilter::default();
        for url in [
            "https://www.google-analytics.com/collect?v=1",
            "https://www.googletagmanager.com/gtm.js",
            "https://stats.doubleclick.net/r/collect",
        ] {
            assert!(filter.decide(url).is_abort(), "expected abort for {url}");
        }
    }

    #[test]
    fn test_allows_page_requests() {
        let filter = RequestFilter::default();
        for url in [
            "https://example.com/",
            "https://example.com/docs/page.html",
            "https://example.com/api/data.json",
            "https://example.com/report.pdf",
        ] {
            assert_eq!(filter.decide(url), RequestDecision::Allow);
        }
    }

    #[test]
    fn test_extension_must_terminate_path() {
        let filter = RequestFilter::default();
        // ".css" embedded mid-path is not an asset request.
        assert_eq!(
            filter.decide("https://example.com/blog/why-we-dropped.css-in-js"),
            RequestDecision::Allow
        );
    }

    #[test]
    fn test_custom_patterns() {
        let filter = RequestFilter::new(
            &["mp4".to_string()],
            &[r"ads\.".to_string()],
        )
        .unwrap();
        assert!(filter.decide("https://example.com/clip.mp4").is_abort());
        assert!(filter.decide("https://ads.example.com/pixel").is_abort());
        assert_eq!(
            filter.decide("https://example.com/style.css"),
            RequestDecision::Allow
        );
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let result = RequestFilter::new(&[], &["(unclosed".to_string()]);
        assert!(result.is_err());
    }
}
