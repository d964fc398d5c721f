//! URL match patterns for capture registration.

// ============================================================================
// Imports
// ============================================================================

use regex::Regex;

use crate::error::{Error, Result};

// ============================================================================
// UrlPattern
// ============================================================================

/// A glob over full request URLs.
///
/// `*` matches any run of characters (including `/`); every other
/// character matches literally. `<all_urls>` matches everything. Patterns
/// are compiled once to an anchored regex at registration time.
///
/// # Example
///
/// ```
/// use danmaku_capture::UrlPattern;
///
/// let pattern = UrlPattern::parse("*://comment.example.com/*.xml").unwrap();
/// assert!(pattern.matches("https://comment.example.com/12345.xml"));
/// assert!(!pattern.matches("https://static.example.com/app.js"));
/// ```
#[derive(Debug, Clone)]
pub struct UrlPattern {
    raw: String,
    regex: Regex,
}

impl UrlPattern {
    /// Compiles a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`] for the empty pattern or a glob that
    /// fails to compile.
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::pattern(pattern, "pattern must not be empty"));
        }

        let source = if pattern == "<all_urls>" {
            "^.*$".to_string()
        } else {
            let mut source = String::with_capacity(pattern.len() + 8);
            source.push('^');
            for (index, part) in pattern.split('*').enumerate() {
                if index > 0 {
                    source.push_str(".*");
                }
                source.push_str(&regex::escape(part));
            }
            source.push('$');
            source
        };

        let regex =
            Regex::new(&source).map_err(|e| Error::pattern(pattern, e.to_string()))?;

        Ok(Self {
            raw: pattern.to_string(),
            regex,
        })
    }

    /// Returns `true` if `url` matches this pattern.
    #[inline]
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }

    /// The pattern as written.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

// ============================================================================
// PatternSet
// ============================================================================

/// A set of [`UrlPattern`]s; a URL matches the set if any pattern matches.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<UrlPattern>,
}

impl PatternSet {
    /// Compiles a set of patterns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`] on the first pattern that fails to
    /// compile, or [`Error::Config`] for an empty set (it would match
    /// nothing and capture nothing, which is always a wiring mistake).
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| UrlPattern::parse(pattern.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        if patterns.is_empty() {
            return Err(Error::config("pattern set must not be empty"));
        }

        Ok(Self { patterns })
    }

    /// Returns `true` if any pattern matches `url`.
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(url))
    }

    /// Number of patterns in the set.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns `true` if the set has no patterns.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
