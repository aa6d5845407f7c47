//! Ant-style path patterns (`*`, `**`, `?`) with `%regex[...]` escapes.

use std::fmt;

use globset::{GlobBuilder, GlobMatcher};
use regex::Regex;

use crate::error::ArchiveError;

const REGEX_PREFIX: &str = "%regex[";
const ANT_PREFIX: &str = "%ant[";

/// Patterns no shaded archive should carry: index and signature files, and module descriptors.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "META-INF/INDEX.LIST",
    "META-INF/*.SF",
    "META-INF/*.DSA",
    "META-INF/*.RSA",
    "module-info.class",
    "META-INF/versions/*/module-info.class",
];

#[derive(Clone)]
pub struct PathPattern {
    source: String,
    kind: Kind,
}

#[derive(Clone)]
enum Kind {
    Glob {
        matcher: GlobMatcher,
        /// `foo/**` also matches `foo` itself.
        directory: Option<String>,
    },
    Regex(Regex),
}

impl PathPattern {
    pub fn new(pattern: &str) -> Result<Self, ArchiveError> {
        let invalid = |message: String| ArchiveError::InvalidPattern {
            pattern: pattern.to_string(),
            message,
        };

        if let Some(inner) = strip_wrapped(pattern, REGEX_PREFIX) {
            let regex = Regex::new(&format!("^(?:{inner})$")).map_err(|e| invalid(e.to_string()))?;
            return Ok(Self {
                source: pattern.to_string(),
                kind: Kind::Regex(regex),
            });
        }

        let ant = strip_wrapped(pattern, ANT_PREFIX).unwrap_or(pattern);
        let mut glob = ant.trim_start_matches('/').to_string();
        if glob.ends_with('/') {
            glob.push_str("**");
        }
        let directory = glob.strip_suffix("/**").map(str::to_string);
        let matcher = GlobBuilder::new(&glob)
            .literal_separator(true)
            .backslash_escape(false)
            .build()
            .map_err(|e| invalid(e.to_string()))?
            .compile_matcher();

        Ok(Self {
            source: pattern.to_string(),
            kind: Kind::Glob { matcher, directory },
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, path: &str) -> bool {
        match &self.kind {
            Kind::Regex(regex) => regex.is_match(path),
            Kind::Glob { matcher, directory } => {
                let path = path.trim_start_matches('/');
                matcher.is_match(path) || directory.as_deref() == Some(path)
            }
        }
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathPattern").field(&self.source).finish()
    }
}

impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

fn strip_wrapped<'a>(pattern: &'a str, prefix: &str) -> Option<&'a str> {
    pattern.strip_prefix(prefix)?.strip_suffix(']')
}

/// Include/exclude path filter applied to every source entry.
///
/// A path passes when no include is configured or one include matches, and
/// no exclude matches.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    includes: Vec<PathPattern>,
    excludes: Vec<PathPattern>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set pre-populated with [`DEFAULT_EXCLUDES`].
    pub fn with_default_excludes() -> Self {
        let excludes = DEFAULT_EXCLUDES
            .iter()
            .filter_map(|p| PathPattern::new(p).ok())
            .collect();
        Self {
            includes: Vec::new(),
            excludes,
        }
    }

    pub fn include(&mut self, pattern: &str) -> Result<&mut Self, ArchiveError> {
        self.includes.push(PathPattern::new(pattern)?);
        Ok(self)
    }

    pub fn exclude(&mut self, pattern: &str) -> Result<&mut Self, ArchiveError> {
        self.excludes.push(PathPattern::new(pattern)?);
        Ok(self)
    }

    /// Drops a previously added exclude, default excludes included.
    pub fn remove_exclude(&mut self, pattern: &str) -> bool {
        let before = self.excludes.len();
        self.excludes.retain(|p| p.as_str() != pattern);
        before != self.excludes.len()
    }

    pub fn includes(&self) -> &[PathPattern] {
        &self.includes
    }

    pub fn excludes(&self) -> &[PathPattern] {
        &self.excludes
    }

    pub fn is_included(&self, path: &str) -> bool {
        let included = self.includes.is_empty() || self.includes.iter().any(|p| p.matches(path));
        included && !self.excludes.iter().any(|p| p.matches(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ant_wildcards_respect_segments() {
        let star = PathPattern::new("META-INF/*.SF").unwrap();
        assert!(star.matches("META-INF/SIGNER.SF"));
        assert!(!star.matches("META-INF/sub/SIGNER.SF"));

        let deep = PathPattern::new("org/foo/**").unwrap();
        assert!(deep.matches("org/foo/a/b/C.class"));
        assert!(deep.matches("org/foo"));
        assert!(!deep.matches("org/foobar/C.class"));

        let single = PathPattern::new("a?c").unwrap();
        assert!(single.matches("abc"));
        assert!(!single.matches("a/c"));
    }

    #[test]
    fn regex_patterns_match_whole_path() {
        let pattern = PathPattern::new("%regex[org/foo/.*Impl]").unwrap();
        assert!(pattern.matches("org/foo/bar/BazImpl"));
        assert!(!pattern.matches("org/foo/bar/BazImpl2"));
        assert!(PathPattern::new("%regex[(]").is_err());
    }

    #[test]
    fn default_excludes_drop_signatures_and_module_descriptors() {
        let set = PatternSet::with_default_excludes();
        for path in [
            "META-INF/INDEX.LIST",
            "META-INF/a.SF",
            "META-INF/KEY.RSA",
            "module-info.class",
            "META-INF/versions/11/module-info.class",
        ] {
            assert!(!set.is_included(path), "{path} should be excluded");
        }
        assert!(set.is_included("org/foo/module-info.class"));
        assert!(set.is_included("META-INF/MANIFEST.MF"));
    }

    #[test]
    fn removing_a_default_exclude_lets_the_path_through() {
        let mut set = PatternSet::with_default_excludes();
        assert!(set.remove_exclude("module-info.class"));
        assert!(set.is_included("module-info.class"));
    }

    #[test]
    fn includes_narrow_the_set() {
        let mut set = PatternSet::new();
        set.include("org/**").unwrap().exclude("org/internal/**").unwrap();
        assert!(set.is_included("org/api/A.class"));
        assert!(!set.is_included("org/internal/B.class"));
        assert!(!set.is_included("com/C.class"));
    }
}
