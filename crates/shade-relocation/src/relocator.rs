use std::fmt;

use regex::Regex;
use shade_archive::PathPattern;

use crate::error::RelocationError;

/// A single renaming rule for class names and resource paths.
///
/// `can_*` predicates decide whether the rule applies; the `relocate_*`
/// operations are only called after the matching predicate said yes.
pub trait Relocator: fmt::Debug + Send + Sync {
    /// `path` is slash-separated, e.g. `org/foo/Bar.class` or `org/foo/res.txt`.
    fn can_relocate_path(&self, path: &str) -> bool;

    /// `class_name` is dot-separated, e.g. `org.foo.Bar`.
    fn can_relocate_class(&self, class_name: &str) -> bool;

    fn relocate_path(&self, path: &str) -> String;

    fn relocate_class(&self, class_name: &str) -> String;
}

/// Prefix-based relocator with optional include/exclude filters.
///
/// In raw mode the pattern is a regular expression applied to paths only.
#[derive(Clone)]
pub struct SimpleRelocator {
    pattern: String,
    path_pattern: String,
    shaded_pattern: String,
    shaded_path_pattern: String,
    raw: Option<Regex>,
    includes: Vec<PathPattern>,
    excludes: Vec<PathPattern>,
}

impl SimpleRelocator {
    /// Moves `pattern` (dotted or slashed) under `destination`, or under
    /// `hidden.<pattern>` when no destination is given.
    pub fn new(pattern: &str, destination: Option<&str>) -> Self {
        let dotted = pattern.replace('/', ".");
        let slashed = pattern.replace('.', "/");
        let (shaded_pattern, shaded_path_pattern) = match destination {
            Some(dest) => (dest.replace('/', "."), dest.replace('.', "/")),
            None => (format!("hidden.{dotted}"), format!("hidden/{slashed}")),
        };
        Self {
            pattern: dotted,
            path_pattern: slashed,
            shaded_pattern,
            shaded_path_pattern,
            raw: None,
            includes: Vec::new(),
            excludes: Vec::new(),
        }
    }

    /// A raw-string rule: `pattern` is searched in paths and every match is
    /// replaced by `replacement` (which may use `$n` group references).
    pub fn raw(pattern: &str, replacement: &str) -> Result<Self, RelocationError> {
        let regex = Regex::new(pattern).map_err(|source| RelocationError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            pattern: String::new(),
            path_pattern: pattern.to_string(),
            shaded_pattern: String::new(),
            shaded_path_pattern: replacement.to_string(),
            raw: Some(regex),
            includes: Vec::new(),
            excludes: Vec::new(),
        })
    }

    pub fn include(mut self, pattern: &str) -> Result<Self, RelocationError> {
        add_normalized(&mut self.includes, pattern)?;
        Ok(self)
    }

    pub fn exclude(mut self, pattern: &str) -> Result<Self, RelocationError> {
        add_normalized(&mut self.excludes, pattern)?;
        Ok(self)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn path_pattern(&self) -> &str {
        &self.path_pattern
    }

    pub fn shaded_pattern(&self) -> &str {
        &self.shaded_pattern
    }

    pub fn shaded_path_pattern(&self) -> &str {
        &self.shaded_path_pattern
    }

    pub fn is_raw(&self) -> bool {
        self.raw.is_some()
    }

    fn is_included(&self, path: &str) -> bool {
        self.includes.is_empty() || self.includes.iter().any(|p| p.matches(path))
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.excludes.iter().any(|p| p.matches(path))
    }
}

/// `org.foo.*` adds both `org/foo/*` and `org/foo`; `%regex[...]` is kept verbatim.
fn add_normalized(into: &mut Vec<PathPattern>, pattern: &str) -> Result<(), RelocationError> {
    let mut push = |p: &str| -> Result<(), RelocationError> {
        if !into.iter().any(|existing| existing.as_str() == p) {
            into.push(PathPattern::new(p)?);
        }
        Ok(())
    };

    if pattern.starts_with("%regex[") {
        return push(pattern);
    }
    let class_pattern = pattern.replace('.', "/");
    push(&class_pattern)?;
    if let Some(package) = class_pattern.strip_suffix("/*") {
        push(package)?;
    }
    Ok(())
}

impl Relocator for SimpleRelocator {
    fn can_relocate_path(&self, path: &str) -> bool {
        if let Some(raw) = &self.raw {
            return raw.is_match(path);
        }
        if path.len() < self.path_pattern.len() {
            return false;
        }
        let adjusted = match path.strip_suffix(".class") {
            Some("") => return false,
            Some(stem) => stem,
            None => path,
        };
        let unrooted = adjusted.strip_prefix('/').unwrap_or(adjusted);
        unrooted.starts_with(&self.path_pattern)
            && self.is_included(unrooted)
            && !self.is_excluded(unrooted)
    }

    fn can_relocate_class(&self, class_name: &str) -> bool {
        self.raw.is_none()
            && !class_name.contains('/')
            && self.can_relocate_path(&class_name.replace('.', "/"))
    }

    fn relocate_path(&self, path: &str) -> String {
        match &self.raw {
            Some(raw) => raw
                .replace_all(path, self.shaded_path_pattern.as_str())
                .into_owned(),
            None => path.replacen(&self.path_pattern, &self.shaded_path_pattern, 1),
        }
    }

    fn relocate_class(&self, class_name: &str) -> String {
        class_name.replacen(&self.pattern, &self.shaded_pattern, 1)
    }
}

impl fmt::Debug for SimpleRelocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("SimpleRelocator");
        s.field("pattern", &self.path_pattern)
            .field("destination", &self.shaded_path_pattern);
        if self.is_raw() {
            s.field("raw", &true);
        }
        if !self.includes.is_empty() {
            s.field("includes", &self.includes);
        }
        if !self.excludes.is_empty() {
            s.field("excludes", &self.excludes);
        }
        s.finish()
    }
}
