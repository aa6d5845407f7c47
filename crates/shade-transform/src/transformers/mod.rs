mod components;
mod deduplicating;
mod groovy;
mod license;
mod manifest;
mod notice;
mod properties;
mod service_file;
mod simple;
mod spring;
mod xml_appending;

pub use components::ComponentsXmlResourceTransformer;
pub use deduplicating::DeduplicatingResourceTransformer;
pub use groovy::GroovyExtensionModuleTransformer;
pub use license::{ApacheLicenseResourceTransformer, MergeLicenseResourceTransformer};
pub use manifest::{ManifestAppenderTransformer, ManifestResourceTransformer};
pub use notice::ApacheNoticeResourceTransformer;
pub use properties::{MergeStrategy, PathMapping, PropertiesFileTransformer};
pub use service_file::ServiceFileTransformer;
pub use simple::{
    AppendingTransformer, DontIncludeResourceTransformer, IncludeResourceTransformer,
    PreserveFirstFoundResourceTransformer,
};
pub use spring::SpringFileTransformer;
pub use xml_appending::XmlAppendingTransformer;

use shade_archive::PatternSet;

/// Pattern set for built-in defaults, which are known to be valid.
fn builtin_patterns(includes: &[&str], excludes: &[&str]) -> PatternSet {
    let mut set = PatternSet::new();
    for pattern in includes {
        set.include(pattern).expect("built-in include should compile");
    }
    for pattern in excludes {
        set.exclude(pattern).expect("built-in exclude should compile");
    }
    set
}

/// Splits on `\n`, `\r\n` or `\r`, without a trailing empty line.
fn text_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        match rest.find(['\n', '\r']) {
            Some(end) => {
                lines.push(&rest[..end]);
                let skip = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[end + skip..];
            }
            None => {
                lines.push(rest);
                break;
            }
        }
    }
    lines
}

/// Output entries keyed by path, in first-seen order.
#[derive(Debug, Default, Clone)]
struct PathMap<T> {
    entries: Vec<(String, T)>,
}

impl<T> PathMap<T> {
    fn get_mut(&mut self, path: &str) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find(|(p, _)| p == path)
            .map(|(_, v)| v)
    }

    fn get_or_insert_with(&mut self, path: &str, default: impl FnOnce() -> T) -> &mut T {
        let index = match self.entries.iter().position(|(p, _)| p == path) {
            Some(index) => index,
            None => {
                self.entries.push((path.to_string(), default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn drain(&mut self) -> std::vec::Drain<'_, (String, T)> {
        self.entries.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_all_line_endings() {
        assert_eq!(text_lines("a\nb\r\nc\rd"), vec!["a", "b", "c", "d"]);
        assert_eq!(text_lines("a\n\nb\n"), vec!["a", "", "b"]);
        assert!(text_lines("").is_empty());
    }
}
