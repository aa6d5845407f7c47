use std::fmt;

use regex::Regex;
use shade_properties::{parse_entries, Encoding, Properties};

use super::PathMap;
use crate::{EntrySink, ResourceEntry, TransformError, Transformer, TransformerContext};

const PROPERTIES_SUFFIX: &str = ".properties";

/// What happens when a key already merged from an earlier file shows up again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Keep the first value seen.
    #[default]
    First,
    /// Overwrite with the latest value.
    Latest,
    /// Join all values with the merge separator.
    Append,
}

impl MergeStrategy {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "first" => Some(MergeStrategy::First),
            "latest" => Some(MergeStrategy::Latest),
            "append" => Some(MergeStrategy::Append),
            _ => None,
        }
    }
}

/// Per-path overrides of the merge strategy and separator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMapping {
    pub merge_strategy: Option<MergeStrategy>,
    pub merge_separator: Option<String>,
}

type KeyTransformer = Box<dyn Fn(&str) -> String + Send>;

/// Merges `.properties` files key by key.
///
/// Without `paths` or `mappings` every path ending in `.properties` is
/// claimed. Path keys match literally or as a whole-path regular expression.
pub struct PropertiesFileTransformer {
    paths: Vec<(String, Regex)>,
    mappings: Vec<(String, Regex, PathMapping)>,
    merge_strategy: MergeStrategy,
    merge_separator: String,
    encoding: Encoding,
    key_transformer: Option<KeyTransformer>,
    /// Mapping resolved against the source path of the last claimed entry.
    claimed: Option<Option<usize>>,
    entries: PathMap<Properties>,
}

impl Default for PropertiesFileTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertiesFileTransformer {
    pub fn new() -> Self {
        Self {
            paths: Vec::new(),
            mappings: Vec::new(),
            merge_strategy: MergeStrategy::First,
            merge_separator: ",".to_string(),
            encoding: Encoding::Iso8859_1,
            key_transformer: None,
            claimed: None,
            entries: PathMap::default(),
        }
    }

    pub fn path(mut self, path: &str) -> Result<Self, TransformError> {
        self.paths.push((path.to_string(), whole_match(path)?));
        Ok(self)
    }

    pub fn mapping(mut self, path: &str, mapping: PathMapping) -> Result<Self, TransformError> {
        self.mappings
            .push((path.to_string(), whole_match(path)?, mapping));
        Ok(self)
    }

    pub fn merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.merge_strategy = strategy;
        self
    }

    pub fn merge_separator(mut self, separator: impl Into<String>) -> Self {
        self.merge_separator = separator.into();
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Rewrites every incoming key before merging.
    pub fn key_transformer(mut self, f: impl Fn(&str) -> String + Send + 'static) -> Self {
        self.key_transformer = Some(Box::new(f));
        self
    }

    /// Literal matches take precedence over regular-expression matches.
    fn mapping_index(&self, path: &str) -> Option<usize> {
        self.mappings
            .iter()
            .position(|(literal, _, _)| literal == path)
            .or_else(|| self.mappings.iter().position(|(_, re, _)| re.is_match(path)))
    }

    fn strategy_for(&self, mapping: Option<&PathMapping>) -> MergeStrategy {
        mapping
            .and_then(|m| m.merge_strategy)
            .unwrap_or(self.merge_strategy)
    }

    fn separator_for(&self, mapping: Option<&PathMapping>) -> String {
        mapping
            .and_then(|m| m.merge_separator.clone())
            .unwrap_or_else(|| self.merge_separator.clone())
    }

    fn load(&self, contents: &[u8]) -> Properties {
        let mut props = Properties::new();
        for entry in parse_entries(contents, self.encoding) {
            let key = match &self.key_transformer {
                Some(transform) => transform(&entry.key),
                None => entry.key,
            };
            props.insert(key, entry.value);
        }
        props
    }
}

fn whole_match(pattern: &str) -> Result<Regex, TransformError> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|source| TransformError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}

impl Transformer for PropertiesFileTransformer {
    fn name(&self) -> &str {
        "PropertiesFileTransformer"
    }

    fn can_transform_resource(&mut self, entry: &ResourceEntry<'_>) -> bool {
        let path = entry.path;
        let mapping = self.mapping_index(path);
        let claimed = mapping.is_some()
            || self
                .paths
                .iter()
                .any(|(literal, re)| literal == path || re.is_match(path))
            || (self.mappings.is_empty() && self.paths.is_empty() && path.ends_with(PROPERTIES_SUFFIX));
        self.claimed = claimed.then_some(mapping);
        claimed
    }

    fn transform(&mut self, context: &TransformerContext<'_>) -> Result<(), TransformError> {
        let incoming = self.load(context.contents);
        let index = match self.claimed.take() {
            Some(index) => index,
            None => self.mapping_index(context.path),
        };
        let mapping = index.map(|i| &self.mappings[i].2);
        let strategy = self.strategy_for(mapping);
        let separator = self.separator_for(mapping);

        let Some(merged) = self.entries.get_mut(context.path) else {
            self.entries.get_or_insert_with(context.path, || incoming);
            return Ok(());
        };
        for (key, value) in incoming.iter() {
            let merged_value = match merged.get(key) {
                None => value.to_string(),
                Some(existing) => match strategy {
                    MergeStrategy::First => continue,
                    MergeStrategy::Latest => value.to_string(),
                    MergeStrategy::Append => format!("{existing}{separator}{value}"),
                },
            };
            merged.insert(key, merged_value);
        }
        Ok(())
    }

    fn has_transformed_resource(&self) -> bool {
        !self.entries.is_empty()
    }

    fn modify_output(&mut self, sink: &mut dyn EntrySink) -> Result<(), TransformError> {
        let encoding = self.encoding;
        for (path, props) in self.entries.drain() {
            sink.write_entry(&path, &props.to_bytes(encoding))?;
        }
        Ok(())
    }
}

impl fmt::Debug for PropertiesFileTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertiesFileTransformer")
            .field("paths", &self.paths.iter().map(|(p, _)| p).collect::<Vec<_>>())
            .field("merge_strategy", &self.merge_strategy)
            .field("merge_separator", &self.merge_separator)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shade_relocation::RelocatorSet;

    use crate::MemorySink;

    fn merge(t: &mut PropertiesFileTransformer, path: &str, files: &[&str]) -> MemorySink {
        let relocators = RelocatorSet::new();
        for contents in files {
            let entry = ResourceEntry {
                path,
                origin: "test",
                contents: contents.as_bytes(),
            };
            assert!(t.can_transform_resource(&entry));
            t.transform(&TransformerContext {
                path,
                origin: "test",
                contents: contents.as_bytes(),
                relocators: &relocators,
            })
            .unwrap();
        }
        let mut sink = MemorySink::new();
        t.modify_output(&mut sink).unwrap();
        sink
    }

    #[test]
    fn strategies_decide_repeated_keys() {
        let files = ["key1=a\nkey2=one\n", "key2=two\nkey3=c\n"];
        let cases = [
            (MergeStrategy::First, "key1=a\nkey2=one\nkey3=c\n"),
            (MergeStrategy::Latest, "key1=a\nkey2=two\nkey3=c\n"),
            (MergeStrategy::Append, "key1=a\nkey2=one,two\nkey3=c\n"),
        ];
        for (strategy, expected) in cases {
            let mut t = PropertiesFileTransformer::new().merge_strategy(strategy);
            let sink = merge(&mut t, "app.properties", &files);
            assert_eq!(sink.text("app.properties").as_deref(), Some(expected), "{strategy:?}");
        }
    }

    #[test]
    fn mappings_override_strategy_and_separator_per_path() {
        let mut t = PropertiesFileTransformer::new()
            .mapping(
                r"META-INF/.*\.conf",
                PathMapping {
                    merge_strategy: Some(MergeStrategy::Append),
                    merge_separator: Some(";".to_string()),
                },
            )
            .unwrap();
        let sink = merge(&mut t, "META-INF/x.conf", &["k=1", "k=2"]);
        assert_eq!(sink.text("META-INF/x.conf").as_deref(), Some("k=1;2\n"));

        let unrelated = ResourceEntry {
            path: "other.properties",
            origin: "test",
            contents: b"",
        };
        assert!(!t.can_transform_resource(&unrelated));
    }

    #[test]
    fn mapping_follows_the_source_path_under_relocation() {
        let relocators = RelocatorSet::new().with(shade_relocation::SimpleRelocator::new(
            "org.foo",
            Some("shaded.org.foo"),
        ));
        let mut t = PropertiesFileTransformer::new()
            .mapping(
                "org/foo/app.properties",
                PathMapping {
                    merge_strategy: Some(MergeStrategy::Append),
                    merge_separator: Some("|".to_string()),
                },
            )
            .unwrap();
        for contents in ["k=1", "k=2"] {
            assert!(t.can_transform_resource(&ResourceEntry {
                path: "org/foo/app.properties",
                origin: "test",
                contents: contents.as_bytes(),
            }));
            t.transform(&TransformerContext {
                path: "shaded/org/foo/app.properties",
                origin: "test",
                contents: contents.as_bytes(),
                relocators: &relocators,
            })
            .unwrap();
        }
        let mut sink = MemorySink::new();
        t.modify_output(&mut sink).unwrap();
        assert_eq!(sink.text("shaded/org/foo/app.properties").as_deref(), Some("k=1|2\n"));
    }

    #[test]
    fn key_transformer_collapses_keys() {
        let mut t = PropertiesFileTransformer::new()
            .merge_strategy(MergeStrategy::Append)
            .key_transformer(|key| key.to_ascii_lowercase());
        let sink = merge(&mut t, "a.properties", &["Key=1", "KEY=2"]);
        assert_eq!(sink.text("a.properties").as_deref(), Some("key=1,2\n"));
    }

    #[test]
    fn explicit_paths_disable_the_suffix_default() {
        let mut t = PropertiesFileTransformer::new().path("conf/app.cfg").unwrap();
        let claimed = |t: &mut PropertiesFileTransformer, path| {
            t.can_transform_resource(&ResourceEntry {
                path,
                origin: "test",
                contents: b"",
            })
        };
        assert!(claimed(&mut t, "conf/app.cfg"));
        assert!(!claimed(&mut t, "x.properties"));
        assert!(MergeStrategy::parse("bogus").is_none());
    }
}
