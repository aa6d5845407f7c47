use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::relocator::Relocator;

/// Maps an entity name through a set of relocation rules.
pub trait PackageMapper {
    /// `map_paths` enables slashed names (`org/foo/Bar`, resource paths);
    /// `map_packages` enables dotted names (`org.foo.Bar`). A JVM descriptor
    /// wrapper such as `[[Lorg/foo/Bar;` is preserved around the mapped name.
    fn map(&self, entity_name: &str, map_paths: bool, map_packages: bool) -> String;
}

/// Ordered relocation rules; the first rule that matches a name wins.
#[derive(Debug, Clone, Default)]
pub struct RelocatorSet {
    relocators: Vec<Arc<dyn Relocator>>,
}

impl RelocatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, relocator: impl Relocator + 'static) {
        self.relocators.push(Arc::new(relocator));
    }

    pub fn with(mut self, relocator: impl Relocator + 'static) -> Self {
        self.push(relocator);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.relocators.is_empty()
    }

    pub fn len(&self) -> usize {
        self.relocators.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Relocator> {
        self.relocators.iter().map(|r| r.as_ref())
    }

    /// Relocates `path` with the first rule accepting it.
    pub fn relocate_path(&self, path: &str) -> Option<String> {
        self.iter()
            .find(|r| r.can_relocate_path(path))
            .map(|r| r.relocate_path(path))
    }

    /// Relocates a dotted class name with the first rule accepting it.
    pub fn relocate_class(&self, class_name: &str) -> Option<String> {
        self.iter()
            .find(|r| r.can_relocate_class(class_name))
            .map(|r| r.relocate_class(class_name))
    }

    /// Relocates `value` if it names a class (dotted) or a path (slashed).
    pub fn relocate_value(&self, value: &str) -> Option<String> {
        let mapped = self.map(value, true, true);
        (mapped != value).then_some(mapped)
    }

    /// Output path for an archive entry.
    ///
    /// Class files keep their `.class` extension and any
    /// `META-INF/versions/<n>/` prefix; only the class path in between is
    /// relocated, so the entry path always agrees with the class name.
    pub fn map_entry_path(&self, path: &str) -> String {
        if self.is_empty() {
            return path.to_string();
        }
        match path.strip_suffix(".class") {
            Some(stem) if !stem.is_empty() => {
                let prefix_len = multi_release_prefix().find(stem).map_or(0, |m| m.end());
                let (prefix, class_path) = stem.split_at(prefix_len);
                format!("{prefix}{}.class", self.map(class_path, true, false))
            }
            _ => self.map(path, true, false),
        }
    }
}

impl PackageMapper for RelocatorSet {
    fn map(&self, entity_name: &str, map_paths: bool, map_packages: bool) -> String {
        let (prefix, value, suffix) = match descriptor_wrapper().captures(entity_name) {
            Some(caps) => {
                let depth = caps.get(1).map_or("", |m| m.as_str());
                let inner = caps.get(2).map_or("", |m| m.as_str());
                (format!("{depth}L"), inner, ";")
            }
            None => (String::new(), entity_name, ""),
        };

        for relocator in self.iter() {
            if map_packages && relocator.can_relocate_class(value) {
                return format!("{prefix}{}{suffix}", relocator.relocate_class(value));
            }
            if map_paths && relocator.can_relocate_path(value) {
                return format!("{prefix}{}{suffix}", relocator.relocate_path(value));
            }
        }
        entity_name.to_string()
    }
}

fn descriptor_wrapper() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\[*)?L(.+);$").expect("descriptor regex should compile"))
}

fn multi_release_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^META-INF/versions/\d+/").expect("multi-release regex should compile"))
}
