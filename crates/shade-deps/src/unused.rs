use std::collections::{BTreeMap, BTreeSet, VecDeque};

use shade_archive::{ArchiveSource, OpenSource};
use shade_classfile::ClassFile;

use crate::error::DependencyError;

/// Internal class name for a `.class` entry path, with any
/// `META-INF/versions/<n>/` prefix removed. `None` for non-class entries and
/// module descriptors.
pub fn class_name_for_path(path: &str) -> Option<&str> {
    let name = path.strip_suffix(".class")?;
    let name = match name.strip_prefix("META-INF/versions/") {
        Some(rest) => match rest.split_once('/') {
            Some((version, rest)) if version.bytes().all(|b| b.is_ascii_digit()) => rest,
            _ => name,
        },
        None => name,
    };
    (name != "module-info").then_some(name)
}

#[derive(Debug, Default)]
struct ClassNode {
    root: bool,
    references: BTreeSet<String>,
}

/// Whole-program class reference graph used to find classes that nothing
/// kept can reach.
///
/// Classes added through [`add_root`](Self::add_root) (the project's own
/// output and retained dependencies) seed the closure; classes added through
/// [`add_candidate`](Self::add_candidate) are dropped unless reached.
#[derive(Debug, Default)]
pub struct UnusedClassTracker {
    classes: BTreeMap<String, ClassNode>,
}

impl UnusedClassTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every class of `source` as a kept root. Returns the number of classes read.
    pub fn add_root(&mut self, source: &ArchiveSource) -> Result<usize, DependencyError> {
        self.add_source(source, true)
    }

    /// Adds every class of `source` as a minimization candidate.
    pub fn add_candidate(&mut self, source: &ArchiveSource) -> Result<usize, DependencyError> {
        self.add_source(source, false)
    }

    /// Adds one parsed class.
    pub fn add_class(&mut self, class: &ClassFile, root: bool) {
        let node = self.classes.entry(class.this_class.clone()).or_default();
        node.root |= root;
        node.references.extend(class.referenced_classes());
    }

    fn add_source(&mut self, source: &ArchiveSource, root: bool) -> Result<usize, DependencyError> {
        let mut open = OpenSource::open(source)?;
        let class_entries: Vec<(usize, String)> = open
            .entries()
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_directory() && class_name_for_path(&entry.path).is_some())
            .map(|(index, entry)| (index, entry.path.clone()))
            .collect();

        for (index, path) in &class_entries {
            let bytes = open.read(*index)?;
            let class = ClassFile::parse(&bytes).map_err(|err| DependencyError::Class {
                path: format!("{source}!/{path}"),
                source: err,
            })?;
            self.add_class(&class, root);
        }

        tracing::debug!(
            target = "shade.deps",
            source = %source,
            classes = class_entries.len(),
            root,
            "indexed classes"
        );
        Ok(class_entries.len())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Classes reachable from the roots through references.
    pub fn used(&self) -> BTreeSet<String> {
        let mut used = BTreeSet::new();
        let mut queue: VecDeque<&str> = self
            .classes
            .iter()
            .filter(|(_, node)| node.root)
            .map(|(name, _)| name.as_str())
            .collect();

        while let Some(name) = queue.pop_front() {
            if !used.insert(name.to_string()) {
                continue;
            }
            if let Some(node) = self.classes.get(name) {
                queue.extend(
                    node.references
                        .iter()
                        .filter(|r| self.classes.contains_key(r.as_str()) && !used.contains(r.as_str()))
                        .map(String::as_str),
                );
            }
        }
        used
    }

    /// Known classes outside the closure of the roots, as internal names.
    pub fn find_unused(&self) -> BTreeSet<String> {
        let used = self.used();
        self.classes
            .keys()
            .filter(|name| !used.contains(*name))
            .cloned()
            .collect()
    }
}
