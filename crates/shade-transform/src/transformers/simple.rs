use std::collections::HashSet;
use std::path::PathBuf;

use crate::{EntrySink, ResourceEntry, TransformError, Transformer, TransformerContext};

/// Concatenates every occurrence of one resource, each followed by a newline.
#[derive(Debug)]
pub struct AppendingTransformer {
    resource: String,
    data: Vec<u8>,
}

impl AppendingTransformer {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            data: Vec::new(),
        }
    }
}

impl Transformer for AppendingTransformer {
    fn name(&self) -> &str {
        "AppendingTransformer"
    }

    fn can_transform_resource(&mut self, entry: &ResourceEntry<'_>) -> bool {
        entry.path.eq_ignore_ascii_case(&self.resource)
    }

    fn transform(&mut self, context: &TransformerContext<'_>) -> Result<(), TransformError> {
        self.data.extend_from_slice(context.contents);
        self.data.push(b'\n');
        Ok(())
    }

    fn has_transformed_resource(&self) -> bool {
        !self.data.is_empty()
    }

    fn modify_output(&mut self, sink: &mut dyn EntrySink) -> Result<(), TransformError> {
        let data = std::mem::take(&mut self.data);
        sink.write_entry(&self.resource, &data)
    }
}

/// Drops every entry whose path ends with the given suffix.
#[derive(Debug)]
pub struct DontIncludeResourceTransformer {
    resource: String,
}

impl DontIncludeResourceTransformer {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
        }
    }
}

impl Transformer for DontIncludeResourceTransformer {
    fn name(&self) -> &str {
        "DontIncludeResourceTransformer"
    }

    fn can_transform_resource(&mut self, entry: &ResourceEntry<'_>) -> bool {
        !self.resource.is_empty() && entry.path.ends_with(&self.resource)
    }
}

/// Adds a file from disk to the output under a fixed path.
#[derive(Debug)]
pub struct IncludeResourceTransformer {
    file: PathBuf,
    resource: String,
}

impl IncludeResourceTransformer {
    pub fn new(file: impl Into<PathBuf>, resource: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            resource: resource.into(),
        }
    }
}

impl Transformer for IncludeResourceTransformer {
    fn name(&self) -> &str {
        "IncludeResourceTransformer"
    }

    fn can_transform_resource(&mut self, _entry: &ResourceEntry<'_>) -> bool {
        false
    }

    fn has_transformed_resource(&self) -> bool {
        self.file.is_file()
    }

    fn modify_output(&mut self, sink: &mut dyn EntrySink) -> Result<(), TransformError> {
        let contents = std::fs::read(&self.file).map_err(|source| TransformError::Io {
            path: self.file.clone(),
            source,
        })?;
        sink.write_entry(&self.resource, &contents)
    }
}

/// Keeps only the first entry ending with each configured resource suffix.
///
/// Occurrences are tracked per entry path, so two different paths sharing a
/// suffix each keep their first copy.
#[derive(Debug, Default)]
pub struct PreserveFirstFoundResourceTransformer {
    resources: Vec<String>,
    found: HashSet<String>,
}

impl PreserveFirstFoundResourceTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        let resource = resource.into();
        if !resource.is_empty() && !self.resources.contains(&resource) {
            self.resources.push(resource);
        }
        self
    }

    pub fn resources(&self) -> &[String] {
        &self.resources
    }
}

impl Transformer for PreserveFirstFoundResourceTransformer {
    fn name(&self) -> &str {
        "PreserveFirstFoundResourceTransformer"
    }

    fn can_transform_resource(&mut self, entry: &ResourceEntry<'_>) -> bool {
        if self.resources.iter().any(|r| entry.path.ends_with(r.as_str())) {
            return !self.found.insert(entry.path.to_string());
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shade_relocation::RelocatorSet;

    use crate::MemorySink;

    fn entry<'a>(path: &'a str, contents: &'a [u8]) -> ResourceEntry<'a> {
        ResourceEntry {
            path,
            origin: "test",
            contents,
        }
    }

    #[test]
    fn appends_with_trailing_newlines() {
        let relocators = RelocatorSet::new();
        let mut t = AppendingTransformer::new("META-INF/test");
        assert!(!t.has_transformed_resource());
        for contents in [&b"one"[..], &b"two"[..]] {
            assert!(t.can_transform_resource(&entry("meta-inf/TEST", contents)));
            t.transform(&TransformerContext {
                path: "meta-inf/TEST",
                origin: "test",
                contents,
                relocators: &relocators,
            })
            .unwrap();
        }
        let mut sink = MemorySink::new();
        t.modify_output(&mut sink).unwrap();
        assert_eq!(sink.text("META-INF/test").as_deref(), Some("one\ntwo\n"));
        assert!(!t.has_transformed_resource());
    }

    #[test]
    fn dont_include_matches_suffix() {
        let mut t = DontIncludeResourceTransformer::new(".txt");
        assert!(t.can_transform_resource(&entry("docs/readme.txt", b"")));
        assert!(!t.can_transform_resource(&entry("docs/readme.md", b"")));
        let mut empty = DontIncludeResourceTransformer::new("");
        assert!(!empty.can_transform_resource(&entry("anything", b"")));
    }

    #[test]
    fn include_adds_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("NOTICE");
        let mut t = IncludeResourceTransformer::new(&file, "META-INF/NOTICE");
        assert!(!t.has_transformed_resource());

        std::fs::write(&file, "notice").unwrap();
        assert!(t.has_transformed_resource());
        let mut sink = MemorySink::new();
        t.modify_output(&mut sink).unwrap();
        assert_eq!(sink.text("META-INF/NOTICE").as_deref(), Some("notice"));
    }

    #[test]
    fn preserve_first_found_drops_later_copies() {
        let mut t = PreserveFirstFoundResourceTransformer::new()
            .resource("module-info.class")
            .resource("config.yml");
        assert!(!t.can_transform_resource(&entry("module-info.class", b"1")));
        assert!(t.can_transform_resource(&entry("module-info.class", b"2")));
        assert!(!t.can_transform_resource(&entry("a/config.yml", b"1")));
        assert!(!t.can_transform_resource(&entry("b/config.yml", b"1")));
        assert!(t.can_transform_resource(&entry("b/config.yml", b"2")));
        assert!(!t.can_transform_resource(&entry("other.txt", b"")));
    }
}
