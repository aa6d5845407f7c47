use shade_archive::PatternSet;

use crate::{
    ContentTracker, EntrySink, ResourceEntry, TransformError, Transformer,
};

/// Drops entries whose path and content were already written, and fails the
/// merge when a checked path shows up with different contents.
///
/// Every entry is hashed. The include and exclude patterns only select
/// which paths fail on conflicting contents; excluded paths keep all
/// distinct variants in the output.
#[derive(Debug, Default)]
pub struct DeduplicatingResourceTransformer {
    patterns: PatternSet,
    tracker: ContentTracker,
}

impl DeduplicatingResourceTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, pattern: &str) -> Result<Self, TransformError> {
        self.patterns.include(pattern)?;
        Ok(self)
    }

    pub fn exclude(mut self, pattern: &str) -> Result<Self, TransformError> {
        self.patterns.exclude(pattern)?;
        Ok(self)
    }
}

impl Transformer for DeduplicatingResourceTransformer {
    fn name(&self) -> &str {
        "DeduplicatingResourceTransformer"
    }

    /// Claims (and so drops) an entry only when its content was seen before.
    fn can_transform_resource(&mut self, entry: &ResourceEntry<'_>) -> bool {
        !self.tracker.record(entry.path, entry.origin, entry.contents)
    }

    fn has_transformed_resource(&self) -> bool {
        true
    }

    fn modify_output(&mut self, _sink: &mut dyn EntrySink) -> Result<(), TransformError> {
        let patterns = &self.patterns;
        let violations = self.tracker.violations(|path| patterns.is_included(path));
        self.tracker.clear();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(TransformError::DuplicateContent(violations))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use crate::MemorySink;

    fn offer(t: &mut DeduplicatingResourceTransformer, path: &str, origin: &str, contents: &str) -> bool {
        t.can_transform_resource(&ResourceEntry {
            path,
            origin,
            contents: contents.as_bytes(),
        })
    }

    #[test]
    fn identical_content_is_dropped() {
        let mut t = DeduplicatingResourceTransformer::new();
        assert!(!offer(&mut t, "a.txt", "one.jar", "same"));
        assert!(offer(&mut t, "a.txt", "two.jar", "same"));
        assert!(!offer(&mut t, "b.txt", "two.jar", "same"));
        t.modify_output(&mut MemorySink::new()).unwrap();
    }

    #[test]
    fn conflicting_content_fails_with_every_origin() {
        let mut t = DeduplicatingResourceTransformer::new()
            .exclude("META-INF/maven/**")
            .unwrap();
        assert!(!offer(&mut t, "a.txt", "one.jar", "first"));
        assert!(!offer(&mut t, "a.txt", "two.jar", "second"));
        assert!(!offer(&mut t, "META-INF/maven/g/a/pom.properties", "one.jar", "v=1"));
        assert!(!offer(&mut t, "META-INF/maven/g/a/pom.properties", "two.jar", "v=2"));

        let err = t.modify_output(&mut MemorySink::new()).unwrap_err();
        let TransformError::DuplicateContent(violations) = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(violations.len(), 1);
        let message = err.to_string();
        assert!(message.contains("a.txt"), "{message}");
        assert!(message.contains("one.jar") && message.contains("two.jar"), "{message}");
        assert!(!message.contains("pom.properties"), "{message}");
    }
}
