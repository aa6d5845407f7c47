use shade_archive::PatternSet;

use super::{builtin_patterns, text_lines, PathMap};
use crate::{EntrySink, ResourceEntry, TransformError, Transformer, TransformerContext};

const SERVICES_PATTERN: &str = "META-INF/services/**";
const GROOVY_EXTENSION_MODULE_DESCRIPTOR: &str =
    "META-INF/services/org.codehaus.groovy.runtime.ExtensionModule";

/// Merges service-loader registries line by line, relocating provider
/// names and the service file name itself.
pub struct ServiceFileTransformer {
    patterns: PatternSet,
    entries: PathMap<Vec<u8>>,
}

impl Default for ServiceFileTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceFileTransformer {
    pub fn new() -> Self {
        Self {
            patterns: builtin_patterns(&[SERVICES_PATTERN], &[GROOVY_EXTENSION_MODULE_DESCRIPTOR]),
            entries: PathMap::default(),
        }
    }

    /// Uses `root` instead of `META-INF/services` as the registry directory.
    pub fn with_path(root: &str) -> Result<Self, TransformError> {
        let mut patterns = builtin_patterns(&[], &[GROOVY_EXTENSION_MODULE_DESCRIPTOR]);
        patterns.include(&format!("{}/**", root.trim_end_matches('/')))?;
        Ok(Self {
            patterns,
            entries: PathMap::default(),
        })
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

/// Appends `chunk`, separated by a newline unless the buffer already ends a line.
fn append_chunk(buffer: &mut Vec<u8>, chunk: &[u8]) {
    if matches!(buffer.last(), Some(b) if *b != b'\n' && *b != b'\r') {
        buffer.push(b'\n');
    }
    buffer.extend_from_slice(chunk);
}

impl Transformer for ServiceFileTransformer {
    fn name(&self) -> &str {
        "ServiceFileTransformer"
    }

    fn can_transform_resource(&mut self, entry: &ResourceEntry<'_>) -> bool {
        self.patterns.is_included(entry.path)
    }

    fn transform(&mut self, context: &TransformerContext<'_>) -> Result<(), TransformError> {
        let relocators = context.relocators;
        let target = match context.path.rsplit_once('/') {
            Some((dir, file)) => match relocators.relocate_class(file) {
                Some(relocated) => format!("{dir}/{relocated}"),
                None => context.path.to_string(),
            },
            None => relocators
                .relocate_class(context.path)
                .unwrap_or_else(|| context.path.to_string()),
        };

        let text = String::from_utf8_lossy(context.contents);
        let buffer = self.entries.get_or_insert_with(&target, Vec::new);
        for line in text_lines(&text) {
            match relocators.relocate_class(line) {
                Some(relocated) => append_chunk(buffer, relocated.as_bytes()),
                None => append_chunk(buffer, line.as_bytes()),
            }
        }
        Ok(())
    }

    fn has_transformed_resource(&self) -> bool {
        !self.entries.is_empty()
    }

    fn modify_output(&mut self, sink: &mut dyn EntrySink) -> Result<(), TransformError> {
        for (path, contents) in self.entries.drain() {
            sink.write_entry(&path, &contents)?;
        }
        Ok(())
    }
}
