use shade_properties::{Encoding, Properties};
use shade_relocation::RelocatorSet;

use super::PathMap;
use crate::{EntrySink, ResourceEntry, TransformError, Transformer, TransformerContext};

const SPRING_PATHS: &[&str] = &[
    "META-INF/spring-autoconfigure-metadata.properties",
    "META-INF/spring.factories",
    "META-INF/spring.handlers",
    "META-INF/spring.schemas",
    "META-INF/spring.tooling",
];

/// Files whose values are comma-separated class names.
const CLASS_VALUE_FILES: &[&str] = &[
    "spring-autoconfigure-metadata.properties",
    "spring.factories",
    "spring.handlers",
];

/// Merges Spring metadata files, joining values of repeated keys with `,`
/// and relocating class-name values.
#[derive(Debug, Default)]
pub struct SpringFileTransformer {
    encoding: Encoding,
    entries: PathMap<Properties>,
}

impl SpringFileTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}

fn relocate_class_list(value: &str, relocators: &RelocatorSet) -> String {
    value
        .split(',')
        .map(|name| {
            let name = name.trim();
            relocators
                .relocate_class(name)
                .unwrap_or_else(|| name.to_string())
        })
        .collect::<Vec<_>>()
        .join(",")
}

impl Transformer for SpringFileTransformer {
    fn name(&self) -> &str {
        "SpringFileTransformer"
    }

    fn can_transform_resource(&mut self, entry: &ResourceEntry<'_>) -> bool {
        SPRING_PATHS.contains(&entry.path)
    }

    fn transform(&mut self, context: &TransformerContext<'_>) -> Result<(), TransformError> {
        let class_values = CLASS_VALUE_FILES
            .iter()
            .any(|file| context.path.ends_with(file));
        let incoming = Properties::parse(context.contents, self.encoding);
        let merged = self
            .entries
            .get_or_insert_with(context.path, Properties::new);
        for (key, value) in incoming.iter() {
            let value = if class_values {
                relocate_class_list(value, context.relocators)
            } else {
                value.to_string()
            };
            let value = match merged.get(key) {
                Some(existing) => format!("{existing},{value}"),
                None => value,
            };
            merged.insert(key, value);
        }
        Ok(())
    }

    fn has_transformed_resource(&self) -> bool {
        !self.entries.is_empty()
    }

    fn modify_output(&mut self, sink: &mut dyn EntrySink) -> Result<(), TransformError> {
        for (path, properties) in self.entries.drain() {
            sink.write_entry(&path, &properties.to_bytes(self.encoding))?;
        }
        Ok(())
    }
}
