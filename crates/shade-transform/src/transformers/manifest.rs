use crate::manifest::{Manifest, MANIFEST_PATH};
use crate::{EntrySink, ResourceEntry, TransformError, Transformer, TransformerContext};

fn is_manifest(path: &str) -> bool {
    path.eq_ignore_ascii_case(MANIFEST_PATH)
}

/// Keeps the first manifest seen and applies configured attributes to it.
/// Exactly one manifest is always written.
#[derive(Debug, Default)]
pub struct ManifestResourceTransformer {
    main_class: Option<String>,
    attributes: Vec<(String, String)>,
    manifest: Option<Manifest>,
}

impl ManifestResourceTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn main_class(mut self, main_class: impl Into<String>) -> Self {
        self.main_class = Some(main_class.into());
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }
}

impl Transformer for ManifestResourceTransformer {
    fn name(&self) -> &str {
        "ManifestResourceTransformer"
    }

    fn can_transform_resource(&mut self, entry: &ResourceEntry<'_>) -> bool {
        is_manifest(entry.path)
    }

    fn transform(&mut self, context: &TransformerContext<'_>) -> Result<(), TransformError> {
        if self.manifest.is_some() {
            return Ok(());
        }
        match Manifest::parse(context.contents) {
            Ok(manifest) => self.manifest = Some(manifest),
            Err(err) => tracing::warn!(
                target = "shade.transform",
                origin = context.origin,
                error = %err,
                "failed to read MANIFEST.MF"
            ),
        }
        Ok(())
    }

    fn has_transformed_resource(&self) -> bool {
        true
    }

    fn modify_output(&mut self, sink: &mut dyn EntrySink) -> Result<(), TransformError> {
        let mut manifest = self.manifest.take().unwrap_or_default();
        if let Some(main_class) = &self.main_class {
            manifest.main.insert("Main-Class", main_class.clone());
        }
        for (name, value) in &self.attributes {
            manifest.main.insert(name.clone(), value.clone());
        }
        sink.write_entry(MANIFEST_PATH, &manifest.to_bytes())
    }
}

/// Appends attributes verbatim to the first manifest seen.
#[derive(Debug, Default)]
pub struct ManifestAppenderTransformer {
    attributes: Vec<(String, String)>,
    contents: Option<Vec<u8>>,
}

impl ManifestAppenderTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push((name.into(), value.to_string()));
        self
    }
}

impl Transformer for ManifestAppenderTransformer {
    fn name(&self) -> &str {
        "ManifestAppenderTransformer"
    }

    fn can_transform_resource(&mut self, entry: &ResourceEntry<'_>) -> bool {
        is_manifest(entry.path)
    }

    fn transform(&mut self, context: &TransformerContext<'_>) -> Result<(), TransformError> {
        if self.contents.is_none() {
            self.contents = Some(context.contents.to_vec());
        }
        Ok(())
    }

    fn has_transformed_resource(&self) -> bool {
        !self.attributes.is_empty()
    }

    fn modify_output(&mut self, sink: &mut dyn EntrySink) -> Result<(), TransformError> {
        let mut out = self.contents.take().unwrap_or_default();
        for (name, value) in &self.attributes {
            out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }
        out.extend_from_slice(b"\r\n");
        sink.write_entry(MANIFEST_PATH, &out)
    }
}
