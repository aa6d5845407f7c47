use crate::xml::{self, XmlElement};
use crate::{EntrySink, ResourceEntry, TransformError, Transformer, TransformerContext};

/// Merges every occurrence of one XML resource into the first: missing root
/// attributes are copied over and all root children are appended.
#[derive(Debug)]
pub struct XmlAppendingTransformer {
    resource: String,
    root: Option<XmlElement>,
}

impl XmlAppendingTransformer {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            root: None,
        }
    }
}

impl Transformer for XmlAppendingTransformer {
    fn name(&self) -> &str {
        "XmlAppendingTransformer"
    }

    fn can_transform_resource(&mut self, entry: &ResourceEntry<'_>) -> bool {
        entry.path.eq_ignore_ascii_case(&self.resource)
    }

    fn transform(&mut self, context: &TransformerContext<'_>) -> Result<(), TransformError> {
        let text = String::from_utf8_lossy(context.contents);
        let incoming = xml::parse(text.trim_start_matches('\u{feff}')).map_err(|message| {
            TransformError::Xml {
                path: format!("{} ({})", self.resource, context.origin),
                message,
            }
        })?;
        match &mut self.root {
            None => self.root = Some(incoming),
            Some(root) => root.merge_root(incoming),
        }
        Ok(())
    }

    fn has_transformed_resource(&self) -> bool {
        self.root.is_some()
    }

    fn modify_output(&mut self, sink: &mut dyn EntrySink) -> Result<(), TransformError> {
        if let Some(root) = self.root.take() {
            let bytes = root.to_document_bytes().map_err(|message| TransformError::Xml {
                path: self.resource.clone(),
                message,
            })?;
            sink.write_entry(&self.resource, &bytes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shade_relocation::RelocatorSet;

    use crate::MemorySink;

    const PATH: &str = "META-INF/plexus/components.xml";

    fn feed(t: &mut XmlAppendingTransformer, text: &str) -> Result<(), TransformError> {
        let relocators = RelocatorSet::new();
        assert!(t.can_transform_resource(&ResourceEntry {
            path: PATH,
            origin: "test.jar",
            contents: text.as_bytes(),
        }));
        t.transform(&TransformerContext {
            path: PATH,
            origin: "test.jar",
            contents: text.as_bytes(),
            relocators: &relocators,
        })
    }

    #[test]
    fn appends_children_and_missing_root_attributes() {
        let mut t = XmlAppendingTransformer::new(PATH);
        feed(&mut t, r#"<components a="1"><component>one</component></components>"#).unwrap();
        feed(
            &mut t,
            r#"<?xml version="1.0"?><!DOCTYPE components SYSTEM "http://example.invalid/c.dtd"><components a="2" b="3"><component>two</component></components>"#,
        )
        .unwrap();

        let mut sink = MemorySink::new();
        t.modify_output(&mut sink).unwrap();
        assert_eq!(
            sink.text(PATH).as_deref(),
            Some(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                 <components a=\"1\" b=\"3\">\n  <component>one</component>\n  <component>two</component>\n</components>\n"
            )
        );
        assert!(!t.has_transformed_resource());
    }

    #[test]
    fn malformed_xml_fails_with_the_resource_name() {
        let mut t = XmlAppendingTransformer::new(PATH);
        let err = feed(&mut t, "<components>").unwrap_err();
        assert!(err.to_string().contains(PATH), "{err}");
    }
}
