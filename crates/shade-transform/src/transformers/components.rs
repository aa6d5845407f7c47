use shade_relocation::RelocatorSet;

use crate::xml::{self, XmlElement};
use crate::{EntrySink, ResourceEntry, TransformError, Transformer, TransformerContext};

const COMPONENTS_XML_PATH: &str = "META-INF/plexus/components.xml";

/// Merges Plexus `components.xml` descriptors into one `component-set`.
///
/// Components are keyed by `role:role-hint`; a later component replaces an
/// earlier one with the same key but inherits its `configuration` when it
/// has one. Class names in `role`, `implementation` and requirement roles
/// are relocated.
#[derive(Debug, Default)]
pub struct ComponentsXmlResourceTransformer {
    components: Vec<(String, XmlElement)>,
}

impl ComponentsXmlResourceTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, key: String, component: XmlElement) {
        match self.components.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = component,
            None => self.components.push((key, component)),
        }
    }

    fn existing_configuration(&self, key: &str) -> Option<XmlElement> {
        self.components
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, component)| component.child("configuration"))
            .cloned()
    }
}

fn value(element: &XmlElement, name: &str) -> String {
    element.child(name).map(XmlElement::text).unwrap_or_default()
}

/// Rewrites the class name held by `name` when a relocator claims it.
fn relocate_value(element: &mut XmlElement, name: &str, relocators: &RelocatorSet) -> String {
    let current = value(element, name);
    let relocated = relocators.relocate_class(&current).unwrap_or(current);
    if let Some(child) = element.child_mut(name) {
        if !relocated.is_empty() {
            child.set_text(relocated.clone());
        }
    }
    relocated
}

impl Transformer for ComponentsXmlResourceTransformer {
    fn name(&self) -> &str {
        "ComponentsXmlResourceTransformer"
    }

    fn can_transform_resource(&mut self, entry: &ResourceEntry<'_>) -> bool {
        entry.path == COMPONENTS_XML_PATH
    }

    fn transform(&mut self, context: &TransformerContext<'_>) -> Result<(), TransformError> {
        let text = String::from_utf8_lossy(context.contents);
        let root = xml::parse(text.trim_start_matches('\u{feff}')).map_err(|message| {
            TransformError::Xml {
                path: format!("{COMPONENTS_XML_PATH} ({})", context.origin),
                message,
            }
        })?;
        let Some(components) = root.child("components") else {
            return Ok(());
        };

        for component in components.elements().filter(|e| e.name == "component") {
            let mut component = component.clone();
            let role = relocate_value(&mut component, "role", context.relocators);
            let hint = value(&component, "role-hint");
            relocate_value(&mut component, "implementation", context.relocators);

            let key = format!("{role}:{hint}");
            if let Some(configuration) = self.existing_configuration(&key) {
                component.push_element(configuration);
            }

            if let Some(requirements) = component.child_mut("requirements") {
                for child in &mut requirements.children {
                    if let xml::XmlNode::Element(requirement) = child {
                        relocate_value(requirement, "role", context.relocators);
                    }
                }
            }

            self.insert(key, component);
        }
        Ok(())
    }

    fn has_transformed_resource(&self) -> bool {
        !self.components.is_empty()
    }

    fn modify_output(&mut self, sink: &mut dyn EntrySink) -> Result<(), TransformError> {
        let mut components = XmlElement::new("components");
        for (_, component) in self.components.drain(..) {
            components.push_element(component);
        }
        let mut root = XmlElement::new("component-set");
        root.push_element(components);

        let bytes = root.to_document_bytes().map_err(|message| TransformError::Xml {
            path: COMPONENTS_XML_PATH.to_string(),
            message,
        })?;
        sink.write_entry(COMPONENTS_XML_PATH, &bytes)
    }
}
