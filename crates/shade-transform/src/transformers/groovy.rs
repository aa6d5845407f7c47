use shade_properties::{Encoding, Properties};

use crate::{EntrySink, ResourceEntry, TransformError, Transformer, TransformerContext};

const LEGACY_DESCRIPTOR: &str = "META-INF/services/org.codehaus.groovy.runtime.ExtensionModule";
const DESCRIPTOR: &str = "META-INF/groovy/org.codehaus.groovy.runtime.ExtensionModule";

const MODULE_NAME: &str = "moduleName";
const MODULE_VERSION: &str = "moduleVersion";
const EXTENSION_CLASSES: &str = "extensionClasses";
const STATIC_EXTENSION_CLASSES: &str = "staticExtensionClasses";

const MERGED_MODULE_NAME: &str = "MergedByShadowJar";
const MERGED_MODULE_VERSION: &str = "1.0.0";

/// Merges Groovy extension module descriptors into one module.
///
/// The output goes to the legacy `META-INF/services` location unless any
/// source used the Groovy 2.5+ `META-INF/groovy` location.
#[derive(Debug)]
pub struct GroovyExtensionModuleTransformer {
    module: Properties,
    legacy: bool,
}

impl Default for GroovyExtensionModuleTransformer {
    fn default() -> Self {
        Self {
            module: Properties::new(),
            legacy: true,
        }
    }
}

impl GroovyExtensionModuleTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    fn merge(&mut self, key: &str, value: &str) {
        let merged = match (self.module.get(key), key) {
            (None, _) => value.to_string(),
            (Some(_), MODULE_NAME) => MERGED_MODULE_NAME.to_string(),
            (Some(_), MODULE_VERSION) => MERGED_MODULE_VERSION.to_string(),
            (Some(existing), _) => format!("{existing},{value}"),
        };
        self.module.insert(key, merged);
    }
}

impl Transformer for GroovyExtensionModuleTransformer {
    fn name(&self) -> &str {
        "GroovyExtensionModuleTransformer"
    }

    fn can_transform_resource(&mut self, entry: &ResourceEntry<'_>) -> bool {
        match entry.path {
            DESCRIPTOR => {
                self.legacy = false;
                true
            }
            LEGACY_DESCRIPTOR => true,
            _ => false,
        }
    }

    fn transform(&mut self, context: &TransformerContext<'_>) -> Result<(), TransformError> {
        let incoming = Properties::parse(context.contents, Encoding::Iso8859_1);
        for (key, value) in incoming.iter() {
            if matches!(
                key,
                MODULE_NAME | MODULE_VERSION | EXTENSION_CLASSES | STATIC_EXTENSION_CLASSES
            ) {
                self.merge(key, value);
            }
        }
        Ok(())
    }

    fn has_transformed_resource(&self) -> bool {
        !self.module.is_empty()
    }

    fn modify_output(&mut self, sink: &mut dyn EntrySink) -> Result<(), TransformError> {
        let path = if self.legacy { LEGACY_DESCRIPTOR } else { DESCRIPTOR };
        let contents = self.module.to_bytes(Encoding::Iso8859_1);
        self.module.clear();
        sink.write_entry(path, &contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shade_relocation::RelocatorSet;

    use crate::MemorySink;

    fn feed(t: &mut GroovyExtensionModuleTransformer, path: &str, text: &str) {
        let relocators = RelocatorSet::new();
        assert!(t.can_transform_resource(&ResourceEntry {
            path,
            origin: "test",
            contents: text.as_bytes(),
        }));
        t.transform(&TransformerContext {
            path,
            origin: "test",
            contents: text.as_bytes(),
            relocators: &relocators,
        })
        .unwrap();
    }

    #[test]
    fn merges_two_modules() {
        let mut t = GroovyExtensionModuleTransformer::new();
        feed(
            &mut t,
            LEGACY_DESCRIPTOR,
            "moduleName=foo\nmoduleVersion=2.3\nextensionClasses=com.acme.Foo\nother=ignored\n",
        );
        feed(
            &mut t,
            DESCRIPTOR,
            "moduleName=bar\nmoduleVersion=1.0\nextensionClasses=com.acme.Bar\nstaticExtensionClasses=com.acme.Static\n",
        );

        let mut sink = MemorySink::new();
        t.modify_output(&mut sink).unwrap();
        assert_eq!(sink.paths(), vec![DESCRIPTOR]);
        let merged = Properties::parse(sink.get(DESCRIPTOR).unwrap(), Encoding::Iso8859_1);
        assert_eq!(merged.get(MODULE_NAME), Some(MERGED_MODULE_NAME));
        assert_eq!(merged.get(MODULE_VERSION), Some(MERGED_MODULE_VERSION));
        assert_eq!(merged.get(EXTENSION_CLASSES), Some("com.acme.Foo,com.acme.Bar"));
        assert_eq!(merged.get(STATIC_EXTENSION_CLASSES), Some("com.acme.Static"));
        assert_eq!(merged.get("other"), None);
    }

    #[test]
    fn single_legacy_module_keeps_its_values() {
        let mut t = GroovyExtensionModuleTransformer::new();
        feed(&mut t, LEGACY_DESCRIPTOR, "moduleName=foo\nmoduleVersion=2.3\n");
        let mut sink = MemorySink::new();
        t.modify_output(&mut sink).unwrap();
        let merged = Properties::parse(sink.get(LEGACY_DESCRIPTOR).unwrap(), Encoding::Iso8859_1);
        assert_eq!(merged.get(MODULE_NAME), Some("foo"));
        assert_eq!(merged.get(MODULE_VERSION), Some("2.3"));
    }
}
