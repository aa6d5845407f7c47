use std::collections::BTreeSet;

use crate::classfile::ClassFile;
use crate::remap::Remapper;

struct Collector<'a> {
    names: &'a mut BTreeSet<String>,
}

impl Remapper for Collector<'_> {
    fn map(&mut self, internal_name: &str) -> String {
        // Internal names never contain '.', source-file paths always do.
        if !internal_name.contains('.') {
            self.names.insert(internal_name.to_string());
        }
        internal_name.to_string()
    }
}

impl ClassFile {
    /// Every class name this class mentions in its structure, descriptors,
    /// signatures, annotations and code, excluding itself.
    pub fn referenced_classes(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        let mut copy = self.clone();
        copy.remap(&mut Collector { names: &mut names });
        names.remove(&self.this_class);
        names
    }
}
