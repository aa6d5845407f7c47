use shade_classfile::Remapper;

use crate::error::RelocationError;
use crate::set::{PackageMapper, RelocatorSet};

/// Bridges a [`PackageMapper`] into the class-file [`Remapper`] seam.
///
/// Internal names and descriptors are mapped as paths only; string
/// constants are mapped as both paths and dotted class names.
pub struct ClassRemapper<'a> {
    mapper: &'a dyn PackageMapper,
    changed: bool,
}

impl<'a> ClassRemapper<'a> {
    pub fn new(mapper: &'a dyn PackageMapper) -> Self {
        Self {
            mapper,
            changed: false,
        }
    }

    /// Whether any name passed through this remapper was changed.
    pub fn changed(&self) -> bool {
        self.changed
    }

    fn track(&mut self, original: &str, mapped: String) -> String {
        if mapped != original {
            self.changed = true;
        }
        mapped
    }
}

impl Remapper for ClassRemapper<'_> {
    fn map(&mut self, internal_name: &str) -> String {
        let mapped = self.mapper.map(internal_name, true, false);
        self.track(internal_name, mapped)
    }

    fn map_value(&mut self, value: &str) -> String {
        let mapped = self.mapper.map(value, true, true);
        self.track(value, mapped)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocatedClass {
    pub bytes: Vec<u8>,
    /// False when no name in the class matched a rule.
    pub changed: bool,
}

/// Rewrites one class file through `relocators`. `path` is only used for errors.
pub fn relocate_class(
    path: &str,
    bytes: &[u8],
    relocators: &RelocatorSet,
) -> Result<RelocatedClass, RelocationError> {
    let mut remapper = ClassRemapper::new(relocators);
    let bytes = shade_classfile::remap_class(bytes, &mut remapper).map_err(|source| {
        RelocationError::Class {
            path: path.to_string(),
            source,
        }
    })?;
    let changed = remapper.changed();
    tracing::trace!(target = "shade.relocation", path, changed, "remapped class");
    Ok(RelocatedClass { bytes, changed })
}
