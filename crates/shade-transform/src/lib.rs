//! Resource transformers: stateful visitors that take over specific paths
//! during a merge and emit one merged result at the end.
//!
//! A [`Transformer`] lives for exactly one merge. The merge engine offers
//! every entry to [`Transformer::can_transform_resource`]; the first
//! transformer that accepts an entry receives it through
//! [`Transformer::transform`] and the entry is not copied. After the last
//! source, each transformer reporting [`Transformer::has_transformed_resource`]
//! is drained once through [`Transformer::modify_output`].
//!
//! Entries from the project's own output are always presented before entries
//! from dependencies.

mod context;
mod duplicates;
mod error;
pub mod manifest;
mod transformers;
mod xml;

pub use context::{EntrySink, MemorySink, ResourceEntry, TransformerContext};
pub use duplicates::{sha256_hex, ContentHash, ContentTracker, DuplicateViolation, DuplicateViolations};
pub use error::TransformError;
pub use transformers::*;

pub trait Transformer: Send {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    fn can_transform_resource(&mut self, entry: &ResourceEntry<'_>) -> bool;

    fn transform(&mut self, _context: &TransformerContext<'_>) -> Result<(), TransformError> {
        Ok(())
    }

    fn has_transformed_resource(&self) -> bool {
        false
    }

    /// Writes the accumulated result and resets the accumulated state.
    fn modify_output(&mut self, _sink: &mut dyn EntrySink) -> Result<(), TransformError> {
        Ok(())
    }
}

/// Ordered transformers owned by one merge.
#[derive(Default)]
pub struct TransformerSet {
    transformers: Vec<Box<dyn Transformer>>,
}

impl TransformerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, transformer: Box<dyn Transformer>) {
        self.transformers.push(transformer);
    }

    pub fn with(mut self, transformer: impl Transformer + 'static) -> Self {
        self.register(Box::new(transformer));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.transformers.iter().map(|t| t.name()).collect()
    }

    /// The first transformer accepting `entry`; later ones are not consulted.
    pub fn find(&mut self, entry: &ResourceEntry<'_>) -> Option<&mut (dyn Transformer + 'static)> {
        let index = self
            .transformers
            .iter_mut()
            .position(|t| t.can_transform_resource(entry))?;
        Some(self.transformers[index].as_mut())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (dyn Transformer + 'static)> {
        self.transformers.iter_mut().map(|t| t.as_mut())
    }
}

impl std::fmt::Debug for TransformerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
