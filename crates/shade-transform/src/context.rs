use shade_relocation::RelocatorSet;

use crate::error::TransformError;

/// A source entry offered to [`Transformer::can_transform_resource`](crate::Transformer::can_transform_resource).
#[derive(Debug, Clone, Copy)]
pub struct ResourceEntry<'a> {
    /// Path inside the source, before relocation.
    pub path: &'a str,
    /// Display name of the source the entry came from.
    pub origin: &'a str,
    pub contents: &'a [u8],
}

/// One matched entry handed to [`Transformer::transform`](crate::Transformer::transform).
#[derive(Debug, Clone, Copy)]
pub struct TransformerContext<'a> {
    /// Output path after relocation.
    pub path: &'a str,
    pub origin: &'a str,
    pub contents: &'a [u8],
    pub relocators: &'a RelocatorSet,
}

/// Destination for the entries a transformer emits when drained.
pub trait EntrySink {
    fn write_entry(&mut self, path: &str, contents: &[u8]) -> Result<(), TransformError>;
}

/// Collects emitted entries in memory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemorySink {
    pub entries: Vec<(String, Vec<u8>)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, c)| c.as_slice())
    }

    pub fn text(&self, path: &str) -> Option<String> {
        self.get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|(p, _)| p.as_str()).collect()
    }
}

impl EntrySink for MemorySink {
    fn write_entry(&mut self, path: &str, contents: &[u8]) -> Result<(), TransformError> {
        self.entries.push((path.to_string(), contents.to_vec()));
        Ok(())
    }
}
