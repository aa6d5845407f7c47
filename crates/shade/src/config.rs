use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use shade_archive::{ArchiveError, Compression, OutputOptions, PatternSet};
use shade_relocation::{Relocator, RelocatorSet};
use shade_transform::{Transformer, TransformerSet};

/// What happens when a second source produces an already visited output path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DuplicatesStrategy {
    /// Write the entry again. Readers see the first copy.
    Include,
    /// Keep the first copy silently.
    #[default]
    Exclude,
    /// Keep the first copy and log a warning.
    Warn,
    /// Keep the first copy; differing contents fail the merge once all
    /// sources were read.
    Fail,
}

impl DuplicatesStrategy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "include" => Some(Self::Include),
            "exclude" => Some(Self::Exclude),
            "warn" => Some(Self::Warn),
            "fail" => Some(Self::Fail),
            _ => None,
        }
    }
}

/// Stops a merge before its next entry.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Everything one merge needs. Transformers accumulate state, so a
/// configuration is consumed by [`merge`](crate::merge).
#[derive(Debug)]
pub struct ShadeConfig {
    pub output: PathBuf,
    /// Entry path filter; starts with the default excludes.
    pub patterns: PatternSet,
    pub relocators: RelocatorSet,
    pub transformers: TransformerSet,
    pub duplicates: DuplicatesStrategy,
    pub output_options: OutputOptions,
    /// Fails the merge when any output path would be written twice,
    /// whatever the contents.
    pub fail_on_duplicate_entries: bool,
    /// Internal names of classes to drop, usually from
    /// [`find_unused_classes`](crate::find_unused_classes).
    pub unused_classes: BTreeSet<String>,
    pub cancellation: CancellationFlag,
}

impl Default for ShadeConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("shaded.jar"),
            patterns: PatternSet::with_default_excludes(),
            relocators: RelocatorSet::new(),
            transformers: TransformerSet::new(),
            duplicates: DuplicatesStrategy::default(),
            output_options: OutputOptions::default(),
            fail_on_duplicate_entries: false,
            unused_classes: BTreeSet::new(),
            cancellation: CancellationFlag::new(),
        }
    }
}

impl ShadeConfig {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            ..Self::default()
        }
    }

    pub fn with_include(mut self, pattern: &str) -> Result<Self, ArchiveError> {
        self.patterns.include(pattern)?;
        Ok(self)
    }

    pub fn with_exclude(mut self, pattern: &str) -> Result<Self, ArchiveError> {
        self.patterns.exclude(pattern)?;
        Ok(self)
    }

    pub fn with_relocator(mut self, relocator: impl Relocator + 'static) -> Self {
        self.relocators.push(relocator);
        self
    }

    pub fn with_transformer(mut self, transformer: impl Transformer + 'static) -> Self {
        self.transformers.register(Box::new(transformer));
        self
    }

    pub fn with_duplicates(mut self, strategy: DuplicatesStrategy) -> Self {
        self.duplicates = strategy;
        self
    }

    pub fn with_zip64(mut self, zip64: bool) -> Self {
        self.output_options.zip64 = zip64;
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.output_options.compression = compression;
        self
    }

    pub fn with_reproducible(mut self, reproducible: bool) -> Self {
        self.output_options.reproducible = reproducible;
        self
    }

    pub fn with_fail_on_duplicate_entries(mut self, fail: bool) -> Self {
        self.fail_on_duplicate_entries = fail;
        self
    }

    pub fn with_unused_classes(mut self, classes: BTreeSet<String>) -> Self {
        self.unused_classes = classes;
        self
    }

    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = flag;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_excludes_signatures() {
        let config = ShadeConfig::default();
        assert!(!config.patterns.is_included("META-INF/BC.SF"));
        assert!(!config.patterns.is_included("module-info.class"));
        assert!(config.patterns.is_included("META-INF/MANIFEST.MF"));
        assert_eq!(config.duplicates, DuplicatesStrategy::Exclude);
    }

    #[test]
    fn strategies_parse_case_insensitively() {
        assert_eq!(DuplicatesStrategy::parse("FAIL"), Some(DuplicatesStrategy::Fail));
        assert_eq!(DuplicatesStrategy::parse(" warn "), Some(DuplicatesStrategy::Warn));
        assert_eq!(DuplicatesStrategy::parse("merge"), None);
    }

    #[test]
    fn cancellation_is_shared_between_clones() {
        let flag = CancellationFlag::new();
        let config = ShadeConfig::default().with_cancellation(flag.clone());
        flag.cancel();
        assert!(config.cancellation.is_cancelled());
    }
}
