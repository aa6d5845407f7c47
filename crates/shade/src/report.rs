use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of duplicate handling, per policy decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DuplicateCounts {
    /// Written again under the include policy.
    pub included: usize,
    /// Dropped silently, or dropped because the content was identical.
    pub excluded: usize,
    pub warned: usize,
    /// Dropped with differing content under the fail policy.
    pub conflicting: usize,
}

impl DuplicateCounts {
    pub fn total(&self) -> usize {
        self.included + self.excluded + self.warned + self.conflicting
    }
}

/// Statistics of one merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    pub output: PathBuf,
    pub sources: usize,
    /// Sources that were archives rather than directories.
    pub jars: usize,
    /// Entries in the output, directories included.
    pub entries_written: usize,
    pub classes_relocated: usize,
    /// Entries routed to a transformer instead of being copied.
    pub transformed_entries: usize,
    /// Entries dropped by the path filter.
    pub filtered_entries: usize,
    /// Unused classes dropped, as internal names.
    pub unused_classes: Vec<String>,
    pub duplicates: DuplicateCounts,
    pub elapsed: Duration,
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} entries from {} sources ({} jars), {} classes relocated, {} resources transformed, \
             {} unused classes dropped, {} duplicates in {:.2?}",
            self.output.display(),
            self.entries_written,
            self.sources,
            self.jars,
            self.classes_relocated,
            self.transformed_entries,
            self.unused_classes.len(),
            self.duplicates.total(),
            self.elapsed,
        )
    }
}
