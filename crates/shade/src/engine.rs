use std::collections::HashSet;
use std::time::Instant;

use shade_archive::{ArchiveEntry, ArchiveSource, ArchiveWriter, EntryMetadata, OpenSource};
use shade_deps::class_name_for_path;
use shade_relocation::relocate_class;
use shade_transform::{
    ContentTracker, EntrySink, ResourceEntry, TransformError, TransformerContext,
};

use crate::config::{DuplicatesStrategy, ShadeConfig};
use crate::error::ShadeError;
use crate::report::MergeReport;

/// Merges `sources`, in order, into `config.output`.
///
/// The output is staged next to its final location and only moved into
/// place when every source and transformer succeeded.
pub fn merge(sources: &[ArchiveSource], config: ShadeConfig) -> Result<MergeReport, ShadeError> {
    let span = tracing::info_span!(
        "merge",
        output = %config.output.display(),
        sources = sources.len()
    );
    let _guard = span.enter();
    let started = Instant::now();

    let writer = ArchiveWriter::create(&config.output, config.output_options)?;
    let track_contents =
        config.duplicates == DuplicatesStrategy::Fail || config.fail_on_duplicate_entries;
    let mut merger = Merger {
        report: MergeReport {
            output: config.output.clone(),
            ..MergeReport::default()
        },
        contents: track_contents.then(ContentTracker::new),
        visited: HashSet::new(),
        writer,
        config,
    };

    for source in sources {
        merger.copy_source(source)?;
    }
    merger.drain_transformers()?;
    merger.check_duplicates()?;

    let Merger {
        writer, mut report, ..
    } = merger;
    report.entries_written = writer.entry_count();
    report.output = writer.finish()?;
    report.elapsed = started.elapsed();

    tracing::info!(
        target = "shade",
        entries = report.entries_written,
        relocated = report.classes_relocated,
        transformed = report.transformed_entries,
        unused = report.unused_classes.len(),
        duplicates = report.duplicates.total(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "merge finished"
    );
    Ok(report)
}

struct Merger {
    config: ShadeConfig,
    writer: ArchiveWriter,
    /// Output paths already holding an entry.
    visited: HashSet<String>,
    contents: Option<ContentTracker>,
    report: MergeReport,
}

fn metadata(entry: &ArchiveEntry) -> EntryMetadata {
    EntryMetadata {
        last_modified: entry.last_modified,
        unix_mode: entry.unix_mode,
    }
}

impl Merger {
    fn check_cancelled(&self) -> Result<(), ShadeError> {
        if self.config.cancellation.is_cancelled() {
            tracing::info!(target = "shade", "merge cancelled");
            return Err(ShadeError::Cancelled);
        }
        Ok(())
    }

    fn copy_source(&mut self, source: &ArchiveSource) -> Result<(), ShadeError> {
        self.check_cancelled()?;
        let malformed = |err| ShadeError::MalformedArchive {
            source_path: source.path().to_path_buf(),
            source: err,
        };
        let mut open = OpenSource::open(source).map_err(malformed)?;
        let is_archive = matches!(source, ArchiveSource::Archive(_));
        self.report.sources += 1;
        if is_archive {
            self.report.jars += 1;
        }

        let origin = source.to_string();
        tracing::debug!(
            target = "shade",
            source = %origin,
            entries = open.entries().len(),
            "copying source"
        );

        for index in 0..open.entries().len() {
            self.check_cancelled()?;
            let entry = open.entries()[index].clone();
            if !self.config.patterns.is_included(&entry.path) {
                self.report.filtered_entries += 1;
                continue;
            }
            if entry.is_directory() {
                // Directories inside archives are recreated from the files they hold.
                if !is_archive {
                    let mapped = self.config.relocators.map_entry_path(&entry.path);
                    self.writer.ensure_directory(&mapped, &metadata(&entry))?;
                    self.visited.insert(mapped);
                }
                continue;
            }

            let bytes = open.read(index).map_err(malformed)?;
            self.copy_entry(&origin, &entry, bytes)?;
        }
        Ok(())
    }

    fn copy_entry(&mut self, origin: &str, entry: &ArchiveEntry, bytes: Vec<u8>) -> Result<(), ShadeError> {
        let path = entry.path.as_str();
        let class_name = class_name_for_path(path);
        if let Some(name) = class_name.filter(|name| self.config.unused_classes.contains(*name)) {
            tracing::debug!(target = "shade", class = name, "dropping unused class");
            self.report.unused_classes.push(name.to_string());
            return Ok(());
        }

        let relocators = &self.config.relocators;
        let mapped = relocators.map_entry_path(path);

        let resource = ResourceEntry {
            path,
            origin,
            contents: &bytes,
        };
        if let Some(transformer) = self.config.transformers.find(&resource) {
            let context = TransformerContext {
                path: &mapped,
                origin,
                contents: &bytes,
                relocators,
            };
            transformer
                .transform(&context)
                .map_err(|source| ShadeError::Transform {
                    transformer: transformer.name().to_string(),
                    path: format!("{origin}!/{path}"),
                    source,
                })?;
            self.report.transformed_entries += 1;
            return Ok(());
        }

        let new_content = match &mut self.contents {
            Some(tracker) => tracker.record(&mapped, origin, &bytes),
            None => true,
        };
        if self.visited.contains(&mapped) {
            let counts = &mut self.report.duplicates;
            match self.config.duplicates {
                DuplicatesStrategy::Include => counts.included += 1,
                DuplicatesStrategy::Exclude => {
                    tracing::trace!(target = "shade", path = %mapped, source = origin, "duplicate entry dropped");
                    counts.excluded += 1;
                    return Ok(());
                }
                DuplicatesStrategy::Warn => {
                    tracing::warn!(target = "shade", path = %mapped, source = origin, "duplicate entry dropped");
                    counts.warned += 1;
                    return Ok(());
                }
                DuplicatesStrategy::Fail => {
                    if new_content {
                        counts.conflicting += 1;
                    } else {
                        counts.excluded += 1;
                    }
                    return Ok(());
                }
            }
        }

        let data = if class_name.is_some() && !relocators.is_empty() {
            let relocated = relocate_class(path, &bytes, relocators).map_err(|source| {
                ShadeError::ClassRemap {
                    path: format!("{origin}!/{path}"),
                    source,
                }
            })?;
            if relocated.changed {
                self.report.classes_relocated += 1;
            }
            relocated.bytes
        } else {
            bytes
        };

        self.writer.write_file(&mapped, &data, &metadata(entry))?;
        self.visited.insert(mapped);
        Ok(())
    }

    fn drain_transformers(&mut self) -> Result<(), ShadeError> {
        let mut sink = OutputSink {
            writer: &mut self.writer,
            visited: &mut self.visited,
        };
        for transformer in self.config.transformers.iter_mut() {
            if !transformer.has_transformed_resource() {
                continue;
            }
            tracing::debug!(target = "shade", transformer = transformer.name(), "writing transformed resources");
            transformer
                .modify_output(&mut sink)
                .map_err(|source| match source {
                    TransformError::DuplicateContent(violations) => {
                        ShadeError::DuplicateEntries(violations)
                    }
                    source => ShadeError::Transform {
                        transformer: transformer.name().to_string(),
                        path: "(merged output)".to_string(),
                        source,
                    },
                })?;
        }
        Ok(())
    }

    fn check_duplicates(&self) -> Result<(), ShadeError> {
        let Some(tracker) = &self.contents else {
            return Ok(());
        };
        let violations = if self.config.fail_on_duplicate_entries {
            tracker.repeated(|_| true)
        } else {
            tracker.violations(|_| true)
        };
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ShadeError::DuplicateEntries(violations))
        }
    }
}

/// Writes transformer results into the merged archive.
struct OutputSink<'a> {
    writer: &'a mut ArchiveWriter,
    visited: &'a mut HashSet<String>,
}

impl EntrySink for OutputSink<'_> {
    fn write_entry(&mut self, path: &str, contents: &[u8]) -> Result<(), TransformError> {
        self.writer
            .write_file(path, contents, &EntryMetadata::default())?;
        self.visited.insert(path.to_string());
        Ok(())
    }
}
