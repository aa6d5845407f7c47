use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use zip::write::{FileOptions, ZipWriter};
use zip::{CompressionMethod, DateTime};

use crate::error::ArchiveError;
use crate::time::{now, reproducible_timestamp};

const DEFAULT_FILE_MODE: u32 = 0o644;
const DEFAULT_DIR_MODE: u32 = 0o755;
const MAX_CLASSIC_ENTRIES: usize = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    Stored,
    #[default]
    Deflated,
}

impl From<Compression> for CompressionMethod {
    fn from(value: Compression) -> Self {
        match value {
            Compression::Stored => CompressionMethod::Stored,
            Compression::Deflated => CompressionMethod::Deflated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputOptions {
    pub zip64: bool,
    pub compression: Compression,
    /// Fixed timestamps and permissions, independent of the inputs.
    pub reproducible: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            zip64: false,
            compression: Compression::Deflated,
            reproducible: false,
        }
    }
}

/// Timestamp and permission bits carried over from a source entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryMetadata {
    pub last_modified: Option<DateTime>,
    pub unix_mode: Option<u32>,
}

/// Writes the output archive into a staging file next to the target.
///
/// Nothing appears at the target path until [`ArchiveWriter::finish`]
/// succeeds; dropping the writer discards the staged file.
pub struct ArchiveWriter {
    target: PathBuf,
    zip: ZipWriter<NamedTempFile>,
    options: OutputOptions,
    directories: HashSet<String>,
    entries: usize,
}

impl ArchiveWriter {
    pub fn create(target: &Path, options: OutputOptions) -> Result<Self, ArchiveError> {
        let parent = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|err| ArchiveError::io(&parent, err))?;
        let staged = NamedTempFile::new_in(&parent).map_err(|err| ArchiveError::io(&parent, err))?;

        Ok(Self {
            target: target.to_path_buf(),
            zip: ZipWriter::new(staged),
            options,
            directories: HashSet::new(),
            entries: 0,
        })
    }

    pub fn options(&self) -> &OutputOptions {
        &self.options
    }

    /// Number of entries written so far, directories included.
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    pub fn has_directory(&self, path: &str) -> bool {
        self.directories.contains(path.trim_end_matches('/'))
    }

    /// Writes a directory entry for `path` and each of its ancestors, once each.
    pub fn ensure_directory(&mut self, path: &str, meta: &EntryMetadata) -> Result<(), ArchiveError> {
        let path = path.trim_matches('/');
        if path.is_empty() || self.directories.contains(path) {
            return Ok(());
        }
        if let Some((parent, _)) = path.rsplit_once('/') {
            self.ensure_directory(parent, meta)?;
        }

        self.bump()?;
        let options = self.file_options(meta, DEFAULT_DIR_MODE);
        self.zip
            .add_directory(format!("{path}/"), options)
            .map_err(|source| ArchiveError::Write {
                entry: path.to_string(),
                source,
            })?;
        self.directories.insert(path.to_string());
        Ok(())
    }

    /// Writes a file entry, creating missing parent directory entries first.
    ///
    /// Paths are not de-duplicated here; callers decide duplicate handling.
    pub fn write_file(&mut self, path: &str, data: &[u8], meta: &EntryMetadata) -> Result<(), ArchiveError> {
        let path = path.trim_start_matches('/');
        if let Some((parent, _)) = path.rsplit_once('/') {
            self.ensure_directory(parent, meta)?;
        }

        self.bump()?;
        let options = self
            .file_options(meta, DEFAULT_FILE_MODE)
            .large_file(self.options.zip64 && data.len() as u64 >= u64::from(u32::MAX));
        let write_err = |source| ArchiveError::Write {
            entry: path.to_string(),
            source,
        };
        self.zip.start_file(path, options).map_err(write_err)?;
        self.zip
            .write_all(data)
            .map_err(|err| write_err(zip::result::ZipError::Io(err)))?;
        tracing::trace!(target = "shade.archive", entry = path, bytes = data.len(), "wrote entry");
        Ok(())
    }

    /// Finalizes the archive and moves it to the target path.
    pub fn finish(mut self) -> Result<PathBuf, ArchiveError> {
        let staged = self.zip.finish().map_err(|source| ArchiveError::Write {
            entry: "<central directory>".to_string(),
            source,
        })?;
        staged
            .persist(&self.target)
            .map_err(|err| ArchiveError::io(&self.target, err.error))?;
        tracing::debug!(
            target = "shade.archive",
            path = %self.target.display(),
            entries = self.entries,
            "archive written"
        );
        Ok(self.target)
    }

    fn bump(&mut self) -> Result<(), ArchiveError> {
        if !self.options.zip64 && self.entries >= MAX_CLASSIC_ENTRIES {
            return Err(ArchiveError::TooManyEntries);
        }
        self.entries += 1;
        Ok(())
    }

    fn file_options(&self, meta: &EntryMetadata, default_mode: u32) -> FileOptions {
        let (time, mode) = if self.options.reproducible {
            (reproducible_timestamp(), default_mode)
        } else {
            (
                meta.last_modified.unwrap_or_else(now),
                meta.unix_mode.map(|m| m & 0o777).unwrap_or(default_mode),
            )
        };
        FileOptions::default()
            .compression_method(self.options.compression.into())
            .last_modified_time(time)
            .unix_permissions(mode)
    }
}
