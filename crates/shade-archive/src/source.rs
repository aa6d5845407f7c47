use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::{DateTime, ZipArchive};

use crate::error::ArchiveError;
use crate::time::datetime_from_system_time;

/// Where merged entries come from: an exploded class directory or a zip/jar file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArchiveSource {
    Directory(PathBuf),
    Archive(PathBuf),
}

impl ArchiveSource {
    /// Classifies `path` by what is on disk.
    pub fn detect(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_dir() {
            ArchiveSource::Directory(path)
        } else {
            ArchiveSource::Archive(path)
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ArchiveSource::Directory(path) | ArchiveSource::Archive(path) => path,
        }
    }
}

impl std::fmt::Display for ArchiveSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path().display())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Metadata of one entry; contents are read on demand via [`OpenSource::read`].
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Forward-slash path relative to the source root, without a trailing `/`.
    pub path: String,
    pub kind: EntryKind,
    pub last_modified: Option<DateTime>,
    pub unix_mode: Option<u32>,
}

impl ArchiveEntry {
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

pub struct OpenSource {
    source: ArchiveSource,
    entries: Vec<ArchiveEntry>,
    backing: Backing,
}

enum Backing {
    Directory,
    Archive {
        zip: ZipArchive<BufReader<File>>,
        /// Zip index per listed entry.
        indices: Vec<usize>,
    },
}

impl OpenSource {
    pub fn open(source: &ArchiveSource) -> Result<Self, ArchiveError> {
        match source {
            ArchiveSource::Directory(root) => Self::open_directory(source, root),
            ArchiveSource::Archive(path) => Self::open_archive(source, path),
        }
    }

    fn open_directory(source: &ArchiveSource, root: &Path) -> Result<Self, ArchiveError> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|err| {
                let path = err.path().unwrap_or(root).to_path_buf();
                ArchiveError::io(path, err.into())
            })?;
            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let metadata = entry
                .metadata()
                .map_err(|err| ArchiveError::io(entry.path(), err.into()))?;

            entries.push(ArchiveEntry {
                path: relative,
                kind: if metadata.is_dir() {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                },
                last_modified: metadata.modified().ok().map(datetime_from_system_time),
                unix_mode: unix_mode(&metadata),
            });
        }

        Ok(Self {
            source: source.clone(),
            entries,
            backing: Backing::Directory,
        })
    }

    fn open_archive(source: &ArchiveSource, path: &Path) -> Result<Self, ArchiveError> {
        let file = File::open(path).map_err(|err| ArchiveError::io(path, err))?;
        let mut zip =
            ZipArchive::new(BufReader::new(file)).map_err(|err| ArchiveError::Zip {
                path: path.to_path_buf(),
                source: err,
            })?;

        let mut entries = Vec::with_capacity(zip.len());
        let mut indices = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let file = zip.by_index(index).map_err(|err| ArchiveError::Zip {
                path: path.to_path_buf(),
                source: err,
            })?;
            let name = file.name().trim_start_matches('/');
            let (name, kind) = match name.strip_suffix('/') {
                Some(dir) => (dir, EntryKind::Directory),
                None if file.is_dir() => (name, EntryKind::Directory),
                None => (name, EntryKind::File),
            };
            if name.is_empty() {
                continue;
            }
            entries.push(ArchiveEntry {
                path: name.to_string(),
                kind,
                last_modified: Some(file.last_modified()),
                unix_mode: file.unix_mode(),
            });
            indices.push(index);
        }

        Ok(Self {
            source: source.clone(),
            entries,
            backing: Backing::Archive { zip, indices },
        })
    }

    pub fn source(&self) -> &ArchiveSource {
        &self.source
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Reads the full contents of the entry at `index` in [`Self::entries`].
    pub fn read(&mut self, index: usize) -> Result<Vec<u8>, ArchiveError> {
        let Some(entry) = self.entries.get(index) else {
            return Err(ArchiveError::io(
                self.source.path(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such entry"),
            ));
        };

        match &mut self.backing {
            Backing::Directory => {
                let path = self.source.path().join(&entry.path);
                std::fs::read(&path).map_err(|err| ArchiveError::io(path, err))
            }
            Backing::Archive { zip, indices } => {
                let archive = self.source.path();
                let mut file = zip.by_index(indices[index]).map_err(|err| ArchiveError::Zip {
                    path: archive.to_path_buf(),
                    source: err,
                })?;
                let mut bytes = Vec::with_capacity(file.size() as usize);
                file.read_to_end(&mut bytes)
                    .map_err(|err| ArchiveError::io(archive.join(&entry.path), err))?;
                Ok(bytes)
            }
        }
    }
}

#[cfg(unix)]
fn unix_mode(metadata: &std::fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode())
}

#[cfg(not(unix))]
fn unix_mode(_metadata: &std::fs::Metadata) -> Option<u32> {
    None
}
