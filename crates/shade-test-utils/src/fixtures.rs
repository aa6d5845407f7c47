use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::ClassBuilder;

/// Collects entries in insertion order and writes them as a jar.
#[derive(Debug, Default, Clone)]
pub struct JarBuilder {
    entries: Vec<(String, Vec<u8>)>,
}

impl JarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: &str, contents: impl AsRef<[u8]>) -> Self {
        self.entries
            .push((path.to_string(), contents.as_ref().to_vec()));
        self
    }

    /// Adds a directory entry; `path` gets a trailing `/`.
    pub fn dir(mut self, path: &str) -> Self {
        self.entries
            .push((format!("{}/", path.trim_end_matches('/')), Vec::new()));
        self
    }

    pub fn class(self, class: &ClassBuilder) -> Self {
        let path = format!("{}.class", class.name());
        let bytes = class.to_bytes();
        self.file(&path, bytes)
    }

    /// Writes the jar to `path`, creating parent directories.
    pub fn write(&self, path: &Path) -> PathBuf {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture directories");
        }
        let file = fs::File::create(path).expect("create fixture jar");
        let mut zip = ZipWriter::new(file);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, contents) in &self.entries {
            if name.ends_with('/') {
                zip.add_directory(name.as_str(), options)
                    .expect("add fixture directory");
            } else {
                zip.start_file(name.as_str(), options)
                    .expect("start fixture entry");
                zip.write_all(contents).expect("write fixture entry");
            }
        }
        zip.finish().expect("finish fixture jar");
        path.to_path_buf()
    }
}

/// Writes `files` below `root`, creating parent directories.
pub fn write_tree(root: &Path, files: &[(&str, &[u8])]) -> PathBuf {
    for (path, contents) in files {
        let target = root.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).expect("create fixture directories");
        }
        fs::write(&target, contents).expect("write fixture file");
    }
    root.to_path_buf()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JarEntry {
    /// Directory entries keep their trailing `/`.
    pub name: String,
    pub contents: Vec<u8>,
}

impl JarEntry {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents).into_owned()
    }
}

/// Every entry of `path` in archive order, duplicates included.
pub fn read_jar(path: &Path) -> Vec<JarEntry> {
    let file = fs::File::open(path).expect("open jar");
    let mut zip = ZipArchive::new(file).expect("read jar");
    (0..zip.len())
        .map(|index| {
            let mut entry = zip.by_index(index).expect("read jar entry");
            let mut contents = Vec::new();
            entry
                .read_to_end(&mut contents)
                .expect("read jar entry contents");
            JarEntry {
                name: entry.name().to_string(),
                contents,
            }
        })
        .collect()
}
