use std::fmt;

use sha2::{Digest, Sha256};

/// Lower-case hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// One distinct content seen at a path, with every source that supplied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentHash {
    pub sha256: String,
    pub origins: Vec<String>,
}

/// A path supplied by several sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateViolation {
    pub path: String,
    pub hashes: Vec<ContentHash>,
}

/// Every duplicate-content violation of one merge, reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateViolations(pub Vec<DuplicateViolation>);

impl DuplicateViolations {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DuplicateViolation> {
        self.0.iter()
    }
}

impl fmt::Display for DuplicateViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "found {} duplicated path(s):",
            self.0.len()
        )?;
        for violation in &self.0 {
            writeln!(f, "  * {}", violation.path)?;
            for hash in &violation.hashes {
                for origin in &hash.origins {
                    writeln!(f, "    * {origin} (SHA256: {})", hash.sha256)?;
                }
            }
        }
        Ok(())
    }
}

/// Per-path content hashes, in first-seen order.
#[derive(Debug, Default, Clone)]
pub struct ContentTracker {
    paths: Vec<(String, Vec<ContentHash>)>,
    index: std::collections::HashMap<String, usize>,
}

impl ContentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `contents` for `path`; returns true if this content is new for the path.
    pub fn record(&mut self, path: &str, origin: &str, contents: &[u8]) -> bool {
        let sha256 = sha256_hex(contents);
        let slot = *self.index.entry(path.to_string()).or_insert_with(|| {
            self.paths.push((path.to_string(), Vec::new()));
            self.paths.len() - 1
        });
        let hashes = &mut self.paths[slot].1;
        match hashes.iter_mut().find(|h| h.sha256 == sha256) {
            Some(existing) => {
                existing.origins.push(origin.to_string());
                false
            }
            None => {
                hashes.push(ContentHash {
                    sha256,
                    origins: vec![origin.to_string()],
                });
                true
            }
        }
    }

    /// Paths seen with more than one distinct content, filtered by `check`.
    pub fn violations(&self, mut check: impl FnMut(&str) -> bool) -> DuplicateViolations {
        DuplicateViolations(
            self.paths
                .iter()
                .filter(|(path, hashes)| hashes.len() > 1 && check(path))
                .map(|(path, hashes)| DuplicateViolation {
                    path: path.clone(),
                    hashes: hashes.clone(),
                })
                .collect(),
        )
    }

    /// Paths recorded more than once, whatever their contents.
    pub fn repeated(&self, mut check: impl FnMut(&str) -> bool) -> DuplicateViolations {
        DuplicateViolations(
            self.paths
                .iter()
                .filter(|(path, hashes)| {
                    hashes.iter().map(|h| h.origins.len()).sum::<usize>() > 1 && check(path)
                })
                .map(|(path, hashes)| DuplicateViolation {
                    path: path.clone(),
                    hashes: hashes.clone(),
                })
                .collect(),
        )
    }

    pub fn clear(&mut self) {
        self.paths.clear();
        self.index.clear();
    }
}
