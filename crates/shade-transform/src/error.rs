use std::path::PathBuf;

use crate::duplicates::DuplicateViolations;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error processing XML resource `{path}`: {message}")]
    Xml { path: String, message: String },

    #[error("invalid regular expression `{pattern}`: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("{0}")]
    DuplicateContent(DuplicateViolations),

    #[error(transparent)]
    Archive(#[from] shade_archive::ArchiveError),
}
