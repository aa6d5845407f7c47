use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a readable archive: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("failed to write output entry `{entry}`: {source}")]
    Write {
        entry: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("invalid path pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("archive contains more than 65535 entries; enable zip64 to write it")]
    TooManyEntries,
}

impl ArchiveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArchiveError::Io {
            path: path.into(),
            source,
        }
    }
}
