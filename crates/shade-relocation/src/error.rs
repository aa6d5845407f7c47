#[derive(Debug, thiserror::Error)]
pub enum RelocationError {
    #[error("relocation pattern must not be empty")]
    EmptyPattern,

    #[error("invalid raw relocation pattern `{pattern}`: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    InvalidFilter(#[from] shade_archive::ArchiveError),

    #[error("failed to relocate class `{path}`: {source}")]
    Class {
        path: String,
        #[source]
        source: shade_classfile::Error,
    },
}
