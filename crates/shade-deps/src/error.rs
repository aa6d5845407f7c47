use shade_archive::ArchiveError;

#[derive(Debug, thiserror::Error)]
pub enum DependencyError {
    #[error("invalid dependency notation `{notation}`: {message}")]
    InvalidNotation { notation: String, message: String },

    #[error("invalid pattern `{pattern}` in dependency notation: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to read class `{path}`: {source}")]
    Class {
        path: String,
        #[source]
        source: shade_classfile::Error,
    },

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}
