use std::path::PathBuf;

use shade_archive::ArchiveError;
use shade_deps::DependencyError;
use shade_relocation::RelocationError;
use shade_transform::{DuplicateViolations, TransformError};

#[derive(Debug, thiserror::Error)]
pub enum ShadeError {
    #[error("could not read source `{}`: {source}", source_path.display())]
    MalformedArchive {
        source_path: PathBuf,
        #[source]
        source: ArchiveError,
    },

    #[error("duplicate entries in the merged archive: {0}")]
    DuplicateEntries(DuplicateViolations),

    #[error("transformer {transformer} failed on `{path}`: {source}")]
    Transform {
        transformer: String,
        path: String,
        #[source]
        source: TransformError,
    },

    #[error("could not relocate class `{path}`: {source}")]
    ClassRemap {
        path: String,
        #[source]
        source: RelocationError,
    },

    #[error("failed to write the merged archive: {0}")]
    Output(#[from] ArchiveError),

    #[error(transparent)]
    Dependencies(#[from] DependencyError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("merge cancelled")]
    Cancelled,
}
