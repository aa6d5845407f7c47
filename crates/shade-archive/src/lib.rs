//! Archive plumbing for the shader: reading jars and class directories,
//! path patterns, and the staged output writer.

#![forbid(unsafe_code)]

mod error;
mod pattern;
mod source;
mod time;
mod writer;

pub use error::ArchiveError;
pub use pattern::{PathPattern, PatternSet, DEFAULT_EXCLUDES};
pub use source::{ArchiveEntry, ArchiveSource, EntryKind, OpenSource};
pub use time::{datetime_from_system_time, reproducible_timestamp};
pub use writer::{ArchiveWriter, Compression, EntryMetadata, OutputOptions};
pub use zip::DateTime;
