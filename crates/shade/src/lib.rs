//! Merges a project's compiled output and its dependency archives into one
//! jar, relocating packages and merging resources along the way.
//!
//! Sources are processed strictly in the order given: the project's own
//! output first, then dependency archives. Within a source, entries are
//! processed in archive order. Every entry that passes the path filter and
//! is not an unused class is routed to the first transformer accepting it,
//! or else relocated (class files) or copied verbatim. After the last source
//! each transformer holding a result writes it once.
//!
//! ```no_run
//! use shade::{merge, DuplicatesStrategy, ShadeConfig};
//! use shade_archive::ArchiveSource;
//! use shade_relocation::SimpleRelocator;
//! use shade_transform::ServiceFileTransformer;
//!
//! let config = ShadeConfig::new("build/app-all.jar")
//!     .with_relocator(SimpleRelocator::new("com.google.common", Some("app.shaded.guava")))
//!     .with_transformer(ServiceFileTransformer::new())
//!     .with_duplicates(DuplicatesStrategy::Warn);
//! let report = merge(
//!     &[
//!         ArchiveSource::Directory("build/classes".into()),
//!         ArchiveSource::Archive("libs/guava.jar".into()),
//!     ],
//!     config,
//! )?;
//! println!("{} entries written", report.entries_written);
//! # Ok::<(), shade::ShadeError>(())
//! ```

#![forbid(unsafe_code)]

mod config;
mod engine;
mod error;
mod minimize;
mod report;

pub use config::{CancellationFlag, DuplicatesStrategy, ShadeConfig};
pub use engine::merge;
pub use error::ShadeError;
pub use minimize::{dependency_sources, find_unused_classes, Minimization};
pub use report::{DuplicateCounts, MergeReport};
