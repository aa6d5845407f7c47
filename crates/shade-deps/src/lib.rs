//! Dependency selection for the shader.
//!
//! A [`DependencyGraph`] is the already-resolved dependency tree handed over
//! by the build. [`DependencyFilter`] decides which nodes' artifacts take part
//! in a merge, and [`UnusedClassTracker`] computes which classes are
//! unreachable from the project's own code when minimizing.

#![forbid(unsafe_code)]

mod error;
mod filter;
mod graph;
mod spec;
mod unused;

pub use error::DependencyError;
pub use filter::{DependencyFilter, FilterMode, FilterSpec, Resolution};
pub use graph::{Coordinates, DependencyGraph, DependencyNode, NodeId};
pub use spec::DependencySpec;
pub use unused::{class_name_for_path, UnusedClassTracker};
