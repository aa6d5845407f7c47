//! Utilities shared by shade tests.
//!
//! [`ClassBuilder`] produces small but valid class files; [`JarBuilder`] and
//! [`write_tree`] lay out input archives and class directories on disk, and
//! [`read_jar`] lists what a merge wrote.

mod class;
mod fixtures;

pub use class::ClassBuilder;
pub use fixtures::{read_jar, write_tree, JarBuilder, JarEntry};
