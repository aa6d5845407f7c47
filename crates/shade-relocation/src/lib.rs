//! Relocation rules and the package mapper that applies them to class names,
//! descriptors, resource paths and class files.

mod class;
mod error;
mod relocator;
mod set;

pub use class::{relocate_class, ClassRemapper, RelocatedClass};
pub use error::RelocationError;
pub use relocator::{Relocator, SimpleRelocator};
pub use set::{PackageMapper, RelocatorSet};
