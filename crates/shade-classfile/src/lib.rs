#![forbid(unsafe_code)]
//! Java class-file model with full read/write fidelity.
//!
//! [`ClassFile::parse`] resolves every constant-pool reference into names and
//! values; [`ClassFile::to_bytes`] writes the class back with a freshly built
//! pool, so renamed classes leave no stale entries behind. [`Remapper`] is the
//! seam used to rename classes, descriptors, signatures and string literals.

mod annotation;
mod attribute;
mod classfile;
mod code;
mod constant_pool;
mod descriptor;
mod error;
mod mutf8;
mod reader;
mod references;
mod remap;
mod signature;

pub use crate::annotation::{Annotation, ConstValue, ElementValue, TypeAnnotation};
pub use crate::attribute::{
    Attribute, BootstrapMethod, InnerClassInfo, LocalVariable, MethodParameter, ModuleAttribute,
    ModulePackageAccess, ModuleProvides, ModuleRequires, NameAndType, RecordComponent,
};
pub use crate::classfile::{ClassFile, ClassMember};
pub use crate::code::{Code, CodeConstant, ExceptionHandler, StackMapTable};
pub use crate::constant_pool::{Constant, MemberRef};
pub use crate::descriptor::{parse_field_descriptor, parse_method_descriptor};
pub use crate::descriptor::{remap_field_descriptor, remap_method_descriptor};
pub use crate::descriptor::{BaseType, FieldType, MethodDescriptor, ReturnType};
pub use crate::error::{Error, Result};
pub use crate::mutf8::JavaString;
pub use crate::remap::{remap_class, Remapper};
pub use crate::signature::{
    parse_class_signature, parse_field_signature, parse_method_signature, ClassSignature,
    ClassTypeSignature, FieldTypeSignature, InnerClassType, MethodSignature, TypeArgument,
    TypeParameter, TypeSignature,
};

/// Access flags used when building classes by hand.
pub mod access {
    pub const PUBLIC: u16 = 0x0001;
    pub const PRIVATE: u16 = 0x0002;
    pub const STATIC: u16 = 0x0008;
    pub const FINAL: u16 = 0x0010;
    pub const SUPER: u16 = 0x0020;
    pub const INTERFACE: u16 = 0x0200;
    pub const ABSTRACT: u16 = 0x0400;
}
