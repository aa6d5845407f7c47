//! Name remapping over a parsed [`ClassFile`].

use crate::annotation::{Annotation, ConstValue, ElementValue, TypeAnnotation};
use crate::attribute::{Attribute, InnerClassInfo};
use crate::classfile::{ClassFile, ClassMember};
use crate::code::Code;
use crate::constant_pool::{Constant, MemberRef};
use crate::descriptor::{remap_field_descriptor, remap_method_descriptor};
use crate::error::Result;
use crate::mutf8::JavaString;
use crate::signature::{parse_class_signature, parse_field_signature, parse_method_signature};

const KOTLIN_METADATA: &str = "Lkotlin/Metadata;";

/// Supplies new names while a class is rewritten.
pub trait Remapper {
    /// Maps an internal class name (`com/acme/Foo`). Also used for
    /// `<package>/<SourceFile>` paths, whose last segment is kept.
    fn map(&mut self, internal_name: &str) -> String;

    /// Maps a string literal (`ldc` operands, `ConstantValue`, annotation values).
    fn map_value(&mut self, value: &str) -> String {
        value.to_string()
    }
}

/// Parses `bytes`, remaps every symbolic reference, and serializes the result.
pub fn remap_class(bytes: &[u8], remapper: &mut dyn Remapper) -> Result<Vec<u8>> {
    let mut class = ClassFile::parse(bytes)?;
    class.remap(remapper);
    class.to_bytes()
}

#[derive(Clone, Copy)]
enum SignatureKind {
    Class,
    Method,
    Field,
}

struct Mapper<'a> {
    remapper: &'a mut dyn Remapper,
}

impl Mapper<'_> {
    fn name(&mut self, name: &str) -> String {
        self.remapper.map(name)
    }

    fn names(&mut self, names: &mut [String]) {
        for name in names {
            *name = self.name(name);
        }
    }

    /// Class constants may hold array descriptors.
    fn type_name(&mut self, name: &str) -> String {
        if name.starts_with('[') {
            self.field_desc(name)
        } else {
            self.name(name)
        }
    }

    fn field_desc(&mut self, desc: &str) -> String {
        let remapper = &mut *self.remapper;
        remap_field_descriptor(desc, &mut |n: &str| remapper.map(n))
            .unwrap_or_else(|_| desc.to_string())
    }

    fn method_desc(&mut self, desc: &str) -> String {
        let remapper = &mut *self.remapper;
        remap_method_descriptor(desc, &mut |n: &str| remapper.map(n))
            .unwrap_or_else(|_| desc.to_string())
    }

    fn value(&mut self, value: &JavaString) -> JavaString {
        match value {
            JavaString::Text(text) => JavaString::Text(self.remapper.map_value(text)),
            JavaString::Raw(_) => value.clone(),
        }
    }

    fn signature(&mut self, sig: &str, kind: SignatureKind) -> String {
        let remapper = &mut *self.remapper;
        let map = &mut |n: &str| remapper.map(n);
        let mapped = match kind {
            SignatureKind::Class => parse_class_signature(sig).map(|mut s| {
                s.map_names(map);
                s.to_string()
            }),
            SignatureKind::Method => parse_method_signature(sig).map(|mut s| {
                s.map_names(map);
                s.to_string()
            }),
            SignatureKind::Field => parse_field_signature(sig).map(|mut s| {
                s.map_names(map);
                s.to_string()
            }),
        };
        match mapped {
            Ok(mapped) => mapped,
            Err(err) => {
                tracing::warn!(
                    target = "shade.classfile",
                    signature = sig,
                    error = %err,
                    "keeping unparsable generic signature unchanged"
                );
                sig.to_string()
            }
        }
    }

    fn member_ref(&mut self, member: &mut MemberRef, method: bool) {
        member.owner = self.type_name(&member.owner);
        member.descriptor = if method {
            self.method_desc(&member.descriptor)
        } else {
            self.field_desc(&member.descriptor)
        };
    }

    fn constant(&mut self, constant: &mut Constant) {
        match constant {
            Constant::Class(name) => *name = self.type_name(name),
            Constant::String(value) => *value = self.value(value),
            Constant::FieldRef(member) => self.member_ref(member, false),
            Constant::MethodRef(member) | Constant::InterfaceMethodRef(member) => {
                self.member_ref(member, true)
            }
            Constant::MethodHandle { reference, .. } => self.constant(reference),
            Constant::MethodType(desc) => *desc = self.method_desc(desc),
            Constant::Dynamic { descriptor, .. } => *descriptor = self.field_desc(descriptor),
            Constant::InvokeDynamic { descriptor, .. } => {
                *descriptor = self.method_desc(descriptor)
            }
            Constant::Integer(_)
            | Constant::Float(_)
            | Constant::Long(_)
            | Constant::Double(_)
            | Constant::Module(_)
            | Constant::Package(_) => {}
        }
    }

    fn annotation(&mut self, annotation: &mut Annotation) {
        let kotlin = annotation.type_descriptor == KOTLIN_METADATA;
        annotation.type_descriptor = self.field_desc(&annotation.type_descriptor);
        for (name, value) in &mut annotation.elements {
            if kotlin && name == "d2" {
                self.kotlin_strings(value);
            } else {
                self.element_value(value);
            }
        }
    }

    fn kotlin_strings(&mut self, value: &mut ElementValue) {
        match value {
            ElementValue::Array(values) => {
                for value in values {
                    match value {
                        ElementValue::Const(ConstValue::String(JavaString::Text(text)))
                            if text.starts_with('(') =>
                        {
                            *text = self.method_desc(text);
                        }
                        other => self.element_value(other),
                    }
                }
            }
            other => self.element_value(other),
        }
    }

    fn element_value(&mut self, value: &mut ElementValue) {
        match value {
            ElementValue::Const(ConstValue::String(s)) => *s = self.value(s),
            ElementValue::Const(_) => {}
            ElementValue::Enum {
                type_descriptor, ..
            } => *type_descriptor = self.field_desc(type_descriptor),
            ElementValue::Class(desc) => *desc = self.field_desc(desc),
            ElementValue::Annotation(annotation) => self.annotation(annotation),
            ElementValue::Array(values) => {
                for value in values {
                    self.element_value(value);
                }
            }
        }
    }

    fn annotations(&mut self, annotations: &mut [Annotation]) {
        for annotation in annotations {
            self.annotation(annotation);
        }
    }

    fn type_annotations(&mut self, annotations: &mut [TypeAnnotation]) {
        for annotation in annotations {
            self.annotation(&mut annotation.annotation);
        }
    }

    fn inner_class(&mut self, inner: &mut InnerClassInfo) {
        let original = inner.inner_class.clone();
        let mapped = self.name(&original);
        if let Some(inner_name) = &mut inner.inner_name {
            *inner_name = inner_simple_name(&original, &mapped, inner_name);
        }
        inner.inner_class = mapped;
        if let Some(outer) = &mut inner.outer_class {
            *outer = self.name(outer);
        }
    }

    fn code(&mut self, code: &mut Code) {
        for operand in &mut code.constants {
            self.constant(&mut operand.constant);
        }
        for handler in &mut code.exception_table {
            if let Some(catch_type) = &mut handler.catch_type {
                *catch_type = self.name(catch_type);
            }
        }
        self.attributes(&mut code.attributes, SignatureKind::Field);
    }

    fn attributes(&mut self, attributes: &mut [Attribute], signature_kind: SignatureKind) {
        for attribute in attributes {
            match attribute {
                Attribute::Code(code) => self.code(code),
                Attribute::ConstantValue(constant) => self.constant(constant),
                Attribute::Signature(sig) => *sig = self.signature(sig, signature_kind),
                // Handled by `ClassFile::remap`, which knows the package.
                Attribute::SourceFile(_) => {}
                Attribute::Exceptions(classes)
                | Attribute::NestMembers(classes)
                | Attribute::PermittedSubclasses(classes) => self.names(classes),
                Attribute::InnerClasses(inners) => {
                    for inner in inners {
                        self.inner_class(inner);
                    }
                }
                Attribute::EnclosingMethod { class, method } => {
                    *class = self.name(class);
                    if let Some(method) = method {
                        method.descriptor = self.method_desc(&method.descriptor);
                    }
                }
                Attribute::RuntimeVisibleAnnotations(annotations)
                | Attribute::RuntimeInvisibleAnnotations(annotations) => {
                    self.annotations(annotations)
                }
                Attribute::RuntimeVisibleParameterAnnotations(params)
                | Attribute::RuntimeInvisibleParameterAnnotations(params) => {
                    for annotations in params {
                        self.annotations(annotations);
                    }
                }
                Attribute::RuntimeVisibleTypeAnnotations(annotations)
                | Attribute::RuntimeInvisibleTypeAnnotations(annotations) => {
                    self.type_annotations(annotations)
                }
                Attribute::AnnotationDefault(value) => self.element_value(value),
                Attribute::BootstrapMethods(methods) => {
                    for method in methods {
                        self.constant(&mut method.method);
                        for argument in &mut method.arguments {
                            self.constant(argument);
                        }
                    }
                }
                Attribute::NestHost(class) | Attribute::ModuleMainClass(class) => {
                    *class = self.name(class)
                }
                Attribute::Record(components) => {
                    for component in components {
                        component.descriptor = self.field_desc(&component.descriptor);
                        self.attributes(&mut component.attributes, SignatureKind::Field);
                    }
                }
                Attribute::LocalVariableTable(vars) => {
                    for var in vars {
                        var.descriptor = self.field_desc(&var.descriptor);
                    }
                }
                Attribute::LocalVariableTypeTable(vars) => {
                    for var in vars {
                        var.descriptor = self.signature(&var.descriptor, SignatureKind::Field);
                    }
                }
                Attribute::StackMapTable(table) => {
                    for (_, class) in &mut table.classes {
                        *class = self.type_name(class);
                    }
                }
                Attribute::Module(module) => {
                    self.names(&mut module.uses);
                    for provides in &mut module.provides {
                        provides.service = self.name(&provides.service);
                        self.names(&mut provides.with);
                    }
                }
                Attribute::MethodParameters(_)
                | Attribute::ModulePackages(_)
                | Attribute::Other { .. } => {}
            }
        }
    }

    fn member(&mut self, member: &mut ClassMember, method: bool) {
        if method {
            member.descriptor = self.method_desc(&member.descriptor);
            self.attributes(&mut member.attributes, SignatureKind::Method);
        } else {
            member.descriptor = self.field_desc(&member.descriptor);
            self.attributes(&mut member.attributes, SignatureKind::Field);
        }
    }
}

/// Simple name of an inner class after its binary name was remapped.
fn inner_simple_name(original: &str, mapped: &str, inner_name: &str) -> String {
    if original == mapped {
        return inner_name.to_string();
    }
    if let (Some(a), Some(b)) = (original.rfind('/'), mapped.rfind('/')) {
        if original[a..] == mapped[b..] {
            return inner_name.to_string();
        }
    }
    match mapped.rfind('$') {
        Some(dollar) => mapped[dollar + 1..]
            .trim_start_matches(|c: char| c.is_ascii_digit())
            .to_string(),
        None => inner_name.to_string(),
    }
}

impl ClassFile {
    /// Rewrites every class reference, descriptor, signature and string
    /// literal in place.
    pub fn remap(&mut self, remapper: &mut dyn Remapper) {
        let package = match self.this_class.rfind('/') {
            Some(slash) => self.this_class[..=slash].to_string(),
            None => String::new(),
        };

        let mut mapper = Mapper { remapper };
        self.this_class = mapper.name(&self.this_class);
        if let Some(super_class) = &mut self.super_class {
            *super_class = mapper.name(super_class);
        }
        mapper.names(&mut self.interfaces);
        for field in &mut self.fields {
            mapper.member(field, false);
        }
        for method in &mut self.methods {
            mapper.member(method, true);
        }
        mapper.attributes(&mut self.attributes, SignatureKind::Class);

        for attribute in &mut self.attributes {
            if let Attribute::SourceFile(source) = attribute {
                let mapped = mapper.name(&format!("{package}{source}"));
                *source = match mapped.rfind('/') {
                    Some(slash) => mapped[slash + 1..].to_string(),
                    None => mapped,
                };
            }
        }
    }
}
