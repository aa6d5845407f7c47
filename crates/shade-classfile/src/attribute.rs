use crate::annotation::{Annotation, ElementValue, TypeAnnotation};
use crate::code::{Code, StackMapTable};
use crate::constant_pool::{Constant, ConstantPool, ConstantPoolBuilder};
use crate::error::{Error, Result};
use crate::reader::{Reader, Writer};

#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Code(Code),
    ConstantValue(Constant),
    Signature(String),
    SourceFile(String),
    Exceptions(Vec<String>),
    InnerClasses(Vec<InnerClassInfo>),
    EnclosingMethod {
        class: String,
        method: Option<NameAndType>,
    },
    RuntimeVisibleAnnotations(Vec<Annotation>),
    RuntimeInvisibleAnnotations(Vec<Annotation>),
    RuntimeVisibleParameterAnnotations(Vec<Vec<Annotation>>),
    RuntimeInvisibleParameterAnnotations(Vec<Vec<Annotation>>),
    RuntimeVisibleTypeAnnotations(Vec<TypeAnnotation>),
    RuntimeInvisibleTypeAnnotations(Vec<TypeAnnotation>),
    AnnotationDefault(ElementValue),
    BootstrapMethods(Vec<BootstrapMethod>),
    NestHost(String),
    NestMembers(Vec<String>),
    PermittedSubclasses(Vec<String>),
    Record(Vec<RecordComponent>),
    MethodParameters(Vec<MethodParameter>),
    LocalVariableTable(Vec<LocalVariable>),
    LocalVariableTypeTable(Vec<LocalVariable>),
    StackMapTable(StackMapTable),
    Module(ModuleAttribute),
    ModulePackages(Vec<String>),
    ModuleMainClass(String),
    /// Attributes without constant-pool references (`LineNumberTable`,
    /// `Deprecated`, ...) and anything unrecognised, copied verbatim.
    Other { name: String, info: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClassInfo {
    pub inner_class: String,
    pub outer_class: Option<String>,
    pub inner_name: Option<String>,
    pub access_flags: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameAndType {
    pub name: String,
    pub descriptor: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapMethod {
    pub method: Constant,
    pub arguments: Vec<Constant>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordComponent {
    pub name: String,
    pub descriptor: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodParameter {
    pub name: Option<String>,
    pub access_flags: u16,
}

/// Entry of `LocalVariableTable` (descriptor) or `LocalVariableTypeTable` (signature).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariable {
    pub start_pc: u16,
    pub length: u16,
    pub name: String,
    pub descriptor: String,
    pub index: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleAttribute {
    pub name: String,
    pub flags: u16,
    pub version: Option<String>,
    pub requires: Vec<ModuleRequires>,
    pub exports: Vec<ModulePackageAccess>,
    pub opens: Vec<ModulePackageAccess>,
    /// Service interfaces, as internal names.
    pub uses: Vec<String>,
    pub provides: Vec<ModuleProvides>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRequires {
    pub module: String,
    pub flags: u16,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePackageAccess {
    /// Package in internal form (`com/acme/api`).
    pub package: String,
    pub flags: u16,
    pub to: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleProvides {
    pub service: String,
    pub with: Vec<String>,
}

impl Attribute {
    pub fn name(&self) -> &str {
        match self {
            Attribute::Code(_) => "Code",
            Attribute::ConstantValue(_) => "ConstantValue",
            Attribute::Signature(_) => "Signature",
            Attribute::SourceFile(_) => "SourceFile",
            Attribute::Exceptions(_) => "Exceptions",
            Attribute::InnerClasses(_) => "InnerClasses",
            Attribute::EnclosingMethod { .. } => "EnclosingMethod",
            Attribute::RuntimeVisibleAnnotations(_) => "RuntimeVisibleAnnotations",
            Attribute::RuntimeInvisibleAnnotations(_) => "RuntimeInvisibleAnnotations",
            Attribute::RuntimeVisibleParameterAnnotations(_) => {
                "RuntimeVisibleParameterAnnotations"
            }
            Attribute::RuntimeInvisibleParameterAnnotations(_) => {
                "RuntimeInvisibleParameterAnnotations"
            }
            Attribute::RuntimeVisibleTypeAnnotations(_) => "RuntimeVisibleTypeAnnotations",
            Attribute::RuntimeInvisibleTypeAnnotations(_) => "RuntimeInvisibleTypeAnnotations",
            Attribute::AnnotationDefault(_) => "AnnotationDefault",
            Attribute::BootstrapMethods(_) => "BootstrapMethods",
            Attribute::NestHost(_) => "NestHost",
            Attribute::NestMembers(_) => "NestMembers",
            Attribute::PermittedSubclasses(_) => "PermittedSubclasses",
            Attribute::Record(_) => "Record",
            Attribute::MethodParameters(_) => "MethodParameters",
            Attribute::LocalVariableTable(_) => "LocalVariableTable",
            Attribute::LocalVariableTypeTable(_) => "LocalVariableTypeTable",
            Attribute::StackMapTable(_) => "StackMapTable",
            Attribute::Module(_) => "Module",
            Attribute::ModulePackages(_) => "ModulePackages",
            Attribute::ModuleMainClass(_) => "ModuleMainClass",
            Attribute::Other { name, .. } => name,
        }
    }

    fn parse(name: &str, info: &[u8], cp: &ConstantPool) -> Result<Self> {
        let mut r = Reader::new(info);
        let attr = match name {
            "Code" => Attribute::Code(Code::parse(&mut r, cp)?),
            "ConstantValue" => Attribute::ConstantValue(cp.constant(r.read_u2()?)?),
            "Signature" => Attribute::Signature(cp.get_utf8(r.read_u2()?)?.to_string()),
            "SourceFile" => Attribute::SourceFile(cp.get_utf8(r.read_u2()?)?.to_string()),
            "Exceptions" => Attribute::Exceptions(read_class_list(&mut r, cp)?),
            "InnerClasses" => {
                let num = r.read_u2()? as usize;
                let mut inners = Vec::with_capacity(num);
                for _ in 0..num {
                    inners.push(InnerClassInfo {
                        inner_class: cp.get_class_name(r.read_u2()?)?,
                        outer_class: cp.get_optional_class_name(r.read_u2()?)?,
                        inner_name: cp.get_optional_utf8(r.read_u2()?)?,
                        access_flags: r.read_u2()?,
                    });
                }
                Attribute::InnerClasses(inners)
            }
            "EnclosingMethod" => {
                let class = cp.get_class_name(r.read_u2()?)?;
                let method_index = r.read_u2()?;
                let method = if method_index == 0 {
                    None
                } else {
                    let (name, descriptor) = cp.get_name_and_type(method_index)?;
                    Some(NameAndType { name, descriptor })
                };
                Attribute::EnclosingMethod { class, method }
            }
            "RuntimeVisibleAnnotations" => {
                Attribute::RuntimeVisibleAnnotations(Annotation::parse_list(&mut r, cp)?)
            }
            "RuntimeInvisibleAnnotations" => {
                Attribute::RuntimeInvisibleAnnotations(Annotation::parse_list(&mut r, cp)?)
            }
            "RuntimeVisibleParameterAnnotations" => {
                Attribute::RuntimeVisibleParameterAnnotations(read_parameter_annotations(
                    &mut r, cp,
                )?)
            }
            "RuntimeInvisibleParameterAnnotations" => {
                Attribute::RuntimeInvisibleParameterAnnotations(read_parameter_annotations(
                    &mut r, cp,
                )?)
            }
            "RuntimeVisibleTypeAnnotations" => {
                Attribute::RuntimeVisibleTypeAnnotations(read_type_annotations(&mut r, cp)?)
            }
            "RuntimeInvisibleTypeAnnotations" => {
                Attribute::RuntimeInvisibleTypeAnnotations(read_type_annotations(&mut r, cp)?)
            }
            "AnnotationDefault" => Attribute::AnnotationDefault(ElementValue::parse(&mut r, cp)?),
            "BootstrapMethods" => {
                let num = r.read_u2()? as usize;
                let mut methods = Vec::with_capacity(num);
                for _ in 0..num {
                    let method = cp.constant(r.read_u2()?)?;
                    let argc = r.read_u2()? as usize;
                    let mut arguments = Vec::with_capacity(argc);
                    for _ in 0..argc {
                        arguments.push(cp.constant(r.read_u2()?)?);
                    }
                    methods.push(BootstrapMethod { method, arguments });
                }
                Attribute::BootstrapMethods(methods)
            }
            "NestHost" => Attribute::NestHost(cp.get_class_name(r.read_u2()?)?),
            "NestMembers" => Attribute::NestMembers(read_class_list(&mut r, cp)?),
            "PermittedSubclasses" => Attribute::PermittedSubclasses(read_class_list(&mut r, cp)?),
            "Record" => {
                let num = r.read_u2()? as usize;
                let mut components = Vec::with_capacity(num);
                for _ in 0..num {
                    components.push(RecordComponent {
                        name: cp.get_utf8(r.read_u2()?)?.to_string(),
                        descriptor: cp.get_utf8(r.read_u2()?)?.to_string(),
                        attributes: parse_attributes(&mut r, cp)?,
                    });
                }
                Attribute::Record(components)
            }
            "MethodParameters" => {
                let num = r.read_u1()? as usize;
                let mut params = Vec::with_capacity(num);
                for _ in 0..num {
                    params.push(MethodParameter {
                        name: cp.get_optional_utf8(r.read_u2()?)?,
                        access_flags: r.read_u2()?,
                    });
                }
                Attribute::MethodParameters(params)
            }
            "LocalVariableTable" => Attribute::LocalVariableTable(read_local_variables(&mut r, cp)?),
            "LocalVariableTypeTable" => {
                Attribute::LocalVariableTypeTable(read_local_variables(&mut r, cp)?)
            }
            "StackMapTable" => {
                return Ok(Attribute::StackMapTable(StackMapTable::parse(info, cp)?));
            }
            "Module" => Attribute::Module(read_module(&mut r, cp)?),
            "ModulePackages" => {
                let num = r.read_u2()? as usize;
                let mut packages = Vec::with_capacity(num);
                for _ in 0..num {
                    packages.push(cp.get_package_name(r.read_u2()?)?);
                }
                Attribute::ModulePackages(packages)
            }
            "ModuleMainClass" => Attribute::ModuleMainClass(cp.get_class_name(r.read_u2()?)?),
            _ => {
                return Ok(Attribute::Other {
                    name: name.to_string(),
                    info: info.to_vec(),
                })
            }
        };
        r.ensure_empty(static_name(name))?;
        Ok(attr)
    }

    fn write_body(&self, out: &mut Writer, pool: &mut ConstantPoolBuilder) -> Result<()> {
        match self {
            Attribute::Code(code) => code.write(out, pool)?,
            Attribute::ConstantValue(constant) => out.u2(pool.constant(constant)?),
            Attribute::Signature(sig) => out.u2(pool.utf8(sig)?),
            Attribute::SourceFile(file) => out.u2(pool.utf8(file)?),
            Attribute::Exceptions(classes)
            | Attribute::NestMembers(classes)
            | Attribute::PermittedSubclasses(classes) => write_class_list(classes, out, pool)?,
            Attribute::InnerClasses(inners) => {
                out.count(inners.len(), "InnerClasses")?;
                for inner in inners {
                    out.u2(pool.class(&inner.inner_class)?);
                    out.u2(pool.optional_class(inner.outer_class.as_deref())?);
                    out.u2(pool.optional_utf8(inner.inner_name.as_deref())?);
                    out.u2(inner.access_flags);
                }
            }
            Attribute::EnclosingMethod { class, method } => {
                out.u2(pool.class(class)?);
                match method {
                    Some(m) => out.u2(pool.name_and_type(&m.name, &m.descriptor)?),
                    None => out.u2(0),
                }
            }
            Attribute::RuntimeVisibleAnnotations(annotations)
            | Attribute::RuntimeInvisibleAnnotations(annotations) => {
                Annotation::write_list(annotations, out, pool)?
            }
            Attribute::RuntimeVisibleParameterAnnotations(params)
            | Attribute::RuntimeInvisibleParameterAnnotations(params) => {
                let count = u8::try_from(params.len())
                    .map_err(|_| Error::MalformedAttribute("ParameterAnnotations"))?;
                out.u1(count);
                for annotations in params {
                    Annotation::write_list(annotations, out, pool)?;
                }
            }
            Attribute::RuntimeVisibleTypeAnnotations(annotations)
            | Attribute::RuntimeInvisibleTypeAnnotations(annotations) => {
                out.count(annotations.len(), "TypeAnnotations")?;
                for annotation in annotations {
                    annotation.write(out, pool)?;
                }
            }
            Attribute::AnnotationDefault(value) => value.write(out, pool)?,
            Attribute::BootstrapMethods(methods) => {
                out.count(methods.len(), "BootstrapMethods")?;
                for method in methods {
                    out.u2(pool.constant(&method.method)?);
                    out.count(method.arguments.len(), "BootstrapMethods")?;
                    for argument in &method.arguments {
                        out.u2(pool.constant(argument)?);
                    }
                }
            }
            Attribute::NestHost(class) | Attribute::ModuleMainClass(class) => {
                out.u2(pool.class(class)?)
            }
            Attribute::Record(components) => {
                out.count(components.len(), "Record")?;
                for component in components {
                    out.u2(pool.utf8(&component.name)?);
                    out.u2(pool.utf8(&component.descriptor)?);
                    write_attributes(&component.attributes, out, pool)?;
                }
            }
            Attribute::MethodParameters(params) => {
                let count = u8::try_from(params.len())
                    .map_err(|_| Error::MalformedAttribute("MethodParameters"))?;
                out.u1(count);
                for param in params {
                    out.u2(pool.optional_utf8(param.name.as_deref())?);
                    out.u2(param.access_flags);
                }
            }
            Attribute::LocalVariableTable(vars) | Attribute::LocalVariableTypeTable(vars) => {
                out.count(vars.len(), "LocalVariableTable")?;
                for var in vars {
                    out.u2(var.start_pc);
                    out.u2(var.length);
                    out.u2(pool.utf8(&var.name)?);
                    out.u2(pool.utf8(&var.descriptor)?);
                    out.u2(var.index);
                }
            }
            Attribute::StackMapTable(table) => table.write(out, pool)?,
            Attribute::Module(module) => write_module(module, out, pool)?,
            Attribute::ModulePackages(packages) => {
                out.count(packages.len(), "ModulePackages")?;
                for package in packages {
                    out.u2(pool.package(package)?);
                }
            }
            Attribute::Other { info, .. } => out.bytes(info),
        }
        Ok(())
    }
}

pub(crate) fn parse_attributes(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Vec<Attribute>> {
    let count = reader.read_u2()? as usize;
    let mut attributes = Vec::with_capacity(count);
    for _ in 0..count {
        let name_index = reader.read_u2()?;
        let length = reader.read_u4()? as usize;
        let info = reader.read_bytes(length)?;
        let name = cp.get_utf8(name_index)?;
        attributes.push(Attribute::parse(name, info, cp)?);
    }
    Ok(attributes)
}

pub(crate) fn write_attributes(
    attributes: &[Attribute],
    out: &mut Writer,
    pool: &mut ConstantPoolBuilder,
) -> Result<()> {
    out.count(attributes.len(), "attributes")?;
    for attribute in attributes {
        out.u2(pool.utf8(attribute.name())?);
        let mut body = Writer::new();
        attribute.write_body(&mut body, pool)?;
        out.sized(body)?;
    }
    Ok(())
}

fn static_name(name: &str) -> &'static str {
    const KNOWN: &[&str] = &[
        "Code",
        "ConstantValue",
        "Signature",
        "SourceFile",
        "Exceptions",
        "InnerClasses",
        "EnclosingMethod",
        "RuntimeVisibleAnnotations",
        "RuntimeInvisibleAnnotations",
        "RuntimeVisibleParameterAnnotations",
        "RuntimeInvisibleParameterAnnotations",
        "RuntimeVisibleTypeAnnotations",
        "RuntimeInvisibleTypeAnnotations",
        "AnnotationDefault",
        "BootstrapMethods",
        "NestHost",
        "NestMembers",
        "PermittedSubclasses",
        "Record",
        "MethodParameters",
        "LocalVariableTable",
        "LocalVariableTypeTable",
        "Module",
        "ModulePackages",
        "ModuleMainClass",
    ];
    KNOWN
        .iter()
        .copied()
        .find(|known| *known == name)
        .unwrap_or("attribute")
}

fn read_class_list(r: &mut Reader<'_>, cp: &ConstantPool) -> Result<Vec<String>> {
    let num = r.read_u2()? as usize;
    let mut classes = Vec::with_capacity(num);
    for _ in 0..num {
        classes.push(cp.get_class_name(r.read_u2()?)?);
    }
    Ok(classes)
}

fn write_class_list(
    classes: &[String],
    out: &mut Writer,
    pool: &mut ConstantPoolBuilder,
) -> Result<()> {
    out.count(classes.len(), "class list")?;
    for class in classes {
        out.u2(pool.class(class)?);
    }
    Ok(())
}

fn read_parameter_annotations(
    r: &mut Reader<'_>,
    cp: &ConstantPool,
) -> Result<Vec<Vec<Annotation>>> {
    let num = r.read_u1()? as usize;
    let mut params = Vec::with_capacity(num);
    for _ in 0..num {
        params.push(Annotation::parse_list(r, cp)?);
    }
    Ok(params)
}

fn read_type_annotations(r: &mut Reader<'_>, cp: &ConstantPool) -> Result<Vec<TypeAnnotation>> {
    let num = r.read_u2()? as usize;
    let mut annotations = Vec::with_capacity(num);
    for _ in 0..num {
        annotations.push(TypeAnnotation::parse(r, cp)?);
    }
    Ok(annotations)
}

fn read_local_variables(r: &mut Reader<'_>, cp: &ConstantPool) -> Result<Vec<LocalVariable>> {
    let num = r.read_u2()? as usize;
    let mut vars = Vec::with_capacity(num);
    for _ in 0..num {
        vars.push(LocalVariable {
            start_pc: r.read_u2()?,
            length: r.read_u2()?,
            name: cp.get_utf8(r.read_u2()?)?.to_string(),
            descriptor: cp.get_utf8(r.read_u2()?)?.to_string(),
            index: r.read_u2()?,
        });
    }
    Ok(vars)
}

fn read_module(r: &mut Reader<'_>, cp: &ConstantPool) -> Result<ModuleAttribute> {
    let name = cp.get_module_name(r.read_u2()?)?;
    let flags = r.read_u2()?;
    let version = cp.get_optional_utf8(r.read_u2()?)?;

    let requires_count = r.read_u2()? as usize;
    let mut requires = Vec::with_capacity(requires_count);
    for _ in 0..requires_count {
        requires.push(ModuleRequires {
            module: cp.get_module_name(r.read_u2()?)?,
            flags: r.read_u2()?,
            version: cp.get_optional_utf8(r.read_u2()?)?,
        });
    }

    let exports = read_package_access(r, cp)?;
    let opens = read_package_access(r, cp)?;
    let uses = read_class_list(r, cp)?;

    let provides_count = r.read_u2()? as usize;
    let mut provides = Vec::with_capacity(provides_count);
    for _ in 0..provides_count {
        provides.push(ModuleProvides {
            service: cp.get_class_name(r.read_u2()?)?,
            with: read_class_list(r, cp)?,
        });
    }

    Ok(ModuleAttribute {
        name,
        flags,
        version,
        requires,
        exports,
        opens,
        uses,
        provides,
    })
}

fn read_package_access(r: &mut Reader<'_>, cp: &ConstantPool) -> Result<Vec<ModulePackageAccess>> {
    let count = r.read_u2()? as usize;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let package = cp.get_package_name(r.read_u2()?)?;
        let flags = r.read_u2()?;
        let to_count = r.read_u2()? as usize;
        let mut to = Vec::with_capacity(to_count);
        for _ in 0..to_count {
            to.push(cp.get_module_name(r.read_u2()?)?);
        }
        entries.push(ModulePackageAccess { package, flags, to });
    }
    Ok(entries)
}

fn write_module(
    module: &ModuleAttribute,
    out: &mut Writer,
    pool: &mut ConstantPoolBuilder,
) -> Result<()> {
    out.u2(pool.module(&module.name)?);
    out.u2(module.flags);
    out.u2(pool.optional_utf8(module.version.as_deref())?);

    out.count(module.requires.len(), "Module")?;
    for requires in &module.requires {
        out.u2(pool.module(&requires.module)?);
        out.u2(requires.flags);
        out.u2(pool.optional_utf8(requires.version.as_deref())?);
    }

    for list in [&module.exports, &module.opens] {
        out.count(list.len(), "Module")?;
        for entry in list {
            out.u2(pool.package(&entry.package)?);
            out.u2(entry.flags);
            out.count(entry.to.len(), "Module")?;
            for to in &entry.to {
                out.u2(pool.module(to)?);
            }
        }
    }

    write_class_list(&module.uses, out, pool)?;

    out.count(module.provides.len(), "Module")?;
    for provides in &module.provides {
        out.u2(pool.class(&provides.service)?);
        write_class_list(&provides.with, out, pool)?;
    }
    Ok(())
}
