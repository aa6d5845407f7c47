use crate::annotation::Annotation;
use crate::attribute::{parse_attributes, write_attributes, Attribute, InnerClassInfo};
use crate::constant_pool::{ConstantPool, ConstantPoolBuilder};
use crate::error::{Error, Result};
use crate::reader::{Reader, Writer};

const MAGIC: u32 = 0xCAFE_BABE;

/// A parsed class file.
///
/// Every constant-pool reference is resolved to names and values, so the
/// structure can be edited freely and written back with a rebuilt pool.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    pub this_class: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<ClassMember>,
    pub methods: Vec<ClassMember>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassMember {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let magic = reader.read_u4()?;
        if magic != MAGIC {
            return Err(Error::InvalidMagic(magic));
        }

        let minor_version = reader.read_u2()?;
        let major_version = reader.read_u2()?;
        let cp = ConstantPool::parse(&mut reader)?;

        let access_flags = reader.read_u2()?;
        let this_class = cp.get_class_name(reader.read_u2()?)?;
        let super_class = cp.get_optional_class_name(reader.read_u2()?)?;

        let interfaces_count = reader.read_u2()? as usize;
        let mut interfaces = Vec::with_capacity(interfaces_count);
        for _ in 0..interfaces_count {
            interfaces.push(cp.get_class_name(reader.read_u2()?)?);
        }

        let fields = parse_members(&mut reader, &cp)?;
        let methods = parse_members(&mut reader, &cp)?;
        let attributes = parse_attributes(&mut reader, &cp)?;

        reader.ensure_empty("class file")?;

        Ok(Self {
            minor_version,
            major_version,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    /// Serializes the class with a freshly built constant pool.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut pool = ConstantPoolBuilder::new();

        // `ldc` operands are one byte wide; give them the lowest slots.
        for method in &self.methods {
            for attribute in &method.attributes {
                if let Attribute::Code(code) = attribute {
                    for constant in code.narrow_constants() {
                        pool.reserve(constant)?;
                    }
                }
            }
        }

        let mut body = Writer::new();
        body.u2(self.access_flags);
        body.u2(pool.class(&self.this_class)?);
        body.u2(pool.optional_class(self.super_class.as_deref())?);
        body.count(self.interfaces.len(), "interfaces")?;
        for interface in &self.interfaces {
            body.u2(pool.class(interface)?);
        }
        write_members(&self.fields, &mut body, &mut pool)?;
        write_members(&self.methods, &mut body, &mut pool)?;
        write_attributes(&self.attributes, &mut body, &mut pool)?;

        let mut out = Writer::new();
        out.u4(MAGIC);
        out.u2(self.minor_version);
        out.u2(self.major_version);
        pool.finish(&mut out)?;
        out.bytes(&body.into_bytes());
        Ok(out.into_bytes())
    }

    pub fn signature(&self) -> Option<&str> {
        find_signature(&self.attributes)
    }

    pub fn source_file(&self) -> Option<&str> {
        self.attributes.iter().find_map(|attr| match attr {
            Attribute::SourceFile(file) => Some(file.as_str()),
            _ => None,
        })
    }

    pub fn inner_classes(&self) -> &[InnerClassInfo] {
        self.attributes
            .iter()
            .find_map(|attr| match attr {
                Attribute::InnerClasses(inners) => Some(inners.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn runtime_visible_annotations(&self) -> impl Iterator<Item = &Annotation> {
        visible_annotations(&self.attributes)
    }
}

impl ClassMember {
    pub fn signature(&self) -> Option<&str> {
        find_signature(&self.attributes)
    }

    pub fn runtime_visible_annotations(&self) -> impl Iterator<Item = &Annotation> {
        visible_annotations(&self.attributes)
    }
}

fn find_signature(attributes: &[Attribute]) -> Option<&str> {
    attributes.iter().find_map(|attr| match attr {
        Attribute::Signature(sig) => Some(sig.as_str()),
        _ => None,
    })
}

fn visible_annotations(attributes: &[Attribute]) -> impl Iterator<Item = &Annotation> {
    attributes
        .iter()
        .filter_map(|attr| match attr {
            Attribute::RuntimeVisibleAnnotations(annotations) => Some(annotations.iter()),
            _ => None,
        })
        .flatten()
}

fn parse_members(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Vec<ClassMember>> {
    let count = reader.read_u2()? as usize;
    let mut members = Vec::with_capacity(count);
    for _ in 0..count {
        let access_flags = reader.read_u2()?;
        let name = cp.get_utf8(reader.read_u2()?)?.to_string();
        let descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();
        let attributes = parse_attributes(reader, cp)?;
        members.push(ClassMember {
            access_flags,
            name,
            descriptor,
            attributes,
        });
    }
    Ok(members)
}

fn write_members(
    members: &[ClassMember],
    out: &mut Writer,
    pool: &mut ConstantPoolBuilder,
) -> Result<()> {
    out.count(members.len(), "members")?;
    for member in members {
        out.u2(member.access_flags);
        out.u2(pool.utf8(&member.name)?);
        out.u2(pool.utf8(&member.descriptor)?);
        write_attributes(&member.attributes, out, pool)?;
    }
    Ok(())
}
