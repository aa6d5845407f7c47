use crate::constant_pool::{ConstantPool, ConstantPoolBuilder, CpInfo};
use crate::error::{Error, Result};
use crate::mutf8::JavaString;
use crate::reader::{Reader, Writer};

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub type_descriptor: String,
    pub elements: Vec<(String, ElementValue)>,
}

impl Annotation {
    pub fn type_internal_name(&self) -> Option<&str> {
        self.type_descriptor
            .strip_prefix('L')
            .and_then(|rest| rest.strip_suffix(';'))
    }

    pub(crate) fn parse(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Self> {
        let type_index = reader.read_u2()?;
        let type_descriptor = cp.get_utf8(type_index)?.to_string();

        let num_element_value_pairs = reader.read_u2()? as usize;
        let mut elements = Vec::with_capacity(num_element_value_pairs);
        for _ in 0..num_element_value_pairs {
            let element_name_index = reader.read_u2()?;
            let name = cp.get_utf8(element_name_index)?.to_string();
            let value = ElementValue::parse(reader, cp)?;
            elements.push((name, value));
        }

        Ok(Self {
            type_descriptor,
            elements,
        })
    }

    pub(crate) fn write(&self, out: &mut Writer, pool: &mut ConstantPoolBuilder) -> Result<()> {
        out.u2(pool.utf8(&self.type_descriptor)?);
        out.count(self.elements.len(), "annotation")?;
        for (name, value) in &self.elements {
            out.u2(pool.utf8(name)?);
            value.write(out, pool)?;
        }
        Ok(())
    }

    pub(crate) fn parse_list(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Vec<Self>> {
        let num = reader.read_u2()? as usize;
        let mut annotations = Vec::with_capacity(num);
        for _ in 0..num {
            annotations.push(Annotation::parse(reader, cp)?);
        }
        Ok(annotations)
    }

    pub(crate) fn write_list(
        annotations: &[Annotation],
        out: &mut Writer,
        pool: &mut ConstantPoolBuilder,
    ) -> Result<()> {
        out.count(annotations.len(), "annotations")?;
        for annotation in annotations {
            annotation.write(out, pool)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Const(ConstValue),
    Enum {
        type_descriptor: String,
        const_name: String,
    },
    /// Return descriptor of the class literal, e.g. `Ljava/lang/String;` or `V`.
    Class(String),
    Annotation(Box<Annotation>),
    Array(Vec<ElementValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Byte(i8),
    Char(u16),
    Double(u64),
    Float(u32),
    Int(i32),
    Long(i64),
    Short(i16),
    Boolean(bool),
    String(JavaString),
}

impl ElementValue {
    pub(crate) fn parse(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Self> {
        let tag = reader.read_u1()?;
        match tag {
            b'B' | b'C' | b'I' | b'S' | b'Z' => {
                let idx = reader.read_u2()?;
                let value = match cp.get(idx)? {
                    CpInfo::Integer(v) => *v,
                    other => return Err(mismatch(idx, "Integer", other)),
                };
                let cv = match tag {
                    b'B' => ConstValue::Byte(value as i8),
                    b'C' => ConstValue::Char(value as u16),
                    b'S' => ConstValue::Short(value as i16),
                    b'Z' => ConstValue::Boolean(value != 0),
                    _ => ConstValue::Int(value),
                };
                Ok(ElementValue::Const(cv))
            }
            b'D' => {
                let idx = reader.read_u2()?;
                match cp.get(idx)? {
                    CpInfo::Double(v) => Ok(ElementValue::Const(ConstValue::Double(*v))),
                    other => Err(mismatch(idx, "Double", other)),
                }
            }
            b'F' => {
                let idx = reader.read_u2()?;
                match cp.get(idx)? {
                    CpInfo::Float(v) => Ok(ElementValue::Const(ConstValue::Float(*v))),
                    other => Err(mismatch(idx, "Float", other)),
                }
            }
            b'J' => {
                let idx = reader.read_u2()?;
                match cp.get(idx)? {
                    CpInfo::Long(v) => Ok(ElementValue::Const(ConstValue::Long(*v))),
                    other => Err(mismatch(idx, "Long", other)),
                }
            }
            b's' => {
                let idx = reader.read_u2()?;
                let value = cp.get_java_string(idx)?.clone();
                Ok(ElementValue::Const(ConstValue::String(value)))
            }
            b'e' => {
                let type_name_index = reader.read_u2()?;
                let const_name_index = reader.read_u2()?;
                Ok(ElementValue::Enum {
                    type_descriptor: cp.get_utf8(type_name_index)?.to_string(),
                    const_name: cp.get_utf8(const_name_index)?.to_string(),
                })
            }
            b'c' => {
                let class_info_index = reader.read_u2()?;
                Ok(ElementValue::Class(
                    cp.get_utf8(class_info_index)?.to_string(),
                ))
            }
            b'@' => Ok(ElementValue::Annotation(Box::new(Annotation::parse(
                reader, cp,
            )?))),
            b'[' => {
                let num_values = reader.read_u2()? as usize;
                let mut values = Vec::with_capacity(num_values);
                for _ in 0..num_values {
                    values.push(ElementValue::parse(reader, cp)?);
                }
                Ok(ElementValue::Array(values))
            }
            _ => Err(Error::MalformedAttribute("annotation element_value")),
        }
    }

    pub(crate) fn write(&self, out: &mut Writer, pool: &mut ConstantPoolBuilder) -> Result<()> {
        use crate::constant_pool::Constant;

        match self {
            ElementValue::Const(cv) => {
                let (tag, constant) = match cv {
                    ConstValue::Byte(v) => (b'B', Constant::Integer(*v as i32)),
                    ConstValue::Char(v) => (b'C', Constant::Integer(*v as i32)),
                    ConstValue::Short(v) => (b'S', Constant::Integer(*v as i32)),
                    ConstValue::Boolean(v) => (b'Z', Constant::Integer(*v as i32)),
                    ConstValue::Int(v) => (b'I', Constant::Integer(*v)),
                    ConstValue::Double(v) => (b'D', Constant::Double(*v)),
                    ConstValue::Float(v) => (b'F', Constant::Float(*v)),
                    ConstValue::Long(v) => (b'J', Constant::Long(*v)),
                    ConstValue::String(s) => {
                        out.u1(b's');
                        out.u2(pool.java_string(s)?);
                        return Ok(());
                    }
                };
                out.u1(tag);
                out.u2(pool.constant(&constant)?);
            }
            ElementValue::Enum {
                type_descriptor,
                const_name,
            } => {
                out.u1(b'e');
                out.u2(pool.utf8(type_descriptor)?);
                out.u2(pool.utf8(const_name)?);
            }
            ElementValue::Class(desc) => {
                out.u1(b'c');
                out.u2(pool.utf8(desc)?);
            }
            ElementValue::Annotation(annotation) => {
                out.u1(b'@');
                annotation.write(out, pool)?;
            }
            ElementValue::Array(values) => {
                out.u1(b'[');
                out.count(values.len(), "annotation array")?;
                for value in values {
                    value.write(out, pool)?;
                }
            }
        }
        Ok(())
    }
}

/// `type_annotation` with its target and path kept opaque; neither holds pool indices.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAnnotation {
    pub target_type: u8,
    pub target_info: Vec<u8>,
    pub type_path: Vec<u8>,
    pub annotation: Annotation,
}

impl TypeAnnotation {
    pub(crate) fn parse(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Self> {
        let target_type = reader.read_u1()?;
        let target_info = match target_type {
            0x13..=0x15 => Vec::new(),
            0x00 | 0x01 | 0x16 => reader.read_bytes(1)?.to_vec(),
            0x10..=0x12 | 0x17 | 0x42..=0x46 => reader.read_bytes(2)?.to_vec(),
            0x47..=0x4B => reader.read_bytes(3)?.to_vec(),
            0x40 | 0x41 => {
                let table_length = reader.read_u2()?;
                let mut info = table_length.to_be_bytes().to_vec();
                info.extend_from_slice(reader.read_bytes(table_length as usize * 6)?);
                info
            }
            _ => return Err(Error::MalformedAttribute("type annotation target")),
        };
        Self::parse_rest(reader, cp, target_type, target_info)
    }

    fn parse_rest(
        reader: &mut Reader<'_>,
        cp: &ConstantPool,
        target_type: u8,
        target_info: Vec<u8>,
    ) -> Result<Self> {
        let path_length = reader.read_u1()? as usize;
        let mut type_path = Vec::with_capacity(1 + path_length * 2);
        type_path.push(path_length as u8);
        type_path.extend_from_slice(reader.read_bytes(path_length * 2)?);
        let annotation = Annotation::parse(reader, cp)?;
        Ok(Self {
            target_type,
            target_info,
            type_path,
            annotation,
        })
    }

    pub(crate) fn write(&self, out: &mut Writer, pool: &mut ConstantPoolBuilder) -> Result<()> {
        out.u1(self.target_type);
        out.bytes(&self.target_info);
        out.bytes(&self.type_path);
        self.annotation.write(out, pool)
    }
}

fn mismatch(index: u16, expected: &'static str, found: &CpInfo) -> Error {
    Error::ConstantPoolTypeMismatch {
        index,
        expected,
        found: found.kind(),
    }
}
