use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::mutf8::JavaString;
use crate::reader::{Reader, Writer};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum CpInfo {
    /// Index 0 and the slot following a `Long`/`Double`.
    Unusable,
    Utf8(JavaString),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Class(u16),
    String(u16),
    Fieldref(u16, u16),
    Methodref(u16, u16),
    InterfaceMethodref(u16, u16),
    NameAndType(u16, u16),
    MethodHandle(u8, u16),
    MethodType(u16),
    Dynamic(u16, u16),
    InvokeDynamic(u16, u16),
    Module(u16),
    Package(u16),
}

impl CpInfo {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            CpInfo::Unusable => "Unusable",
            CpInfo::Utf8(_) => "Utf8",
            CpInfo::Integer(_) => "Integer",
            CpInfo::Float(_) => "Float",
            CpInfo::Long(_) => "Long",
            CpInfo::Double(_) => "Double",
            CpInfo::Class(_) => "Class",
            CpInfo::String(_) => "String",
            CpInfo::Fieldref(..) => "Fieldref",
            CpInfo::Methodref(..) => "Methodref",
            CpInfo::InterfaceMethodref(..) => "InterfaceMethodref",
            CpInfo::NameAndType(..) => "NameAndType",
            CpInfo::MethodHandle(..) => "MethodHandle",
            CpInfo::MethodType(_) => "MethodType",
            CpInfo::Dynamic(..) => "Dynamic",
            CpInfo::InvokeDynamic(..) => "InvokeDynamic",
            CpInfo::Module(_) => "Module",
            CpInfo::Package(_) => "Package",
        }
    }

    fn is_wide(&self) -> bool {
        matches!(self, CpInfo::Long(_) | CpInfo::Double(_))
    }

    fn write(&self, out: &mut Writer) -> Result<()> {
        match self {
            CpInfo::Unusable => {}
            CpInfo::Utf8(s) => {
                let bytes = s.encode()?;
                out.u1(1);
                out.u2(bytes.len() as u16);
                out.bytes(&bytes);
            }
            CpInfo::Integer(v) => {
                out.u1(3);
                out.u4(*v as u32);
            }
            CpInfo::Float(bits) => {
                out.u1(4);
                out.u4(*bits);
            }
            CpInfo::Long(v) => {
                out.u1(5);
                out.u8(*v as u64);
            }
            CpInfo::Double(bits) => {
                out.u1(6);
                out.u8(*bits);
            }
            CpInfo::Class(i) => write_tagged_u2(out, 7, *i),
            CpInfo::String(i) => write_tagged_u2(out, 8, *i),
            CpInfo::Fieldref(a, b) => write_tagged_pair(out, 9, *a, *b),
            CpInfo::Methodref(a, b) => write_tagged_pair(out, 10, *a, *b),
            CpInfo::InterfaceMethodref(a, b) => write_tagged_pair(out, 11, *a, *b),
            CpInfo::NameAndType(a, b) => write_tagged_pair(out, 12, *a, *b),
            CpInfo::MethodHandle(kind, i) => {
                out.u1(15);
                out.u1(*kind);
                out.u2(*i);
            }
            CpInfo::MethodType(i) => write_tagged_u2(out, 16, *i),
            CpInfo::Dynamic(a, b) => write_tagged_pair(out, 17, *a, *b),
            CpInfo::InvokeDynamic(a, b) => write_tagged_pair(out, 18, *a, *b),
            CpInfo::Module(i) => write_tagged_u2(out, 19, *i),
            CpInfo::Package(i) => write_tagged_u2(out, 20, *i),
        }
        Ok(())
    }
}

fn write_tagged_u2(out: &mut Writer, tag: u8, value: u16) {
    out.u1(tag);
    out.u2(value);
}

fn write_tagged_pair(out: &mut Writer, tag: u8, a: u16, b: u16) {
    out.u1(tag);
    out.u2(a);
    out.u2(b);
}

/// A field or method reference resolved to its symbolic parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberRef {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

/// A loadable or referencing constant, fully resolved to names and values.
///
/// Class-file structures store these instead of pool indices so the pool can
/// be rebuilt from scratch after names change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Integer(i32),
    /// IEEE-754 bits, kept exact so NaN payloads survive.
    Float(u32),
    Long(i64),
    Double(u64),
    /// Internal name, or an array descriptor such as `[Ljava/lang/String;`.
    Class(String),
    String(JavaString),
    FieldRef(MemberRef),
    MethodRef(MemberRef),
    InterfaceMethodRef(MemberRef),
    MethodHandle { kind: u8, reference: Box<Constant> },
    MethodType(String),
    Dynamic {
        bootstrap_method: u16,
        name: String,
        descriptor: String,
    },
    InvokeDynamic {
        bootstrap_method: u16,
        name: String,
        descriptor: String,
    },
    Module(String),
    Package(String),
}

impl Constant {
    fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }
}

pub(crate) struct ConstantPool {
    entries: Vec<CpInfo>,
}

impl ConstantPool {
    pub(crate) fn parse(reader: &mut Reader<'_>) -> Result<Self> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count.max(1));
        entries.push(CpInfo::Unusable);
        while entries.len() < count {
            let tag = reader.read_u1()?;
            let info = match tag {
                1 => {
                    let len = reader.read_u2()? as usize;
                    CpInfo::Utf8(JavaString::decode(reader.read_bytes(len)?))
                }
                3 => CpInfo::Integer(reader.read_u4()? as i32),
                4 => CpInfo::Float(reader.read_u4()?),
                5 => CpInfo::Long(reader.read_u8()? as i64),
                6 => CpInfo::Double(reader.read_u8()?),
                7 => CpInfo::Class(reader.read_u2()?),
                8 => CpInfo::String(reader.read_u2()?),
                9 => CpInfo::Fieldref(reader.read_u2()?, reader.read_u2()?),
                10 => CpInfo::Methodref(reader.read_u2()?, reader.read_u2()?),
                11 => CpInfo::InterfaceMethodref(reader.read_u2()?, reader.read_u2()?),
                12 => CpInfo::NameAndType(reader.read_u2()?, reader.read_u2()?),
                15 => CpInfo::MethodHandle(reader.read_u1()?, reader.read_u2()?),
                16 => CpInfo::MethodType(reader.read_u2()?),
                17 => CpInfo::Dynamic(reader.read_u2()?, reader.read_u2()?),
                18 => CpInfo::InvokeDynamic(reader.read_u2()?, reader.read_u2()?),
                19 => CpInfo::Module(reader.read_u2()?),
                20 => CpInfo::Package(reader.read_u2()?),
                other => return Err(Error::InvalidConstantPoolTag(other)),
            };
            let wide = info.is_wide();
            entries.push(info);
            if wide {
                entries.push(CpInfo::Unusable);
            }
        }
        Ok(Self { entries })
    }

    pub(crate) fn get(&self, index: u16) -> Result<&CpInfo> {
        match self.entries.get(index as usize) {
            Some(CpInfo::Unusable) | None => Err(Error::InvalidConstantPoolIndex(index)),
            Some(info) => Ok(info),
        }
    }

    pub(crate) fn get_java_string(&self, index: u16) -> Result<&JavaString> {
        match self.get(index)? {
            CpInfo::Utf8(s) => Ok(s),
            other => Err(mismatch(index, "Utf8", other)),
        }
    }

    pub(crate) fn get_utf8(&self, index: u16) -> Result<&str> {
        self.get_java_string(index)?
            .as_str()
            .ok_or(Error::InvalidModifiedUtf8)
    }

    pub(crate) fn get_optional_utf8(&self, index: u16) -> Result<Option<String>> {
        if index == 0 {
            return Ok(None);
        }
        Ok(Some(self.get_utf8(index)?.to_string()))
    }

    pub(crate) fn get_class_name(&self, index: u16) -> Result<String> {
        match self.get(index)? {
            CpInfo::Class(name) => Ok(self.get_utf8(*name)?.to_string()),
            other => Err(mismatch(index, "Class", other)),
        }
    }

    pub(crate) fn get_optional_class_name(&self, index: u16) -> Result<Option<String>> {
        if index == 0 {
            return Ok(None);
        }
        self.get_class_name(index).map(Some)
    }

    pub(crate) fn get_name_and_type(&self, index: u16) -> Result<(String, String)> {
        match self.get(index)? {
            CpInfo::NameAndType(name, desc) => Ok((
                self.get_utf8(*name)?.to_string(),
                self.get_utf8(*desc)?.to_string(),
            )),
            other => Err(mismatch(index, "NameAndType", other)),
        }
    }

    fn get_module_like(&self, index: u16, expected: &'static str) -> Result<String> {
        match (self.get(index)?, expected) {
            (CpInfo::Module(name), "Module") | (CpInfo::Package(name), "Package") => {
                Ok(self.get_utf8(*name)?.to_string())
            }
            (other, _) => Err(mismatch(index, expected, other)),
        }
    }

    pub(crate) fn get_module_name(&self, index: u16) -> Result<String> {
        self.get_module_like(index, "Module")
    }

    pub(crate) fn get_package_name(&self, index: u16) -> Result<String> {
        self.get_module_like(index, "Package")
    }

    /// Resolves the entry at `index` into a symbolic [`Constant`].
    pub(crate) fn constant(&self, index: u16) -> Result<Constant> {
        let member = |class: u16, nat: u16| -> Result<MemberRef> {
            let (name, descriptor) = self.get_name_and_type(nat)?;
            Ok(MemberRef {
                owner: self.get_class_name(class)?,
                name,
                descriptor,
            })
        };
        Ok(match self.get(index)? {
            CpInfo::Integer(v) => Constant::Integer(*v),
            CpInfo::Float(v) => Constant::Float(*v),
            CpInfo::Long(v) => Constant::Long(*v),
            CpInfo::Double(v) => Constant::Double(*v),
            CpInfo::Class(name) => Constant::Class(self.get_utf8(*name)?.to_string()),
            CpInfo::String(s) => Constant::String(self.get_java_string(*s)?.clone()),
            CpInfo::Fieldref(c, nat) => Constant::FieldRef(member(*c, *nat)?),
            CpInfo::Methodref(c, nat) => Constant::MethodRef(member(*c, *nat)?),
            CpInfo::InterfaceMethodref(c, nat) => Constant::InterfaceMethodRef(member(*c, *nat)?),
            CpInfo::MethodHandle(kind, reference) => Constant::MethodHandle {
                kind: *kind,
                reference: Box::new(self.constant(*reference)?),
            },
            CpInfo::MethodType(desc) => Constant::MethodType(self.get_utf8(*desc)?.to_string()),
            CpInfo::Dynamic(bsm, nat) => {
                let (name, descriptor) = self.get_name_and_type(*nat)?;
                Constant::Dynamic {
                    bootstrap_method: *bsm,
                    name,
                    descriptor,
                }
            }
            CpInfo::InvokeDynamic(bsm, nat) => {
                let (name, descriptor) = self.get_name_and_type(*nat)?;
                Constant::InvokeDynamic {
                    bootstrap_method: *bsm,
                    name,
                    descriptor,
                }
            }
            CpInfo::Module(name) => Constant::Module(self.get_utf8(*name)?.to_string()),
            CpInfo::Package(name) => Constant::Package(self.get_utf8(*name)?.to_string()),
            other @ (CpInfo::Utf8(_) | CpInfo::NameAndType(..) | CpInfo::Unusable) => {
                return Err(mismatch(index, "loadable constant", other))
            }
        })
    }
}

fn mismatch(index: u16, expected: &'static str, found: &CpInfo) -> Error {
    Error::ConstantPoolTypeMismatch {
        index,
        expected,
        found: found.kind(),
    }
}

/// Builds a fresh, deduplicated constant pool while a class is serialized.
///
/// Constants loaded by the one-byte `ldc` instruction must land below index 256;
/// they are reserved up front with [`ConstantPoolBuilder::reserve`] before any
/// other entry is allocated.
pub(crate) struct ConstantPoolBuilder {
    entries: Vec<Option<CpInfo>>,
    lookup: HashMap<CpInfo, u16>,
    reserved: HashMap<Constant, u16>,
}

impl ConstantPoolBuilder {
    pub(crate) fn new() -> Self {
        Self {
            entries: vec![Some(CpInfo::Unusable)],
            lookup: HashMap::new(),
            reserved: HashMap::new(),
        }
    }

    fn allocate(&mut self, wide: bool) -> Result<u16> {
        let index = self.entries.len();
        let needed = if wide { index + 2 } else { index + 1 };
        if needed > u16::MAX as usize {
            return Err(Error::ConstantPoolOverflow);
        }
        self.entries.push(None);
        if wide {
            self.entries.push(Some(CpInfo::Unusable));
        }
        Ok(index as u16)
    }

    fn intern(&mut self, info: CpInfo) -> Result<u16> {
        if let Some(&index) = self.lookup.get(&info) {
            return Ok(index);
        }
        let index = self.allocate(info.is_wide())?;
        self.entries[index as usize] = Some(info.clone());
        self.lookup.insert(info, index);
        Ok(index)
    }

    /// Allocates a slot for `constant` without resolving its parts yet.
    pub(crate) fn reserve(&mut self, constant: &Constant) -> Result<u16> {
        if let Some(&index) = self.reserved.get(constant) {
            return Ok(index);
        }
        let index = self.allocate(constant.is_wide())?;
        self.reserved.insert(constant.clone(), index);
        Ok(index)
    }

    pub(crate) fn utf8(&mut self, value: &str) -> Result<u16> {
        self.intern(CpInfo::Utf8(JavaString::from(value)))
    }

    pub(crate) fn java_string(&mut self, value: &JavaString) -> Result<u16> {
        self.intern(CpInfo::Utf8(value.clone()))
    }

    pub(crate) fn optional_utf8(&mut self, value: Option<&str>) -> Result<u16> {
        value.map_or(Ok(0), |v| self.utf8(v))
    }

    pub(crate) fn class(&mut self, name: &str) -> Result<u16> {
        self.constant(&Constant::Class(name.to_string()))
    }

    pub(crate) fn optional_class(&mut self, name: Option<&str>) -> Result<u16> {
        name.map_or(Ok(0), |n| self.class(n))
    }

    pub(crate) fn name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16> {
        let name = self.utf8(name)?;
        let descriptor = self.utf8(descriptor)?;
        self.intern(CpInfo::NameAndType(name, descriptor))
    }

    pub(crate) fn module(&mut self, name: &str) -> Result<u16> {
        self.constant(&Constant::Module(name.to_string()))
    }

    pub(crate) fn package(&mut self, name: &str) -> Result<u16> {
        self.constant(&Constant::Package(name.to_string()))
    }

    pub(crate) fn constant(&mut self, constant: &Constant) -> Result<u16> {
        if let Some(&index) = self.reserved.get(constant) {
            if self.entries[index as usize].is_none() {
                let info = self.resolve(constant)?;
                self.entries[index as usize] = Some(info.clone());
                self.lookup.entry(info).or_insert(index);
            }
            return Ok(index);
        }
        let info = self.resolve(constant)?;
        self.intern(info)
    }

    fn member(&mut self, member: &MemberRef) -> Result<(u16, u16)> {
        let owner = self.class(&member.owner)?;
        let nat = self.name_and_type(&member.name, &member.descriptor)?;
        Ok((owner, nat))
    }

    fn resolve(&mut self, constant: &Constant) -> Result<CpInfo> {
        Ok(match constant {
            Constant::Integer(v) => CpInfo::Integer(*v),
            Constant::Float(v) => CpInfo::Float(*v),
            Constant::Long(v) => CpInfo::Long(*v),
            Constant::Double(v) => CpInfo::Double(*v),
            Constant::Class(name) => CpInfo::Class(self.utf8(name)?),
            Constant::String(s) => CpInfo::String(self.java_string(s)?),
            Constant::FieldRef(m) => {
                let (owner, nat) = self.member(m)?;
                CpInfo::Fieldref(owner, nat)
            }
            Constant::MethodRef(m) => {
                let (owner, nat) = self.member(m)?;
                CpInfo::Methodref(owner, nat)
            }
            Constant::InterfaceMethodRef(m) => {
                let (owner, nat) = self.member(m)?;
                CpInfo::InterfaceMethodref(owner, nat)
            }
            Constant::MethodHandle { kind, reference } => {
                CpInfo::MethodHandle(*kind, self.constant(reference)?)
            }
            Constant::MethodType(desc) => CpInfo::MethodType(self.utf8(desc)?),
            Constant::Dynamic {
                bootstrap_method,
                name,
                descriptor,
            } => CpInfo::Dynamic(*bootstrap_method, self.name_and_type(name, descriptor)?),
            Constant::InvokeDynamic {
                bootstrap_method,
                name,
                descriptor,
            } => CpInfo::InvokeDynamic(*bootstrap_method, self.name_and_type(name, descriptor)?),
            Constant::Module(name) => CpInfo::Module(self.utf8(name)?),
            Constant::Package(name) => CpInfo::Package(self.utf8(name)?),
        })
    }

    /// Fills any reservations that were never referenced and serializes the pool.
    pub(crate) fn finish(mut self, out: &mut Writer) -> Result<()> {
        let mut pending: Vec<(u16, Constant)> = self
            .reserved
            .iter()
            .filter(|(_, &index)| self.entries[index as usize].is_none())
            .map(|(c, &index)| (index, c.clone()))
            .collect();
        pending.sort_by_key(|(index, _)| *index);
        for (_, constant) in pending {
            self.constant(&constant)?;
        }

        out.u2(self.entries.len() as u16);
        for entry in self.entries.iter().skip(1) {
            entry
                .as_ref()
                .ok_or(Error::Other("unfilled constant pool slot"))?
                .write(out)?;
        }
        Ok(())
    }
}
