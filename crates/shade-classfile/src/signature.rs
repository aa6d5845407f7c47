//! Generic signatures (JVMS 4.7.9.1): parsing, printing and name remapping.

use std::fmt;

use crate::descriptor::BaseType;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub super_class: ClassTypeSignature,
    pub interfaces: Vec<ClassTypeSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub parameters: Vec<TypeSignature>,
    /// `None` for `V`.
    pub return_type: Option<TypeSignature>,
    pub throws: Vec<FieldTypeSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParameter {
    pub name: String,
    pub class_bound: Option<FieldTypeSignature>,
    pub interface_bounds: Vec<FieldTypeSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSignature {
    Base(BaseType),
    Field(FieldTypeSignature),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTypeSignature {
    Class(ClassTypeSignature),
    Array(Box<TypeSignature>),
    TypeVariable(String),
}

/// `Lpkg/Outer<TA;>.Inner<TB;>;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTypeSignature {
    /// Internal name of the outermost class, package included.
    pub name: String,
    pub type_arguments: Vec<TypeArgument>,
    pub inner: Vec<InnerClassType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClassType {
    pub name: String,
    pub type_arguments: Vec<TypeArgument>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeArgument {
    Any,
    Exact(FieldTypeSignature),
    Extends(FieldTypeSignature),
    Super(FieldTypeSignature),
}

pub fn parse_class_signature(sig: &str) -> Result<ClassSignature> {
    let mut p = Parser::new(sig);
    let type_parameters = p.type_parameters()?;
    let super_class = p.class_type()?;
    let mut interfaces = Vec::new();
    while !p.at_end() {
        interfaces.push(p.class_type()?);
    }
    Ok(ClassSignature {
        type_parameters,
        super_class,
        interfaces,
    })
}

pub fn parse_method_signature(sig: &str) -> Result<MethodSignature> {
    let mut p = Parser::new(sig);
    let type_parameters = p.type_parameters()?;
    p.expect(b'(')?;
    let mut parameters = Vec::new();
    while p.peek()? != b')' {
        parameters.push(p.type_signature()?);
    }
    p.expect(b')')?;
    let return_type = if p.peek()? == b'V' {
        p.bump();
        None
    } else {
        Some(p.type_signature()?)
    };
    let mut throws = Vec::new();
    while !p.at_end() {
        p.expect(b'^')?;
        throws.push(p.field_type()?);
    }
    Ok(MethodSignature {
        type_parameters,
        parameters,
        return_type,
        throws,
    })
}

pub fn parse_field_signature(sig: &str) -> Result<FieldTypeSignature> {
    let mut p = Parser::new(sig);
    let ty = p.field_type()?;
    p.finish()?;
    Ok(ty)
}

struct Parser<'a> {
    sig: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(sig: &'a str) -> Self {
        Self { sig, pos: 0 }
    }

    fn error(&self) -> Error {
        Error::InvalidSignature(self.sig.to_string())
    }

    fn at_end(&self) -> bool {
        self.pos >= self.sig.len()
    }

    fn finish(&self) -> Result<()> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn peek(&self) -> Result<u8> {
        self.sig
            .as_bytes()
            .get(self.pos)
            .copied()
            .ok_or_else(|| self.error())
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn expect(&mut self, b: u8) -> Result<()> {
        if self.peek()? == b {
            self.bump();
            Ok(())
        } else {
            Err(self.error())
        }
    }

    /// Consumes an identifier up to (not including) the first byte in `stops`.
    fn identifier(&mut self, stops: &[u8]) -> Result<&'a str> {
        let start = self.pos;
        let rest = &self.sig.as_bytes()[start..];
        let len = rest
            .iter()
            .position(|b| stops.contains(b))
            .ok_or_else(|| self.error())?;
        if len == 0 {
            return Err(self.error());
        }
        self.pos += len;
        Ok(&self.sig[start..start + len])
    }

    fn type_parameters(&mut self) -> Result<Vec<TypeParameter>> {
        let mut params = Vec::new();
        if self.at_end() || self.peek()? != b'<' {
            return Ok(params);
        }
        self.bump();
        while self.peek()? != b'>' {
            let name = self.identifier(b":")?.to_string();
            self.expect(b':')?;
            let class_bound = match self.peek()? {
                b'L' | b'[' | b'T' => Some(self.field_type()?),
                _ => None,
            };
            let mut interface_bounds = Vec::new();
            while self.peek()? == b':' {
                self.bump();
                interface_bounds.push(self.field_type()?);
            }
            params.push(TypeParameter {
                name,
                class_bound,
                interface_bounds,
            });
        }
        self.bump();
        if params.is_empty() {
            return Err(self.error());
        }
        Ok(params)
    }

    fn type_signature(&mut self) -> Result<TypeSignature> {
        let b = self.peek()?;
        match BaseType::from_char(b as char) {
            Some(base) => {
                self.bump();
                Ok(TypeSignature::Base(base))
            }
            None => Ok(TypeSignature::Field(self.field_type()?)),
        }
    }

    fn field_type(&mut self) -> Result<FieldTypeSignature> {
        match self.peek()? {
            b'L' => Ok(FieldTypeSignature::Class(self.class_type()?)),
            b'[' => {
                self.bump();
                Ok(FieldTypeSignature::Array(Box::new(self.type_signature()?)))
            }
            b'T' => {
                self.bump();
                let name = self.identifier(b";")?.to_string();
                self.expect(b';')?;
                Ok(FieldTypeSignature::TypeVariable(name))
            }
            _ => Err(self.error()),
        }
    }

    fn class_type(&mut self) -> Result<ClassTypeSignature> {
        self.expect(b'L')?;
        let name = self.identifier(b"<.;")?.to_string();
        let type_arguments = self.type_arguments()?;
        let mut inner = Vec::new();
        while self.peek()? == b'.' {
            self.bump();
            let name = self.identifier(b"<.;")?.to_string();
            let type_arguments = self.type_arguments()?;
            inner.push(InnerClassType {
                name,
                type_arguments,
            });
        }
        self.expect(b';')?;
        Ok(ClassTypeSignature {
            name,
            type_arguments,
            inner,
        })
    }

    fn type_arguments(&mut self) -> Result<Vec<TypeArgument>> {
        let mut args = Vec::new();
        if self.peek()? != b'<' {
            return Ok(args);
        }
        self.bump();
        while self.peek()? != b'>' {
            let arg = match self.peek()? {
                b'*' => {
                    self.bump();
                    TypeArgument::Any
                }
                b'+' => {
                    self.bump();
                    TypeArgument::Extends(self.field_type()?)
                }
                b'-' => {
                    self.bump();
                    TypeArgument::Super(self.field_type()?)
                }
                _ => TypeArgument::Exact(self.field_type()?),
            };
            args.push(arg);
        }
        self.bump();
        if args.is_empty() {
            return Err(self.error());
        }
        Ok(args)
    }
}

fn write_type_parameters(f: &mut fmt::Formatter<'_>, params: &[TypeParameter]) -> fmt::Result {
    if params.is_empty() {
        return Ok(());
    }
    f.write_str("<")?;
    for param in params {
        write!(f, "{}:", param.name)?;
        if let Some(bound) = &param.class_bound {
            write!(f, "{bound}")?;
        }
        for bound in &param.interface_bounds {
            write!(f, ":{bound}")?;
        }
    }
    f.write_str(">")
}

fn write_type_arguments(f: &mut fmt::Formatter<'_>, args: &[TypeArgument]) -> fmt::Result {
    if args.is_empty() {
        return Ok(());
    }
    f.write_str("<")?;
    for arg in args {
        match arg {
            TypeArgument::Any => f.write_str("*")?,
            TypeArgument::Exact(ty) => write!(f, "{ty}")?,
            TypeArgument::Extends(ty) => write!(f, "+{ty}")?,
            TypeArgument::Super(ty) => write!(f, "-{ty}")?,
        }
    }
    f.write_str(">")
}

impl fmt::Display for ClassSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type_parameters(f, &self.type_parameters)?;
        write!(f, "{}", self.super_class)?;
        for interface in &self.interfaces {
            write!(f, "{interface}")?;
        }
        Ok(())
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type_parameters(f, &self.type_parameters)?;
        f.write_str("(")?;
        for param in &self.parameters {
            write!(f, "{param}")?;
        }
        f.write_str(")")?;
        match &self.return_type {
            Some(ty) => write!(f, "{ty}")?,
            None => f.write_str("V")?,
        }
        for throws in &self.throws {
            write!(f, "^{throws}")?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSignature::Base(base) => write!(f, "{}", base.descriptor_char()),
            TypeSignature::Field(ty) => write!(f, "{ty}"),
        }
    }
}

impl fmt::Display for FieldTypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldTypeSignature::Class(class) => write!(f, "{class}"),
            FieldTypeSignature::Array(component) => write!(f, "[{component}"),
            FieldTypeSignature::TypeVariable(name) => write!(f, "T{name};"),
        }
    }
}

impl fmt::Display for ClassTypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.name)?;
        write_type_arguments(f, &self.type_arguments)?;
        for inner in &self.inner {
            write!(f, ".{}", inner.name)?;
            write_type_arguments(f, &inner.type_arguments)?;
        }
        f.write_str(";")
    }
}

// Remapping. Type variable names are never passed to `map`.

impl ClassSignature {
    pub fn map_names(&mut self, map: &mut dyn FnMut(&str) -> String) {
        map_type_parameters(&mut self.type_parameters, map);
        self.super_class.map_names(map);
        for interface in &mut self.interfaces {
            interface.map_names(map);
        }
    }
}

impl MethodSignature {
    pub fn map_names(&mut self, map: &mut dyn FnMut(&str) -> String) {
        map_type_parameters(&mut self.type_parameters, map);
        for param in &mut self.parameters {
            param.map_names(map);
        }
        if let Some(ret) = &mut self.return_type {
            ret.map_names(map);
        }
        for throws in &mut self.throws {
            throws.map_names(map);
        }
    }
}

fn map_type_parameters(params: &mut [TypeParameter], map: &mut dyn FnMut(&str) -> String) {
    for param in params {
        if let Some(bound) = &mut param.class_bound {
            bound.map_names(map);
        }
        for bound in &mut param.interface_bounds {
            bound.map_names(map);
        }
    }
}

impl TypeSignature {
    pub fn map_names(&mut self, map: &mut dyn FnMut(&str) -> String) {
        if let TypeSignature::Field(ty) = self {
            ty.map_names(map);
        }
    }
}

impl FieldTypeSignature {
    pub fn map_names(&mut self, map: &mut dyn FnMut(&str) -> String) {
        match self {
            FieldTypeSignature::Class(class) => class.map_names(map),
            FieldTypeSignature::Array(component) => component.map_names(map),
            FieldTypeSignature::TypeVariable(_) => {}
        }
    }
}

impl ClassTypeSignature {
    /// Maps the outer class name, then each inner segment by mapping its full
    /// binary name (`Outer$Inner`) and keeping the suffix after the mapped outer.
    pub fn map_names(&mut self, map: &mut dyn FnMut(&str) -> String) {
        let mut original = self.name.clone();
        let mut mapped = map(&self.name);
        self.name = mapped.clone();
        map_type_arguments(&mut self.type_arguments, map);

        for inner in &mut self.inner {
            let full = format!("{original}${}", inner.name);
            let mapped_outer = format!("{mapped}$");
            let mapped_full = map(&full);
            let start = if mapped_full.starts_with(&mapped_outer) {
                mapped_outer.len()
            } else {
                mapped_full.rfind('$').map_or(0, |i| i + 1)
            };
            inner.name = mapped_full[start..].to_string();
            map_type_arguments(&mut inner.type_arguments, map);
            original = full;
            mapped = mapped_full;
        }
    }
}

fn map_type_arguments(args: &mut [TypeArgument], map: &mut dyn FnMut(&str) -> String) {
    for arg in args {
        match arg {
            TypeArgument::Any => {}
            TypeArgument::Exact(ty) | TypeArgument::Extends(ty) | TypeArgument::Super(ty) => {
                ty.map_names(map)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn shade(name: &str) -> String {
        match name.strip_prefix("org/foo/") {
            Some(rest) => format!("shaded/org/foo/{rest}"),
            None => name.to_string(),
        }
    }

    #[test]
    fn class_signature_round_trips() {
        let sig = "<K:Ljava/lang/Object;V::Ljava/lang/Comparable<-TV;>;>Ljava/util/AbstractMap<TK;TV;>;Ljava/io/Serializable;";
        let parsed = parse_class_signature(sig).unwrap();
        assert_eq!(parsed.type_parameters.len(), 2);
        assert!(parsed.type_parameters[1].class_bound.is_none());
        assert_eq!(parsed.to_string(), sig);
    }

    #[test]
    fn method_signature_round_trips() {
        let sig = "<T:Ljava/lang/Object;>([TT;ILjava/util/List<+Ljava/lang/Number;>;)V^Ljava/io/IOException;^TT;";
        let parsed = parse_method_signature(sig).unwrap();
        assert_eq!(parsed.parameters.len(), 3);
        assert_eq!(parsed.throws.len(), 2);
        assert_eq!(parsed.to_string(), sig);
    }

    #[test]
    fn remaps_class_names_but_not_type_variables() {
        let mut sig =
            parse_method_signature("<Lorg/foo/X:Ljava/lang/Object;>(TLorg/foo/X;Lorg/foo/Box<*>;)Lorg/foo/Y;")
                .unwrap();
        sig.map_names(&mut |n| shade(n));
        assert_eq!(
            sig.to_string(),
            "<Lorg/foo/X:Ljava/lang/Object;>(TLorg/foo/X;Lshaded/org/foo/Box<*>;)Lshaded/org/foo/Y;"
        );
    }

    #[test]
    fn remaps_inner_class_segments() {
        let mut sig = parse_field_signature("Lorg/foo/Outer<TT;>.Inner<Ljava/lang/String;>;").unwrap();
        sig.map_names(&mut |n| shade(n));
        assert_eq!(
            sig.to_string(),
            "Lshaded/org/foo/Outer<TT;>.Inner<Ljava/lang/String;>;"
        );
    }

    #[test]
    fn rejects_malformed_signatures() {
        assert!(parse_field_signature("Ljava/util/List<>;").is_err());
        assert!(parse_method_signature("(I").is_err());
        assert!(parse_class_signature("Ljava/lang/Object").is_err());
        assert!(parse_field_signature("TT;junk").is_err());
    }
}
