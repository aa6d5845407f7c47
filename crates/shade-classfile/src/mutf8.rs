//! Modified UTF-8 as used by `CONSTANT_Utf8_info`.

use std::fmt;

use crate::error::{Error, Result};

/// Contents of a `CONSTANT_Utf8` entry.
///
/// Constants that do not decode to a valid Rust string (lone surrogates are
/// legal in class files) are carried as their raw bytes and written back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JavaString {
    Text(String),
    Raw(Vec<u8>),
}

impl JavaString {
    pub fn decode(bytes: &[u8]) -> Self {
        match decode(bytes) {
            Some(text) => JavaString::Text(text),
            None => JavaString::Raw(bytes.to_vec()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JavaString::Text(text) => Some(text),
            JavaString::Raw(_) => None,
        }
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>> {
        let bytes = match self {
            JavaString::Text(text) => encode(text),
            JavaString::Raw(raw) => raw.clone(),
        };
        if bytes.len() > u16::MAX as usize {
            return Err(Error::Other("string constant exceeds 65535 encoded bytes"));
        }
        Ok(bytes)
    }
}

impl From<&str> for JavaString {
    fn from(value: &str) -> Self {
        JavaString::Text(value.to_string())
    }
}

impl From<String> for JavaString {
    fn from(value: String) -> Self {
        JavaString::Text(value)
    }
}

impl fmt::Display for JavaString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaString::Text(text) => f.write_str(text),
            JavaString::Raw(raw) => write!(f, "<{} undecodable bytes>", raw.len()),
        }
    }
}

fn decode(bytes: &[u8]) -> Option<String> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i];
        if b0 & 0x80 == 0 {
            units.push(b0 as u16);
            i += 1;
        } else if b0 & 0xE0 == 0xC0 {
            let b1 = *bytes.get(i + 1)?;
            if b1 & 0xC0 != 0x80 {
                return None;
            }
            units.push((((b0 & 0x1F) as u16) << 6) | (b1 & 0x3F) as u16);
            i += 2;
        } else if b0 & 0xF0 == 0xE0 {
            let b1 = *bytes.get(i + 1)?;
            let b2 = *bytes.get(i + 2)?;
            if b1 & 0xC0 != 0x80 || b2 & 0xC0 != 0x80 {
                return None;
            }
            units.push(
                (((b0 & 0x0F) as u16) << 12) | (((b1 & 0x3F) as u16) << 6) | (b2 & 0x3F) as u16,
            );
            i += 3;
        } else {
            return None;
        }
    }
    String::from_utf16(&units).ok()
}

fn encode(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for unit in text.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | ((unit >> 6) & 0x1F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | ((unit >> 12) & 0x0F) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}
