//! Reading and deterministic writing of Java `.properties` files.
//!
//! Output is sorted by key and carries no comment or timestamp line, so
//! identical inputs always produce identical bytes.

use std::collections::BTreeMap;

/// Character encoding of a properties file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Encoding {
    /// The classic encoding; characters above `U+007E` are written as `\uXXXX`.
    #[default]
    Iso8859_1,
    Utf8,
}

impl Encoding {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().replace('_', "-").as_str() {
            "iso-8859-1" | "latin1" | "iso8859-1" => Some(Encoding::Iso8859_1),
            "utf-8" | "utf8" => Some(Encoding::Utf8),
            _ => None,
        }
    }

    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Iso8859_1 => bytes.iter().map(|&b| b as char).collect(),
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    /// Plain text encoding; characters outside ISO-8859-1 become `?`.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Encoding::Iso8859_1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
            Encoding::Utf8 => text.as_bytes().to_vec(),
        }
    }
}

/// An entry in file order, as read from the source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyEntry {
    pub key: String,
    pub value: String,
}

/// Key/value pairs with sorted iteration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `bytes`; a key repeated within one file keeps its last value.
    pub fn parse(bytes: &[u8], encoding: Encoding) -> Self {
        let mut props = Self::new();
        for entry in parse_entries(bytes, encoding) {
            props.insert(entry.key, entry.value);
        }
        props
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Serializes in key order, one `key=value` line each.
    pub fn to_bytes(&self, encoding: Encoding) -> Vec<u8> {
        let mut text = String::new();
        for (key, value) in &self.entries {
            escape_into(&mut text, key, true, encoding);
            text.push('=');
            escape_into(&mut text, value, false, encoding);
            text.push('\n');
        }
        match encoding {
            // Every char is <= U+007E after escaping.
            Encoding::Iso8859_1 => text.chars().map(|c| c as u8).collect(),
            Encoding::Utf8 => text.into_bytes(),
        }
    }
}

impl FromIterator<(String, String)> for Properties {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Parses every key/value pair in file order, duplicates included.
pub fn parse_entries(bytes: &[u8], encoding: Encoding) -> Vec<PropertyEntry> {
    let text = encoding.decode(bytes);
    let chars: Vec<char> = text.chars().collect();
    let mut offset = 0usize;
    let mut entries = Vec::new();

    while offset < chars.len() {
        let line = read_logical_line(&chars, &mut offset);
        if let Some(entry) = parse_logical_line(&line) {
            entries.push(entry);
        }
    }
    entries
}

fn read_logical_line(chars: &[char], offset: &mut usize) -> Vec<char> {
    let mut out = Vec::new();
    let mut first = true;

    loop {
        // Leading whitespace of the first line and of continuation lines is dropped.
        while *offset < chars.len() && is_whitespace(chars[*offset]) {
            *offset += 1;
        }

        let start = *offset;
        let mut end = start;
        while end < chars.len() && chars[end] != '\n' && chars[end] != '\r' {
            end += 1;
        }
        let segment = &chars[start..end];

        // Consume `\n`, `\r` or `\r\n`.
        *offset = end;
        if *offset < chars.len() && chars[*offset] == '\r' {
            *offset += 1;
        }
        if *offset < chars.len() && chars[*offset] == '\n' {
            *offset += 1;
        }

        // Comment lines never continue.
        if first && matches!(segment.first(), Some('#') | Some('!')) {
            return Vec::new();
        }
        first = false;

        let continues = ends_with_unescaped_backslash(segment);
        let copy = if continues {
            &segment[..segment.len() - 1]
        } else {
            segment
        };
        out.extend_from_slice(copy);

        if !continues || *offset >= chars.len() {
            return out;
        }
    }
}

fn ends_with_unescaped_backslash(line: &[char]) -> bool {
    line.iter().rev().take_while(|&&c| c == '\\').count() % 2 == 1
}

fn parse_logical_line(line: &[char]) -> Option<PropertyEntry> {
    if line.is_empty() {
        return None;
    }

    let mut i = 0usize;
    while i < line.len() {
        match line[i] {
            '\\' => i += 2,
            '=' | ':' => break,
            c if is_whitespace(c) => break,
            _ => i += 1,
        }
    }
    let key_end = i.min(line.len());

    while i < line.len() && is_whitespace(line[i]) {
        i += 1;
    }
    if i < line.len() && (line[i] == '=' || line[i] == ':') {
        i += 1;
    }
    while i < line.len() && is_whitespace(line[i]) {
        i += 1;
    }

    Some(PropertyEntry {
        key: unescape(&line[..key_end]),
        value: unescape(&line[i.min(line.len())..]),
    })
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0C')
}

fn unescape(chars: &[char]) -> String {
    let mut units: Vec<u16> = Vec::with_capacity(chars.len());
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        if c != '\\' {
            push_char(&mut units, c);
            continue;
        }
        let Some(&escaped) = chars.get(i) else {
            break;
        };
        i += 1;
        match escaped {
            't' => units.push(u16::from(b'\t')),
            'n' => units.push(u16::from(b'\n')),
            'r' => units.push(u16::from(b'\r')),
            'f' => units.push(0x0C),
            'u' => {
                let hex: String = chars[i..chars.len().min(i + 4)].iter().collect();
                match u16::from_str_radix(&hex, 16) {
                    Ok(unit) if hex.len() == 4 => {
                        units.push(unit);
                        i += 4;
                    }
                    _ => units.push(u16::from(b'u')),
                }
            }
            other => push_char(&mut units, other),
        }
    }

    // Escapes may spell surrogate pairs.
    String::from_utf16_lossy(&units)
}

fn push_char(units: &mut Vec<u16>, c: char) {
    let mut buf = [0u16; 2];
    units.extend_from_slice(c.encode_utf16(&mut buf));
}

fn escape_into(out: &mut String, text: &str, is_key: bool, encoding: Encoding) {
    for (index, c) in text.chars().enumerate() {
        match c {
            ' ' if is_key || index == 0 => out.push_str("\\ "),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0C' => out.push_str("\\f"),
            '\\' | '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || (encoding == Encoding::Iso8859_1 && (c as u32) > 0x7E) => {
                let mut buf = [0u16; 2];
                for unit in c.encode_utf16(&mut buf) {
                    out.push_str(&format!("\\u{unit:04X}"));
                }
            }
            c => out.push(c),
        }
    }
}
