//! JAR manifest model (`META-INF/MANIFEST.MF`).

pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

const MANIFEST_VERSION: &str = "Manifest-Version";
const SIGNATURE_VERSION: &str = "Signature-Version";
const MAX_LINE_BYTES: usize = 72;

/// Attributes of one manifest section. Names compare case-insensitively;
/// insertion order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replaces the value in place, or appends a new attribute.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self
            .entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub main: Attributes,
    /// Per-entry sections keyed by their `Name` attribute.
    pub sections: Vec<(String, Attributes)>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid manifest line {line}: {message}")]
pub struct ManifestError {
    pub line: usize,
    pub message: &'static str,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, ManifestError> {
        let text = String::from_utf8_lossy(bytes);
        let mut manifest = Manifest::new();
        let mut current = Attributes::new();
        let mut in_main = true;
        let mut last: Option<(String, String)> = None;

        let flush_attr = |attrs: &mut Attributes, last: &mut Option<(String, String)>| {
            if let Some((name, value)) = last.take() {
                attrs.insert(name, value);
            }
        };

        for (index, line) in split_lines(&text).enumerate() {
            let line_no = index + 1;
            if let Some(rest) = line.strip_prefix(' ') {
                match last.as_mut() {
                    Some((_, value)) => value.push_str(rest),
                    None => {
                        return Err(ManifestError {
                            line: line_no,
                            message: "continuation line without an attribute",
                        })
                    }
                }
                continue;
            }

            flush_attr(&mut current, &mut last);

            if line.is_empty() {
                if !current.is_empty() || in_main {
                    manifest.close_section(std::mem::take(&mut current), &mut in_main);
                }
                continue;
            }

            let Some((name, value)) = line.split_once(':') else {
                return Err(ManifestError {
                    line: line_no,
                    message: "expected `Name: value`",
                });
            };
            if name.is_empty() || name.contains(' ') {
                return Err(ManifestError {
                    line: line_no,
                    message: "invalid attribute name",
                });
            }
            last = Some((name.to_string(), value.strip_prefix(' ').unwrap_or(value).to_string()));
        }

        flush_attr(&mut current, &mut last);
        if !current.is_empty() || in_main {
            manifest.close_section(current, &mut in_main);
        }
        Ok(manifest)
    }

    fn close_section(&mut self, mut attrs: Attributes, in_main: &mut bool) {
        if *in_main {
            self.main = attrs;
            *in_main = false;
        } else if let Some(name) = attrs.remove("Name") {
            self.sections.push((name, attrs));
        }
    }

    pub fn section(&self, name: &str) -> Option<&Attributes> {
        self.sections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, attrs)| attrs)
    }

    /// Serializes with CRLF line endings and 72-byte line wrapping.
    ///
    /// The version attribute is always written first; `Manifest-Version: 1.0`
    /// is supplied when neither version attribute is present.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let version = [MANIFEST_VERSION, SIGNATURE_VERSION]
            .into_iter()
            .find_map(|name| self.main.get(name).map(|v| (name, v)));
        let (version_name, version_value) = version.unwrap_or((MANIFEST_VERSION, "1.0"));
        write_attribute(&mut out, version_name, version_value);
        for (name, value) in self.main.iter() {
            if !name.eq_ignore_ascii_case(version_name) {
                write_attribute(&mut out, name, value);
            }
        }
        out.extend_from_slice(b"\r\n");

        for (section, attrs) in &self.sections {
            write_attribute(&mut out, "Name", section);
            for (name, value) in attrs.iter() {
                write_attribute(&mut out, name, value);
            }
            out.extend_from_slice(b"\r\n");
        }
        out
    }
}

fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let text = text
        .strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .or_else(|| text.strip_suffix('\r'))
        .unwrap_or(text);
    text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line))
}

fn write_attribute(out: &mut Vec<u8>, name: &str, value: &str) {
    let line = format!("{name}: {value}");
    let mut rest = line.as_str();
    let mut limit = MAX_LINE_BYTES;
    while rest.len() > limit {
        let mut cut = limit;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        out.extend_from_slice(rest[..cut].as_bytes());
        out.extend_from_slice(b"\r\n ");
        rest = &rest[cut..];
        limit = MAX_LINE_BYTES - 1;
    }
    out.extend_from_slice(rest.as_bytes());
    out.extend_from_slice(b"\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_main_attributes_sections_and_continuations() {
        let text = "Manifest-Version: 1.0\r\nMain-Class: org.foo.\r\n Main\r\n\r\nName: org/foo/\r\nSealed: true\r\n\r\n";
        let manifest = Manifest::parse(text.as_bytes()).unwrap();
        assert_eq!(manifest.main.get("main-class"), Some("org.foo.Main"));
        assert_eq!(manifest.section("org/foo/").and_then(|s| s.get("Sealed")), Some("true"));
    }

    #[test]
    fn writes_version_first_and_wraps_long_lines() {
        let mut manifest = Manifest::new();
        manifest.main.insert("Manifest-Version", "1.0");
        manifest.main.insert("Class-Path", "x".repeat(100));
        let bytes = manifest.to_bytes();
        let text = String::from_utf8(bytes.clone()).unwrap();

        assert!(text.starts_with("Manifest-Version: 1.0\r\nClass-Path: "));
        assert!(text.lines().all(|line| line.trim_end_matches('\r').len() <= 72));
        assert!(text.ends_with("\r\n\r\n"));
        assert_eq!(Manifest::parse(&bytes).unwrap(), manifest);
    }

    #[test]
    fn missing_version_is_supplied() {
        let text = String::from_utf8(Manifest::new().to_bytes()).unwrap();
        assert_eq!(text, "Manifest-Version: 1.0\r\n\r\n");
    }

    #[test]
    fn rejects_lines_without_separator() {
        let err = Manifest::parse(b"Manifest-Version: 1.0\r\ngarbage\r\n").unwrap_err();
        assert_eq!(err.line, 2);
    }
}
