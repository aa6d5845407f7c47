use std::collections::BTreeSet;
use std::time::SystemTime;

use shade_properties::Encoding;

use super::text_lines;
use crate::{EntrySink, ResourceEntry, TransformError, Transformer, TransformerContext};

const NOTICE_PATH: &str = "META-INF/NOTICE";
const NOTICE_PATHS: &[&str] = &[NOTICE_PATH, "META-INF/NOTICE.txt", "META-INF/NOTICE.md"];

/// Opens an organization block in resource-bundle style NOTICE files.
const ORGANIZATION_MARKER: &str = "This product includes/uses software(s) developed by";

/// Aggregates `META-INF/NOTICE*` files into one `META-INF/NOTICE`.
///
/// The output starts with a generated header, a copyright line and an
/// attribution line. Blank-line separated paragraphs from every input
/// follow, each written once. Paragraphs listed under an organization
/// block are grouped per organization right after the attribution line.
#[derive(Debug)]
pub struct ApacheNoticeResourceTransformer {
    project_name: String,
    add_header: bool,
    preamble1: String,
    preamble2: String,
    preamble3: String,
    organization_name: String,
    organization_url: String,
    inception_year: String,
    current_year: Option<u16>,
    copyright: Option<String>,
    encoding: Encoding,
    entries: Vec<String>,
    organizations: Vec<(String, BTreeSet<String>)>,
}

impl Default for ApacheNoticeResourceTransformer {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            add_header: true,
            preamble1: "// ------------------------------------------------------------------\n\
                        // NOTICE file corresponding to the section 4d of The Apache License,\n\
                        // Version 2.0, in this case for "
                .to_string(),
            preamble2: "\n// ------------------------------------------------------------------\n"
                .to_string(),
            preamble3: "This product includes software developed at\n".to_string(),
            organization_name: "The Apache Software Foundation".to_string(),
            organization_url: "https://www.apache.org/".to_string(),
            inception_year: "2006".to_string(),
            current_year: None,
            copyright: None,
            encoding: Encoding::Utf8,
            entries: Vec::new(),
            organizations: Vec::new(),
        }
    }
}

impl ApacheNoticeResourceTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = name.into();
        self
    }

    pub fn add_header(mut self, add_header: bool) -> Self {
        self.add_header = add_header;
        self
    }

    pub fn preamble1(mut self, text: impl Into<String>) -> Self {
        self.preamble1 = text.into();
        self
    }

    pub fn preamble2(mut self, text: impl Into<String>) -> Self {
        self.preamble2 = text.into();
        self
    }

    pub fn preamble3(mut self, text: impl Into<String>) -> Self {
        self.preamble3 = text.into();
        self
    }

    pub fn organization_name(mut self, name: impl Into<String>) -> Self {
        self.organization_name = name.into();
        self
    }

    pub fn organization_url(mut self, url: impl Into<String>) -> Self {
        self.organization_url = url.into();
        self
    }

    pub fn inception_year(mut self, year: impl Into<String>) -> Self {
        self.inception_year = year.into();
        self
    }

    /// Year used for the generated copyright line instead of the clock.
    pub fn current_year(mut self, year: u16) -> Self {
        self.current_year = Some(year);
        self
    }

    /// Copyright paragraph written second, replacing the generated one.
    pub fn copyright(mut self, copyright: Option<String>) -> Self {
        self.copyright = copyright;
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    fn add_entry(&mut self, entry: String) {
        if !self.entries.contains(&entry) {
            self.entries.push(entry);
        }
    }

    fn organization(&mut self, name: &str) -> usize {
        match self.organizations.iter().position(|(org, _)| org == name) {
            Some(index) => index,
            None => {
                self.organizations.push((name.to_string(), BTreeSet::new()));
                self.organizations.len() - 1
            }
        }
    }

    fn add_header_entries(&mut self) {
        let year = self.current_year.unwrap_or_else(|| {
            shade_archive::datetime_from_system_time(SystemTime::now()).year()
        });
        let year = year.to_string();
        let display_year = if self.inception_year != year {
            format!("{}-{year}", self.inception_year)
        } else {
            year
        };

        let header = if self.add_header {
            format!("{}{}{}", self.preamble1, self.project_name, self.preamble2)
        } else {
            String::new()
        };
        self.add_entry(header);
        // Placeholder for the copyright paragraph, replaced when one is found.
        self.add_entry(format!(
            "{}\nCopyright {display_year} {}\n",
            self.project_name, self.organization_name
        ));
        self.add_entry(format!(
            "{}{} ({}).\n",
            self.preamble3, self.organization_name, self.organization_url
        ));
    }

    fn finish_paragraph(&mut self, paragraph: String, organization: Option<usize>) {
        match organization {
            Some(org) => {
                self.organizations[org].1.insert(paragraph);
            }
            None => self.add_entry(paragraph),
        }
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for (index, entry) in self.entries.iter().enumerate() {
            let position = index + 1;
            if position != 2 && self.copyright.as_ref() == Some(entry) {
                continue;
            }
            match (&self.copyright, position) {
                (Some(copyright), 2) => out.push_str(copyright),
                _ => out.push_str(entry),
            }
            out.push('\n');
            if position == 3 {
                for (organization, paragraphs) in &self.organizations {
                    out.push_str(organization);
                    out.push('\n');
                    for paragraph in paragraphs {
                        out.push_str(paragraph);
                    }
                    out.push('\n');
                }
            }
        }
        out
    }
}

impl Transformer for ApacheNoticeResourceTransformer {
    fn name(&self) -> &str {
        "ApacheNoticeResourceTransformer"
    }

    fn can_transform_resource(&mut self, entry: &ResourceEntry<'_>) -> bool {
        NOTICE_PATHS
            .iter()
            .any(|path| entry.path.eq_ignore_ascii_case(path))
    }

    fn transform(&mut self, context: &TransformerContext<'_>) -> Result<(), TransformError> {
        if self.entries.is_empty() {
            self.add_header_entries();
        }

        let text = self.encoding.decode(context.contents);
        let mut paragraph = String::new();
        let mut organization = None;
        let mut line_count = 0;
        for line in text_lines(&text) {
            let trimmed = line.trim();
            if trimmed.starts_with("//") {
                continue;
            }
            if trimmed.is_empty() {
                let finished = std::mem::take(&mut paragraph);
                if finished.starts_with(&self.project_name) && finished.contains("Copyright ") {
                    self.copyright = Some(finished.clone());
                }
                self.finish_paragraph(finished, organization.take());
                line_count = 0;
                continue;
            }
            if trimmed.starts_with("- ") {
                if line_count == 1 && paragraph.contains(ORGANIZATION_MARKER) {
                    organization = Some(self.organization(paragraph.trim()));
                    paragraph.clear();
                } else if !paragraph.is_empty() {
                    if let Some(org) = organization {
                        self.organizations[org].1.insert(std::mem::take(&mut paragraph));
                    }
                }
            }
            paragraph.push_str(line);
            paragraph.push('\n');
            line_count += 1;
        }
        if !paragraph.is_empty() {
            self.finish_paragraph(paragraph, organization);
        }
        Ok(())
    }

    fn has_transformed_resource(&self) -> bool {
        !self.entries.is_empty()
    }

    fn modify_output(&mut self, sink: &mut dyn EntrySink) -> Result<(), TransformError> {
        let contents = self.encoding.encode(&self.render());
        self.entries.clear();
        self.organizations.clear();
        sink.write_entry(NOTICE_PATH, &contents)
    }
}
