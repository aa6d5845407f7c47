use std::path::PathBuf;

use shade_archive::PatternSet;

use super::builtin_patterns;
use crate::{EntrySink, ResourceEntry, TransformError, Transformer, TransformerContext};

const DEFAULT_LICENSE_PATHS: &[&str] = &[
    "META-INF/LICENSE",
    "META-INF/LICENSE.txt",
    "META-INF/LICENSE.md",
    "LICENSE",
    "LICENSE.txt",
    "LICENSE.md",
];

fn rule() -> String {
    "-".repeat(120)
}

/// Writes one license file: an optional SPDX header, the project's license,
/// then every distinct license text found in the merged sources.
#[derive(Debug)]
pub struct MergeLicenseResourceTransformer {
    patterns: PatternSet,
    output_path: String,
    spdx_id: Option<String>,
    artifact_license: PathBuf,
    first_separator: String,
    separator: String,
    elements: Vec<String>,
}

impl MergeLicenseResourceTransformer {
    /// `artifact_license` is the project's own license text file.
    pub fn new(artifact_license: impl Into<PathBuf>) -> Self {
        Self {
            patterns: builtin_patterns(DEFAULT_LICENSE_PATHS, &[]),
            output_path: "META-INF/LICENSE".to_string(),
            spdx_id: Some("Apache-2.0".to_string()),
            artifact_license: artifact_license.into(),
            first_separator: format!(
                "\n{}\n\nThis artifact includes dependencies with the following licenses:\n{}\n",
                rule(),
                "-".repeat(64)
            ),
            separator: format!("\n{}\n", rule()),
            elements: Vec::new(),
        }
    }

    pub fn output_path(mut self, path: impl Into<String>) -> Self {
        self.output_path = path.into();
        self
    }

    /// An empty or blank id disables the header line.
    pub fn spdx_id(mut self, id: Option<String>) -> Self {
        self.spdx_id = id;
        self
    }

    pub fn first_separator(mut self, separator: impl Into<String>) -> Self {
        self.first_separator = separator.into();
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Replaces the default license path patterns.
    pub fn patterns(mut self, patterns: PatternSet) -> Self {
        self.patterns = patterns;
        self
    }

    fn build(&self) -> Result<Vec<u8>, TransformError> {
        let mut out = Vec::new();
        if let Some(id) = self.spdx_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            out.extend_from_slice(format!("SPDX-License-Identifier: {id}\n").as_bytes());
        }

        let project = std::fs::read(&self.artifact_license).map_err(|source| TransformError::Io {
            path: self.artifact_license.clone(),
            source,
        })?;
        let project_text = String::from_utf8_lossy(&project).trim().to_string();
        out.extend_from_slice(&project);

        let mut elements = self
            .elements
            .iter()
            .filter(|text| **text != project_text)
            .peekable();
        if elements.peek().is_some() {
            out.extend_from_slice(format!("\n{}\n", self.first_separator).as_bytes());
            let separator = format!("\n{}\n", self.separator);
            for (index, text) in elements.enumerate() {
                if index > 0 {
                    out.extend_from_slice(separator.as_bytes());
                }
                out.extend_from_slice(text.as_bytes());
            }
        }
        Ok(out)
    }
}

impl Transformer for MergeLicenseResourceTransformer {
    fn name(&self) -> &str {
        "MergeLicenseResourceTransformer"
    }

    fn can_transform_resource(&mut self, entry: &ResourceEntry<'_>) -> bool {
        self.patterns.is_included(entry.path)
    }

    fn transform(&mut self, context: &TransformerContext<'_>) -> Result<(), TransformError> {
        let text = String::from_utf8_lossy(context.contents).trim().to_string();
        if !text.is_empty() && !self.elements.contains(&text) {
            self.elements.push(text);
        }
        Ok(())
    }

    fn has_transformed_resource(&self) -> bool {
        true
    }

    fn modify_output(&mut self, sink: &mut dyn EntrySink) -> Result<(), TransformError> {
        let contents = self.build()?;
        self.elements.clear();
        sink.write_entry(&self.output_path, &contents)
    }
}

/// Drops the Apache license files (`META-INF/LICENSE`, `META-INF/LICENSE.txt*`).
#[derive(Debug, Default)]
pub struct ApacheLicenseResourceTransformer;

const LICENSE_PATH: &str = "META-INF/LICENSE";
const LICENSE_TXT_PATH: &str = "META-INF/LICENSE.txt";

impl Transformer for ApacheLicenseResourceTransformer {
    fn name(&self) -> &str {
        "ApacheLicenseResourceTransformer"
    }

    fn can_transform_resource(&mut self, entry: &ResourceEntry<'_>) -> bool {
        let path = entry.path;
        path.eq_ignore_ascii_case(LICENSE_PATH)
            || path
                .get(..LICENSE_TXT_PATH.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(LICENSE_TXT_PATH))
    }
}
