use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use shade::DuplicatesStrategy;
use shade_archive::Compression;
use shade_properties::Encoding;
use shade_transform::MergeStrategy;

/// The project's own build output, merged before any dependency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Class directories or jars, in merge order.
    #[serde(default)]
    pub inputs: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "OutputConfig::default_path")]
    pub path: PathBuf,

    #[serde(default)]
    pub zip64: bool,

    #[serde(default)]
    pub compression: CompressionConfig,

    /// Fixed entry timestamps and permissions.
    #[serde(default = "OutputConfig::default_reproducible")]
    pub reproducible: bool,

    #[serde(default)]
    pub duplicates: DuplicatesConfig,

    /// Fail when any output path is produced twice, even with equal contents.
    #[serde(default)]
    pub fail_on_duplicate_entries: bool,
}

impl OutputConfig {
    fn default_path() -> PathBuf {
        PathBuf::from("shaded.jar")
    }

    fn default_reproducible() -> bool {
        false
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            zip64: false,
            compression: CompressionConfig::default(),
            reproducible: Self::default_reproducible(),
            duplicates: DuplicatesConfig::default(),
            fail_on_duplicate_entries: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionConfig {
    #[default]
    Deflated,
    Stored,
}

impl From<CompressionConfig> for Compression {
    fn from(value: CompressionConfig) -> Self {
        match value {
            CompressionConfig::Deflated => Compression::Deflated,
            CompressionConfig::Stored => Compression::Stored,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatesConfig {
    Include,
    #[default]
    Exclude,
    Warn,
    Fail,
}

impl From<DuplicatesConfig> for DuplicatesStrategy {
    fn from(value: DuplicatesConfig) -> Self {
        match value {
            DuplicatesConfig::Include => DuplicatesStrategy::Include,
            DuplicatesConfig::Exclude => DuplicatesStrategy::Exclude,
            DuplicatesConfig::Warn => DuplicatesStrategy::Warn,
            DuplicatesConfig::Fail => DuplicatesStrategy::Fail,
        }
    }
}

/// Entry path filter applied to every source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    /// Drop signature files, `INDEX.LIST` and `module-info.class`.
    #[serde(default = "FilterConfig::default_keep_default_excludes")]
    pub keep_default_excludes: bool,
}

impl FilterConfig {
    fn default_keep_default_excludes() -> bool {
        true
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            keep_default_excludes: Self::default_keep_default_excludes(),
        }
    }
}

/// One `[[relocate]]` rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelocateConfig {
    pub pattern: String,

    /// Defaults to `hidden.<pattern>`; required for raw-string rules.
    #[serde(default)]
    pub destination: Option<String>,

    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    /// Treat `pattern` as a regular expression over paths.
    #[serde(default)]
    pub raw_string: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Charset {
    #[default]
    #[serde(rename = "ISO-8859-1", alias = "iso-8859-1")]
    Iso8859_1,
    #[serde(rename = "UTF-8", alias = "utf-8")]
    Utf8,
}

impl From<Charset> for Encoding {
    fn from(value: Charset) -> Self {
        match value {
            Charset::Iso8859_1 => Encoding::Iso8859_1,
            Charset::Utf8 => Encoding::Utf8,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategyConfig {
    #[default]
    First,
    Latest,
    Append,
}

impl From<MergeStrategyConfig> for MergeStrategy {
    fn from(value: MergeStrategyConfig) -> Self {
        match value {
            MergeStrategyConfig::First => MergeStrategy::First,
            MergeStrategyConfig::Latest => MergeStrategy::Latest,
            MergeStrategyConfig::Append => MergeStrategy::Append,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertiesMapping {
    #[serde(default)]
    pub merge_strategy: Option<MergeStrategyConfig>,

    #[serde(default)]
    pub merge_separator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestAttribute {
    pub name: String,
    pub value: String,
}

fn default_merge_separator() -> String {
    ",".to_string()
}

/// One `[[transform]]` table, selected by its `type` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", deny_unknown_fields)]
pub enum TransformConfig {
    ServiceFile {
        /// Registry directory, `META-INF/services` by default.
        #[serde(default)]
        path: Option<String>,
        #[serde(default)]
        include: Vec<String>,
        #[serde(default)]
        exclude: Vec<String>,
    },
    Properties {
        /// Literal paths or whole-path regular expressions to claim.
        #[serde(default)]
        paths: Vec<String>,
        #[serde(default)]
        mappings: BTreeMap<String, PropertiesMapping>,
        #[serde(default)]
        merge_strategy: MergeStrategyConfig,
        #[serde(default = "default_merge_separator")]
        merge_separator: String,
        #[serde(default)]
        charset: Charset,
    },
    Manifest {
        #[serde(default)]
        main_class: Option<String>,
        #[serde(default)]
        attributes: BTreeMap<String, String>,
    },
    ManifestAppender {
        #[serde(default)]
        attributes: Vec<ManifestAttribute>,
    },
    XmlAppending {
        resource: String,
    },
    MergeLicense {
        /// The project's own license text.
        artifact_license: PathBuf,
        #[serde(default)]
        output_path: Option<String>,
        /// An empty id disables the SPDX header.
        #[serde(default)]
        spdx_id: Option<String>,
        #[serde(default)]
        first_separator: Option<String>,
        #[serde(default)]
        separator: Option<String>,
        /// License paths to collect, replacing the default list.
        #[serde(default)]
        paths: Vec<String>,
    },
    Deduplicating {
        #[serde(default)]
        include: Vec<String>,
        #[serde(default)]
        exclude: Vec<String>,
    },
    Appending {
        resource: String,
    },
    DontInclude {
        resource: String,
    },
    Include {
        file: PathBuf,
        resource: String,
    },
    PreserveFirstFound {
        resources: Vec<String>,
    },
    ApacheLicense,
    ApacheNotice {
        #[serde(default)]
        project_name: Option<String>,
        /// Set to `false` to leave out the generated section 4d header.
        #[serde(default)]
        add_header: Option<bool>,
        #[serde(default)]
        preamble1: Option<String>,
        #[serde(default)]
        preamble2: Option<String>,
        #[serde(default)]
        preamble3: Option<String>,
        #[serde(default)]
        organization_name: Option<String>,
        #[serde(default)]
        organization_url: Option<String>,
        #[serde(default)]
        inception_year: Option<String>,
        #[serde(default)]
        copyright: Option<String>,
        /// UTF-8 unless set.
        #[serde(default)]
        charset: Option<Charset>,
    },
    ComponentsXml,
    GroovyExtensionModule,
    SpringFile {
        #[serde(default)]
        charset: Charset,
    },
}

impl TransformConfig {
    /// The `type` key of this table.
    pub fn kind(&self) -> &'static str {
        match self {
            TransformConfig::ServiceFile { .. } => "service-file",
            TransformConfig::Properties { .. } => "properties",
            TransformConfig::Manifest { .. } => "manifest",
            TransformConfig::ManifestAppender { .. } => "manifest-appender",
            TransformConfig::XmlAppending { .. } => "xml-appending",
            TransformConfig::MergeLicense { .. } => "merge-license",
            TransformConfig::Deduplicating { .. } => "deduplicating",
            TransformConfig::Appending { .. } => "appending",
            TransformConfig::DontInclude { .. } => "dont-include",
            TransformConfig::Include { .. } => "include",
            TransformConfig::PreserveFirstFound { .. } => "preserve-first-found",
            TransformConfig::ApacheLicense => "apache-license",
            TransformConfig::ApacheNotice { .. } => "apache-notice",
            TransformConfig::ComponentsXml => "components-xml",
            TransformConfig::GroovyExtensionModule => "groovy-extension-module",
            TransformConfig::SpringFile { .. } => "spring-file",
        }
    }

    /// Kinds that would only shadow each other when configured twice.
    pub fn is_singleton(&self) -> bool {
        matches!(
            self,
            TransformConfig::Manifest { .. }
                | TransformConfig::ApacheLicense
                | TransformConfig::ApacheNotice { .. }
                | TransformConfig::ComponentsXml
                | TransformConfig::GroovyExtensionModule
                | TransformConfig::SpringFile { .. }
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MinimizeConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Dependency notations (`name`, `group:name`, `group:name:version`).
    #[serde(default)]
    pub include: Vec<String>,

    /// Dependencies kept whole, together with their own dependencies.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Dependencies whose classes are always kept and followed.
    #[serde(default)]
    pub api: Vec<String>,
}

/// The resolved dependency graph and which of its nodes to merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependenciesConfig {
    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default, rename = "artifact")]
    pub artifacts: Vec<ArtifactConfig>,
}

/// One `[[dependencies.artifact]]` node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactConfig {
    /// `group:name:version`.
    pub coordinates: String,

    #[serde(default)]
    pub files: Vec<PathBuf>,

    /// Coordinates of this node's direct dependencies.
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Declared by the project itself rather than pulled in transitively.
    #[serde(default = "ArtifactConfig::default_direct")]
    pub direct: bool,
}

impl ArtifactConfig {
    fn default_direct() -> bool {
        true
    }
}
