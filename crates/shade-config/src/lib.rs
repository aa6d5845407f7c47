//! `shade.toml`: the file form of a merge.
//!
//! [`ConfigFile`] mirrors the TOML layout. [`ConfigFile::validate`] reports
//! every semantic problem at once, and [`ConfigFile::into_plan`] turns a
//! valid file into a [`Plan`] holding the runtime [`shade::ShadeConfig`],
//! the dependency graph and the minimization settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod logging;
mod plan;
mod schema;
mod validation;

pub use logging::{init_tracing, LoggingConfig};
pub use plan::Plan;
pub use schema::{
    ArtifactConfig, Charset, CompressionConfig, DependenciesConfig, DuplicatesConfig,
    FilterConfig, ManifestAttribute, MergeStrategyConfig, MinimizeConfig, OutputConfig,
    ProjectConfig, PropertiesMapping, RelocateConfig, TransformConfig,
};

/// File name looked up next to the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "shade.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
    #[error("invalid configuration:\n{}", .0.iter().map(|p| format!("  - {p}")).collect::<Vec<_>>().join("\n"))]
    Invalid(Vec<String>),
}

impl ConfigError {
    /// The individual problems of an [`ConfigError::Invalid`] error.
    pub fn problems(&self) -> &[String] {
        match self {
            ConfigError::Invalid(problems) => problems,
            _ => &[],
        }
    }
}

/// Keeps the message and location of a TOML error without echoing the
/// offending source line.
fn describe_toml_error(err: &toml::de::Error, text: &str) -> String {
    match err.span() {
        Some(span) => {
            let before = &text[..span.start.min(text.len())];
            let line = before.matches('\n').count() + 1;
            let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
            format!("{} at line {line}, column {column}", err.message().trim_end())
        }
        None => err.message().trim_end().to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub relocate: Vec<RelocateConfig>,

    #[serde(default)]
    pub transform: Vec<TransformConfig>,

    #[serde(default)]
    pub minimize: MinimizeConfig,

    #[serde(default)]
    pub dependencies: DependenciesConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ConfigFile {
    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|err| ConfigError::Toml(describe_toml_error(&err, text)))
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::load_from_str(&text)?;
        tracing::debug!(
            target = "shade.config",
            path = %path.display(),
            relocators = config.relocate.len(),
            transformers = config.transform.len(),
            "loaded config"
        );
        Ok(config)
    }
}

/// Resolves `path` against `base` unless it is already absolute.
pub(crate) fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
