use std::collections::BTreeSet;
use std::path::Path;

use shade_archive::PathPattern;
use shade_deps::{Coordinates, DependencySpec};

use crate::{resolve, ConfigError, ConfigFile, TransformConfig};

impl ConfigFile {
    /// Checks semantic invariants that deserialization cannot.
    ///
    /// Relative paths are resolved against `base_dir`. Every problem found
    /// is reported in one [`ConfigError::Invalid`].
    pub fn validate(&self, base_dir: &Path) -> Result<(), ConfigError> {
        let mut out = Vec::new();

        validate_filter(self, &mut out);
        validate_relocators(self, &mut out);
        validate_transformers(self, base_dir, &mut out);
        validate_dependencies(self, &mut out);

        if out.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(out))
        }
    }
}

fn check_patterns(section: &str, patterns: &[String], out: &mut Vec<String>) {
    for (idx, pattern) in patterns.iter().enumerate() {
        if let Err(err) = PathPattern::new(pattern) {
            out.push(format!("{section}[{idx}]: {err}"));
        }
    }
}

fn check_whole_match(section: &str, pattern: &str, out: &mut Vec<String>) {
    if let Err(err) = regex::Regex::new(&format!("^(?:{pattern})$")) {
        out.push(format!("{section}: invalid regular expression `{pattern}`: {err}"));
    }
}

fn check_notations(section: &str, notations: &[String], out: &mut Vec<String>) {
    for (idx, notation) in notations.iter().enumerate() {
        if let Err(err) = DependencySpec::parse(notation) {
            out.push(format!("{section}[{idx}]: {err}"));
        }
    }
}

fn validate_filter(config: &ConfigFile, out: &mut Vec<String>) {
    check_patterns("filter.include", &config.filter.include, out);
    check_patterns("filter.exclude", &config.filter.exclude, out);
}

fn validate_relocators(config: &ConfigFile, out: &mut Vec<String>) {
    for (idx, rule) in config.relocate.iter().enumerate() {
        let section = format!("relocate[{idx}]");
        if rule.pattern.trim().is_empty() {
            out.push(format!("{section}.pattern: must not be empty"));
        }
        if rule.raw_string {
            if rule.destination.is_none() {
                out.push(format!("{section}.destination: required for raw_string rules"));
            }
            if let Err(err) = regex::Regex::new(&rule.pattern) {
                out.push(format!("{section}.pattern: invalid regular expression: {err}"));
            }
        }
        check_patterns(&format!("{section}.include"), &rule.include, out);
        check_patterns(&format!("{section}.exclude"), &rule.exclude, out);
    }
}

fn validate_transformers(config: &ConfigFile, base_dir: &Path, out: &mut Vec<String>) {
    let mut singletons = BTreeSet::new();
    for (idx, transform) in config.transform.iter().enumerate() {
        let section = format!("transform[{idx}]");
        if transform.is_singleton() && !singletons.insert(transform.kind()) {
            out.push(format!(
                "{section}: `{}` may only be configured once",
                transform.kind()
            ));
        }

        match transform {
            TransformConfig::ServiceFile {
                include, exclude, ..
            }
            | TransformConfig::Deduplicating { include, exclude } => {
                check_patterns(&format!("{section}.include"), include, out);
                check_patterns(&format!("{section}.exclude"), exclude, out);
            }
            TransformConfig::Properties {
                paths, mappings, ..
            } => {
                for path in paths {
                    check_whole_match(&format!("{section}.paths"), path, out);
                }
                for path in mappings.keys() {
                    check_whole_match(&format!("{section}.mappings"), path, out);
                }
            }
            TransformConfig::MergeLicense {
                artifact_license,
                paths,
                ..
            } => {
                let license = resolve(base_dir, artifact_license);
                if !license.is_file() {
                    out.push(format!(
                        "{section}.artifact_license: {} does not exist",
                        license.display()
                    ));
                }
                check_patterns(&format!("{section}.paths"), paths, out);
            }
            TransformConfig::Include { file, .. } => {
                let file = resolve(base_dir, file);
                if !file.is_file() {
                    out.push(format!("{section}.file: {} does not exist", file.display()));
                }
            }
            TransformConfig::XmlAppending { resource }
            | TransformConfig::Appending { resource }
            | TransformConfig::DontInclude { resource } => {
                if resource.is_empty() {
                    out.push(format!("{section}.resource: must not be empty"));
                }
            }
            TransformConfig::ApacheNotice {
                inception_year: Some(year),
                ..
            } => {
                if year.is_empty() || !year.chars().all(|c| c.is_ascii_digit()) {
                    out.push(format!("{section}.inception_year: `{year}` is not a year"));
                }
            }
            _ => {}
        }
    }
}

fn validate_dependencies(config: &ConfigFile, out: &mut Vec<String>) {
    check_notations("dependencies.include", &config.dependencies.include, out);
    check_notations("dependencies.exclude", &config.dependencies.exclude, out);
    check_notations("minimize.include", &config.minimize.include, out);
    check_notations("minimize.exclude", &config.minimize.exclude, out);
    check_notations("minimize.api", &config.minimize.api, out);

    let mut known = BTreeSet::new();
    for (idx, artifact) in config.dependencies.artifacts.iter().enumerate() {
        match Coordinates::parse(&artifact.coordinates) {
            Some(coordinates) => {
                if !known.insert(coordinates.to_string()) {
                    out.push(format!(
                        "dependencies.artifact[{idx}].coordinates: `{coordinates}` is declared twice"
                    ));
                }
            }
            None => out.push(format!(
                "dependencies.artifact[{idx}].coordinates: expected `group:name:version`, got `{}`",
                artifact.coordinates
            )),
        }
    }
    for (idx, artifact) in config.dependencies.artifacts.iter().enumerate() {
        for dep in &artifact.depends_on {
            let resolved = Coordinates::parse(dep).map(|c| c.to_string());
            if !resolved.is_some_and(|c| known.contains(&c)) {
                out.push(format!(
                    "dependencies.artifact[{idx}].depends_on: unknown artifact `{dep}`"
                ));
            }
        }
    }
}
