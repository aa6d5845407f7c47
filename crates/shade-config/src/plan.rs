use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use shade::{
    dependency_sources, find_unused_classes, merge, MergeReport, Minimization, ShadeConfig,
    ShadeError,
};
use shade_archive::{ArchiveSource, PatternSet};
use shade_deps::{Coordinates, DependencyGraph, FilterSpec};
use shade_relocation::SimpleRelocator;
use shade_transform::{
    ApacheLicenseResourceTransformer, ApacheNoticeResourceTransformer, AppendingTransformer,
    ComponentsXmlResourceTransformer, DeduplicatingResourceTransformer,
    DontIncludeResourceTransformer, GroovyExtensionModuleTransformer,
    IncludeResourceTransformer, ManifestAppenderTransformer, ManifestResourceTransformer,
    MergeLicenseResourceTransformer, PathMapping, PreserveFirstFoundResourceTransformer,
    PropertiesFileTransformer, ServiceFileTransformer, SpringFileTransformer, Transformer,
    XmlAppendingTransformer,
};

use crate::{resolve, ConfigError, ConfigFile, RelocateConfig, TransformConfig};

/// A validated configuration, ready to merge.
#[derive(Debug)]
pub struct Plan {
    pub config: ShadeConfig,
    /// Project outputs, merged first.
    pub project: Vec<PathBuf>,
    pub graph: DependencyGraph,
    /// Which dependencies are merged at all.
    pub dependencies: FilterSpec,
    /// Present when minimization is enabled.
    pub minimization: Option<Minimization>,
}

impl ConfigFile {
    /// Validates the file and builds its runtime form. Relative paths are
    /// resolved against `base_dir`.
    pub fn into_plan(self, base_dir: &Path) -> Result<Plan, ConfigError> {
        self.validate(base_dir)?;

        let mut problems = Vec::new();
        let mut config = ShadeConfig::new(resolve(base_dir, &self.output.path))
            .with_duplicates(self.output.duplicates.into())
            .with_zip64(self.output.zip64)
            .with_compression(self.output.compression.into())
            .with_reproducible(self.output.reproducible)
            .with_fail_on_duplicate_entries(self.output.fail_on_duplicate_entries);

        if !self.filter.keep_default_excludes {
            config.patterns = PatternSet::new();
        }
        for pattern in &self.filter.include {
            if let Err(err) = config.patterns.include(pattern) {
                problems.push(format!("filter.include: {err}"));
            }
        }
        for pattern in &self.filter.exclude {
            if let Err(err) = config.patterns.exclude(pattern) {
                problems.push(format!("filter.exclude: {err}"));
            }
        }

        for (idx, rule) in self.relocate.iter().enumerate() {
            match build_relocator(rule) {
                Ok(relocator) => config.relocators.push(relocator),
                Err(err) => problems.push(format!("relocate[{idx}]: {err}")),
            }
        }

        for (idx, transform) in self.transform.into_iter().enumerate() {
            match build_transformer(transform, base_dir) {
                Ok(transformer) => config.transformers.register(transformer),
                Err(err) => problems.push(format!("transform[{idx}]: {err}")),
            }
        }

        let graph = build_graph(&self.dependencies.artifacts, base_dir);
        let dependencies = filter_spec(&self.dependencies.include, &self.dependencies.exclude)
            .unwrap_or_else(|err| {
                problems.push(format!("dependencies: {err}"));
                FilterSpec::new()
            });

        let minimization = if self.minimize.enabled {
            let filter = filter_spec(&self.minimize.include, &self.minimize.exclude)
                .unwrap_or_else(|err| {
                    problems.push(format!("minimize: {err}"));
                    FilterSpec::new()
                });
            let mut api = Vec::new();
            for notation in &self.minimize.api {
                match shade_deps::DependencySpec::parse(notation) {
                    Ok(spec) => api.push(spec),
                    Err(err) => problems.push(format!("minimize.api: {err}")),
                }
            }
            Some(Minimization { filter, api })
        } else {
            None
        };

        if !problems.is_empty() {
            return Err(ConfigError::Invalid(problems));
        }

        Ok(Plan {
            config,
            project: self
                .project
                .inputs
                .iter()
                .map(|input| resolve(base_dir, input))
                .collect(),
            graph,
            dependencies,
            minimization,
        })
    }
}

fn build_relocator(rule: &RelocateConfig) -> Result<SimpleRelocator, shade_relocation::RelocationError> {
    let mut relocator = if rule.raw_string {
        SimpleRelocator::raw(&rule.pattern, rule.destination.as_deref().unwrap_or_default())?
    } else {
        SimpleRelocator::new(&rule.pattern, rule.destination.as_deref())
    };
    for pattern in &rule.include {
        relocator = relocator.include(pattern)?;
    }
    for pattern in &rule.exclude {
        relocator = relocator.exclude(pattern)?;
    }
    Ok(relocator)
}

fn build_transformer(
    config: TransformConfig,
    base_dir: &Path,
) -> Result<Box<dyn Transformer>, shade_transform::TransformError> {
    let transformer: Box<dyn Transformer> = match config {
        TransformConfig::ServiceFile {
            path,
            include,
            exclude,
        } => {
            let mut transformer = match path {
                Some(root) => ServiceFileTransformer::with_path(&root)?,
                None => ServiceFileTransformer::new(),
            };
            for pattern in &include {
                transformer = transformer.include(pattern)?;
            }
            for pattern in &exclude {
                transformer = transformer.exclude(pattern)?;
            }
            Box::new(transformer)
        }
        TransformConfig::Properties {
            paths,
            mappings,
            merge_strategy,
            merge_separator,
            charset,
        } => {
            let mut transformer = PropertiesFileTransformer::new()
                .merge_strategy(merge_strategy.into())
                .merge_separator(merge_separator)
                .encoding(charset.into());
            for path in &paths {
                transformer = transformer.path(path)?;
            }
            for (path, mapping) in mappings {
                transformer = transformer.mapping(
                    &path,
                    PathMapping {
                        merge_strategy: mapping.merge_strategy.map(Into::into),
                        merge_separator: mapping.merge_separator,
                    },
                )?;
            }
            Box::new(transformer)
        }
        TransformConfig::Manifest {
            main_class,
            attributes,
        } => {
            let mut transformer = ManifestResourceTransformer::new();
            if let Some(main_class) = main_class {
                transformer = transformer.main_class(main_class);
            }
            for (name, value) in attributes {
                transformer = transformer.attribute(name, value);
            }
            Box::new(transformer)
        }
        TransformConfig::ManifestAppender { attributes } => Box::new(
            attributes
                .into_iter()
                .fold(ManifestAppenderTransformer::new(), |t, attr| {
                    t.append(attr.name, attr.value)
                }),
        ),
        TransformConfig::XmlAppending { resource } => Box::new(XmlAppendingTransformer::new(resource)),
        TransformConfig::MergeLicense {
            artifact_license,
            output_path,
            spdx_id,
            first_separator,
            separator,
            paths,
        } => {
            let mut transformer =
                MergeLicenseResourceTransformer::new(resolve(base_dir, &artifact_license));
            if let Some(path) = output_path {
                transformer = transformer.output_path(path);
            }
            if let Some(id) = spdx_id {
                transformer = transformer.spdx_id(Some(id));
            }
            if let Some(separator) = first_separator {
                transformer = transformer.first_separator(separator);
            }
            if let Some(separator) = separator {
                transformer = transformer.separator(separator);
            }
            if !paths.is_empty() {
                let mut patterns = PatternSet::new();
                for path in &paths {
                    patterns.include(path)?;
                }
                transformer = transformer.patterns(patterns);
            }
            Box::new(transformer)
        }
        TransformConfig::Deduplicating { include, exclude } => {
            let mut transformer = DeduplicatingResourceTransformer::new();
            for pattern in &include {
                transformer = transformer.include(pattern)?;
            }
            for pattern in &exclude {
                transformer = transformer.exclude(pattern)?;
            }
            Box::new(transformer)
        }
        TransformConfig::Appending { resource } => Box::new(AppendingTransformer::new(resource)),
        TransformConfig::DontInclude { resource } => {
            Box::new(DontIncludeResourceTransformer::new(resource))
        }
        TransformConfig::Include { file, resource } => Box::new(IncludeResourceTransformer::new(
            resolve(base_dir, &file),
            resource,
        )),
        TransformConfig::PreserveFirstFound { resources } => Box::new(
            resources
                .into_iter()
                .fold(PreserveFirstFoundResourceTransformer::new(), |t, r| t.resource(r)),
        ),
        TransformConfig::ApacheLicense => Box::new(ApacheLicenseResourceTransformer),
        TransformConfig::ApacheNotice {
            project_name,
            add_header,
            preamble1,
            preamble2,
            preamble3,
            organization_name,
            organization_url,
            inception_year,
            copyright,
            charset,
        } => {
            let mut transformer = ApacheNoticeResourceTransformer::new().copyright(copyright);
            if let Some(name) = project_name {
                transformer = transformer.project_name(name);
            }
            if let Some(add_header) = add_header {
                transformer = transformer.add_header(add_header);
            }
            if let Some(text) = preamble1 {
                transformer = transformer.preamble1(text);
            }
            if let Some(text) = preamble2 {
                transformer = transformer.preamble2(text);
            }
            if let Some(text) = preamble3 {
                transformer = transformer.preamble3(text);
            }
            if let Some(name) = organization_name {
                transformer = transformer.organization_name(name);
            }
            if let Some(url) = organization_url {
                transformer = transformer.organization_url(url);
            }
            if let Some(year) = inception_year {
                transformer = transformer.inception_year(year);
            }
            if let Some(charset) = charset {
                transformer = transformer.encoding(charset.into());
            }
            Box::new(transformer)
        }
        TransformConfig::ComponentsXml => Box::new(ComponentsXmlResourceTransformer::new()),
        TransformConfig::GroovyExtensionModule => Box::new(GroovyExtensionModuleTransformer::new()),
        TransformConfig::SpringFile { charset } => {
            Box::new(SpringFileTransformer::new().encoding(charset.into()))
        }
    };
    Ok(transformer)
}

fn filter_spec(include: &[String], exclude: &[String]) -> Result<FilterSpec, shade_deps::DependencyError> {
    let mut spec = FilterSpec::new();
    for notation in include {
        spec = spec.include_notation(notation)?;
    }
    for notation in exclude {
        spec = spec.exclude_notation(notation)?;
    }
    Ok(spec)
}

/// Nodes in declaration order; `direct` artifacts become roots. Validation
/// already rejected unknown or malformed coordinates.
fn build_graph(artifacts: &[crate::ArtifactConfig], base_dir: &Path) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    let mut ids = HashMap::new();
    for artifact in artifacts {
        let Some(coordinates) = Coordinates::parse(&artifact.coordinates) else {
            continue;
        };
        let files = artifact
            .files
            .iter()
            .map(|file| resolve(base_dir, file))
            .collect();
        let key = coordinates.to_string();
        let id = graph.add_node(coordinates, files);
        ids.insert(key, id);
        if artifact.direct {
            graph.add_root(id);
        }
    }
    for artifact in artifacts {
        let Some(&parent) = ids.get(&artifact.coordinates) else {
            continue;
        };
        for dep in &artifact.depends_on {
            if let Some(&child) = ids.get(dep) {
                graph.add_edge(parent, child);
            }
        }
    }
    graph
}

impl Plan {
    /// Merge inputs in order: project outputs, then retained dependency artifacts.
    pub fn sources(&self) -> Vec<ArchiveSource> {
        dependency_sources(&self.project, &self.graph, &self.dependencies)
    }

    /// Dependency classes minimization would drop; empty when it is disabled.
    pub fn unused_classes(&self) -> Result<BTreeSet<String>, ShadeError> {
        let Some(minimization) = &self.minimization else {
            return Ok(BTreeSet::new());
        };
        let sources = self.sources();
        let (project, dependencies) = sources.split_at(self.project.len().min(sources.len()));
        find_unused_classes(project, dependencies, &self.graph, minimization)
    }

    pub fn run(self) -> Result<MergeReport, ShadeError> {
        let unused = self.unused_classes()?;
        let sources = self.sources();
        merge(&sources, self.config.with_unused_classes(unused))
    }
}
