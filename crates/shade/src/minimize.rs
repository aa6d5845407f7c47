use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use shade_archive::ArchiveSource;
use shade_deps::{
    DependencyFilter, DependencyGraph, DependencySpec, FilterMode, FilterSpec, UnusedClassTracker,
};

use crate::error::ShadeError;

/// Which dependencies take part in minimization.
#[derive(Debug, Clone, Default)]
pub struct Minimization {
    /// Dependencies excluded here (and, transitively, their own
    /// dependencies) are kept whole instead of being minimized.
    pub filter: FilterSpec,
    /// Dependencies whose classes are always kept, like the project's own.
    pub api: Vec<DependencySpec>,
}

/// Merge sources in order: the project's output, then every dependency
/// artifact the filter retains.
pub fn dependency_sources(
    project: &[PathBuf],
    graph: &DependencyGraph,
    filter: &FilterSpec,
) -> Vec<ArchiveSource> {
    let resolution = DependencyFilter::new(FilterMode::Default, filter.clone()).resolve(graph);
    project
        .iter()
        .cloned()
        .chain(resolution.retained_artifacts(graph))
        .map(ArchiveSource::detect)
        .collect()
}

fn api_artifacts(graph: &DependencyGraph, api: &[DependencySpec]) -> BTreeSet<PathBuf> {
    graph
        .nodes()
        .filter(|node| api.iter().any(|spec| spec.matches(node)))
        .flat_map(|node| node.artifacts().iter().cloned())
        .collect()
}

/// Classes of `dependencies` that nothing in `project` reaches.
///
/// Project classes, api dependencies and dependencies kept out of
/// minimization seed the reference closure. Everything else is a candidate
/// and is reported when unreachable.
pub fn find_unused_classes(
    project: &[ArchiveSource],
    dependencies: &[ArchiveSource],
    graph: &DependencyGraph,
    minimization: &Minimization,
) -> Result<BTreeSet<String>, ShadeError> {
    let resolution =
        DependencyFilter::new(FilterMode::Minimize, minimization.filter.clone()).resolve(graph);
    let minimizable: BTreeSet<PathBuf> = resolution.retained_artifacts(graph).into_iter().collect();
    let api = api_artifacts(graph, &minimization.api);
    let is_candidate = |path: &Path| minimizable.contains(path) && !api.contains(path);

    let mut tracker = UnusedClassTracker::new();
    for source in project {
        tracker.add_root(source)?;
    }
    for source in dependencies {
        if is_candidate(source.path()) {
            tracker.add_candidate(source)?;
        } else {
            tracker.add_root(source)?;
        }
    }

    let unused = tracker.find_unused();
    tracing::info!(
        target = "shade",
        classes = tracker.len(),
        unused = unused.len(),
        "computed unused classes"
    );
    Ok(unused)
}
