use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

use crate::error::DependencyError;
use crate::graph::{DependencyGraph, DependencyNode, NodeId};
use crate::spec::DependencySpec;

/// Include and exclude predicates over dependency nodes.
///
/// A node is kept when no include is configured or any include matches, and
/// no exclude matches.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    includes: Vec<DependencySpec>,
    excludes: Vec<DependencySpec>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, spec: DependencySpec) -> Self {
        self.includes.push(spec);
        self
    }

    pub fn exclude(mut self, spec: DependencySpec) -> Self {
        self.excludes.push(spec);
        self
    }

    pub fn include_notation(self, notation: &str) -> Result<Self, DependencyError> {
        Ok(self.include(DependencySpec::parse(notation)?))
    }

    pub fn exclude_notation(self, notation: &str) -> Result<Self, DependencyError> {
        Ok(self.exclude(DependencySpec::parse(notation)?))
    }

    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }

    pub fn is_kept(&self, node: &DependencyNode) -> bool {
        let included = self.includes.is_empty() || self.includes.iter().any(|s| s.matches(node));
        included && !self.excludes.iter().any(|s| s.matches(node))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterMode {
    /// An excluded node's subtree is not visited; its children keep their
    /// artifacts unless excluded on their own.
    #[default]
    Default,
    /// Exclusion also covers every node reachable only through excluded
    /// nodes. Reachability through one kept parent keeps a node.
    Minimize,
}

/// Nodes the filter decided on. Nodes never visited are in neither set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub included: BTreeSet<NodeId>,
    pub excluded: BTreeSet<NodeId>,
}

impl Resolution {
    pub fn is_excluded(&self, id: NodeId) -> bool {
        self.excluded.contains(&id)
    }

    pub fn excluded_artifacts(&self, graph: &DependencyGraph) -> BTreeSet<PathBuf> {
        self.excluded
            .iter()
            .flat_map(|id| graph.node(*id).artifacts().iter().cloned())
            .collect()
    }

    /// All graph artifacts, in node order, minus those of excluded nodes.
    pub fn retained_artifacts(&self, graph: &DependencyGraph) -> Vec<PathBuf> {
        let excluded = self.excluded_artifacts(graph);
        graph
            .artifacts()
            .into_iter()
            .filter(|path| !excluded.contains(path))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DependencyFilter {
    mode: FilterMode,
    spec: FilterSpec,
}

impl DependencyFilter {
    pub fn new(mode: FilterMode, spec: FilterSpec) -> Self {
        Self { mode, spec }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn resolve(&self, graph: &DependencyGraph) -> Resolution {
        let mut resolution = Resolution::default();
        let mut visited = HashSet::new();
        let mut stack: Vec<NodeId> = graph.roots().iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let node = graph.node(id);
            if self.spec.is_kept(node) {
                resolution.included.insert(id);
                stack.extend(node.children().iter().rev().copied());
            } else {
                tracing::debug!(
                    target = "shade.deps",
                    dependency = %node.coordinates(),
                    "dependency excluded"
                );
                resolution.excluded.insert(id);
            }
        }

        if self.mode == FilterMode::Minimize {
            for id in graph.reachable() {
                if !resolution.included.contains(&id) && resolution.excluded.insert(id) {
                    tracing::debug!(
                        target = "shade.deps",
                        dependency = %graph.node(id).coordinates(),
                        "dependency excluded through its parents"
                    );
                }
            }
        }

        resolution
    }
}
