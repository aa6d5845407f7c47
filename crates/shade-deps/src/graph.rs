use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Identity of a node inside one [`DependencyGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Module coordinates, `group:name:version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinates {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl Coordinates {
    pub fn new(group: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    /// Parses exactly `group:name:version`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split(':');
        let (group, name, version) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() || name.is_empty() {
            return None;
        }
        Some(Self::new(group, name, version))
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

#[derive(Debug, Clone)]
pub struct DependencyNode {
    id: NodeId,
    coordinates: Coordinates,
    artifacts: Vec<PathBuf>,
    children: Vec<NodeId>,
    parents: Vec<NodeId>,
}

impl DependencyNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn coordinates(&self) -> &Coordinates {
        &self.coordinates
    }

    /// Files (jars or class directories) this module contributes.
    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }
}

/// A resolved dependency graph. Cycles are allowed.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<DependencyNode>,
    roots: Vec<NodeId>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, coordinates: Coordinates, artifacts: Vec<PathBuf>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(DependencyNode {
            id,
            coordinates,
            artifacts,
            children: Vec::new(),
            parents: Vec::new(),
        });
        id
    }

    /// Marks `id` as a first-level (directly declared) dependency.
    pub fn add_root(&mut self, id: NodeId) {
        if !self.roots.contains(&id) {
            self.roots.push(id);
        }
    }

    pub fn add_edge(&mut self, parent: NodeId, child: NodeId) {
        if !self.nodes[parent.0].children.contains(&child) {
            self.nodes[parent.0].children.push(child);
            self.nodes[child.0].parents.push(parent);
        }
    }

    /// Panics if `id` belongs to another graph.
    pub fn node(&self, id: NodeId) -> &DependencyNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&DependencyNode> {
        self.nodes.get(id.0)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn nodes(&self) -> impl Iterator<Item = &DependencyNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find(&self, coordinates: &Coordinates) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|node| node.coordinates == *coordinates)
            .map(|node| node.id)
    }

    /// Every artifact in node order, each listed once.
    pub fn artifacts(&self) -> Vec<PathBuf> {
        let mut seen = BTreeSet::new();
        self.nodes
            .iter()
            .flat_map(|node| node.artifacts.iter())
            .filter(|path| seen.insert((*path).clone()))
            .cloned()
            .collect()
    }

    /// Nodes reachable from the roots, following children.
    pub fn reachable(&self) -> BTreeSet<NodeId> {
        let mut visited = BTreeSet::new();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if visited.insert(id) {
                stack.extend(self.nodes[id.0].children.iter().rev().copied());
            }
        }
        visited
    }
}
