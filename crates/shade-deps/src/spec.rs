use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::DependencyError;
use crate::graph::DependencyNode;

type NodePredicate = dyn Fn(&DependencyNode) -> bool + Send + Sync;

/// A predicate over dependency nodes.
#[derive(Clone)]
pub enum DependencySpec {
    /// `group:name:version` where every part is a full-match regular
    /// expression. Group and version are optional.
    Notation {
        notation: String,
        group: Option<Regex>,
        name: Regex,
        version: Option<Regex>,
    },
    Predicate(Arc<NodePredicate>),
}

fn full_match(pattern: &str) -> Result<Regex, DependencyError> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|source| DependencyError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}

impl DependencySpec {
    /// Parses `name`, `group:name` or `group:name:version`.
    pub fn parse(notation: &str) -> Result<Self, DependencyError> {
        let invalid = |message: &str| DependencyError::InvalidNotation {
            notation: notation.to_string(),
            message: message.to_string(),
        };

        let parts: Vec<&str> = notation.trim().split(':').collect();
        let (group, name, version) = match parts.as_slice() {
            [name] => (None, *name, None),
            [group, name] => (Some(*group), *name, None),
            [group, name, version] => (Some(*group), *name, Some(*version)),
            _ => return Err(invalid("expected `group:name:version`")),
        };
        if name.is_empty() {
            return Err(invalid("module name is empty"));
        }

        let optional = |part: Option<&str>| -> Result<Option<Regex>, DependencyError> {
            match part.filter(|p| !p.is_empty()) {
                Some(p) => full_match(p).map(Some),
                None => Ok(None),
            }
        };

        Ok(DependencySpec::Notation {
            notation: notation.trim().to_string(),
            group: optional(group)?,
            name: full_match(name)?,
            version: optional(version)?,
        })
    }

    pub fn from_fn(predicate: impl Fn(&DependencyNode) -> bool + Send + Sync + 'static) -> Self {
        DependencySpec::Predicate(Arc::new(predicate))
    }

    pub fn matches(&self, node: &DependencyNode) -> bool {
        match self {
            DependencySpec::Notation {
                group,
                name,
                version,
                ..
            } => {
                let coordinates = node.coordinates();
                group.as_ref().map_or(true, |g| g.is_match(&coordinates.group))
                    && name.is_match(&coordinates.name)
                    && version.as_ref().map_or(true, |v| v.is_match(&coordinates.version))
            }
            DependencySpec::Predicate(predicate) => predicate(node),
        }
    }
}

impl fmt::Debug for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencySpec::Notation { notation, .. } => {
                f.debug_tuple("Notation").field(notation).finish()
            }
            DependencySpec::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Coordinates, DependencyGraph};

    fn node(graph: &mut DependencyGraph, coordinates: &str) -> crate::NodeId {
        graph.add_node(Coordinates::parse(coordinates).unwrap(), vec![])
    }

    #[test]
    fn notation_parts_are_full_match_regexes() {
        let mut graph = DependencyGraph::new();
        let junit = node(&mut graph, "junit:junit:4.13.2");
        let guava = node(&mut graph, "com.google.guava:guava:33.0.0-jre");

        let spec = DependencySpec::parse("junit:junit:4\\..*").unwrap();
        assert!(spec.matches(graph.node(junit)));
        assert!(!spec.matches(graph.node(guava)));

        let by_group = DependencySpec::parse("com\\.google\\..*:.*").unwrap();
        assert!(by_group.matches(graph.node(guava)));

        let by_name = DependencySpec::parse("gua").unwrap();
        assert!(!by_name.matches(graph.node(guava)));
        assert!(DependencySpec::parse("guava").unwrap().matches(graph.node(guava)));
    }

    #[test]
    fn rejects_malformed_notations() {
        assert!(matches!(
            DependencySpec::parse("a:b:c:d"),
            Err(DependencyError::InvalidNotation { .. })
        ));
        assert!(matches!(
            DependencySpec::parse("group:"),
            Err(DependencyError::InvalidNotation { .. })
        ));
        assert!(matches!(
            DependencySpec::parse("g:(:1"),
            Err(DependencyError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn predicates_see_the_node() {
        let mut graph = DependencyGraph::new();
        let id = node(&mut graph, "org:lib:1");
        let spec = DependencySpec::from_fn(|node| node.coordinates().group == "org");
        assert!(spec.matches(graph.node(id)));
    }
}
