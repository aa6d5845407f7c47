use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use shade::{dependency_sources, find_unused_classes, merge, Minimization, ShadeConfig};
use shade_archive::ArchiveSource;
use shade_deps::{Coordinates, DependencyGraph, DependencySpec, FilterSpec};
use shade_test_utils::{read_jar, write_tree, ClassBuilder, JarBuilder};

struct Project {
    _dir: tempfile::TempDir,
    output: std::path::PathBuf,
    classes: std::path::PathBuf,
    graph: DependencyGraph,
}

/// Project `app/Main` uses `a/Used` from a compile dependency; the runtime
/// dependency `b` is never referenced.
fn project() -> Project {
    let dir = tempfile::tempdir().unwrap();
    let main = ClassBuilder::new("app/Main").calls("run", "a/Used").to_bytes();
    let classes = write_tree(&dir.path().join("classes"), &[("app/Main.class", main.as_slice())]);

    let a_jar = JarBuilder::new()
        .class(&ClassBuilder::new("a/Used").calls("run", "a/Helper"))
        .class(&ClassBuilder::new("a/Helper"))
        .file("a/resource.txt", "kept")
        .write(&dir.path().join("a-1.0.jar"));
    let b_jar = JarBuilder::new()
        .class(&ClassBuilder::new("b/Runtime"))
        .class(&ClassBuilder::new("b/Other").calls("run", "b/Runtime"))
        .write(&dir.path().join("b-1.0.jar"));

    let mut graph = DependencyGraph::new();
    let a = graph.add_node(Coordinates::new("org", "a", "1.0"), vec![a_jar]);
    let b = graph.add_node(Coordinates::new("org", "b", "1.0"), vec![b_jar]);
    graph.add_root(a);
    graph.add_root(b);

    Project {
        output: dir.path().join("out.jar"),
        classes,
        _dir: dir,
        graph,
    }
}

fn minimized_names(project: &Project, minimization: &Minimization) -> Vec<String> {
    let sources = dependency_sources(&[project.classes.clone()], &project.graph, &FilterSpec::new());
    let (own, dependencies) = sources.split_at(1);
    let unused = find_unused_classes(own, dependencies, &project.graph, minimization).unwrap();

    let report = merge(&sources, ShadeConfig::new(&project.output).with_unused_classes(unused.clone())).unwrap();
    assert_eq!(report.unused_classes.iter().cloned().collect::<BTreeSet<_>>(), unused);

    read_jar(&project.output)
        .into_iter()
        .map(|entry| entry.name)
        .filter(|name| !name.ends_with('/'))
        .collect()
}

#[test]
fn unreferenced_dependency_classes_are_dropped() {
    let project = project();
    assert_eq!(
        minimized_names(&project, &Minimization::default()),
        vec!["app/Main.class", "a/Used.class", "a/Helper.class", "a/resource.txt"]
    );
}

#[test]
fn dependencies_excluded_from_minimization_stay_whole() {
    let project = project();
    let minimization = Minimization {
        filter: FilterSpec::new().exclude_notation("org:b").unwrap(),
        ..Minimization::default()
    };
    assert_eq!(
        minimized_names(&project, &minimization),
        vec![
            "app/Main.class",
            "a/Used.class",
            "a/Helper.class",
            "a/resource.txt",
            "b/Runtime.class",
            "b/Other.class",
        ]
    );
}

#[test]
fn api_dependencies_are_roots() {
    let project = project();
    let minimization = Minimization {
        api: vec![DependencySpec::parse("org:b").unwrap()],
        ..Minimization::default()
    };
    let names = minimized_names(&project, &minimization);
    assert!(names.contains(&"b/Other.class".to_string()));
    assert!(names.contains(&"b/Runtime.class".to_string()));
}

#[test]
fn project_sources_alone_have_nothing_unused() {
    let project = project();
    let unused = find_unused_classes(
        &[ArchiveSource::Directory(project.classes.clone())],
        &[],
        &project.graph,
        &Minimization::default(),
    )
    .unwrap();
    assert!(unused.is_empty());
}
