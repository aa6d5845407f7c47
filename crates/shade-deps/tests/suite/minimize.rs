use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use shade_archive::ArchiveSource;
use shade_deps::{
    Coordinates, DependencyFilter, DependencyGraph, FilterMode, FilterSpec, UnusedClassTracker,
};
use shade_test_utils::{write_tree, ClassBuilder, JarBuilder};

#[test]
fn unreferenced_runtime_dependency_is_unused() {
    let dir = tempfile::tempdir().unwrap();

    let main = ClassBuilder::new("app/Main").calls("run", "a/Used").to_bytes();
    let project = write_tree(
        &dir.path().join("classes"),
        &[("app/Main.class", main.as_slice())],
    );

    let a_jar = JarBuilder::new()
        .class(&ClassBuilder::new("a/Used").calls("run", "a/Helper"))
        .class(&ClassBuilder::new("a/Helper"))
        .class(&ClassBuilder::new("a/Spare"))
        .file("a/readme.txt", "not a class")
        .write(&dir.path().join("a-1.0.jar"));
    let b_jar = JarBuilder::new()
        .class(&ClassBuilder::new("b/Runtime"))
        .write(&dir.path().join("b-1.0.jar"));

    let mut graph = DependencyGraph::new();
    let a = graph.add_node(Coordinates::new("org", "a", "1.0"), vec![a_jar.clone()]);
    let b = graph.add_node(Coordinates::new("org", "b", "1.0"), vec![b_jar.clone()]);
    graph.add_root(a);
    graph.add_root(b);

    let resolution = DependencyFilter::new(FilterMode::Minimize, FilterSpec::new()).resolve(&graph);
    assert!(resolution.excluded.is_empty());

    let mut tracker = UnusedClassTracker::new();
    assert_eq!(tracker.add_root(&ArchiveSource::Directory(project)).unwrap(), 1);
    for artifact in resolution.retained_artifacts(&graph) {
        tracker.add_candidate(&ArchiveSource::detect(artifact)).unwrap();
    }

    assert_eq!(
        tracker.find_unused(),
        BTreeSet::from(["a/Spare".to_string(), "b/Runtime".to_string()])
    );
}

#[test]
fn retained_jars_keep_what_they_reference() {
    let dir = tempfile::tempdir().unwrap();
    let api_jar = JarBuilder::new()
        .class(&ClassBuilder::new("api/Facade").calls("run", "impl/Engine"))
        .write(&dir.path().join("api.jar"));
    let impl_jar = JarBuilder::new()
        .class(&ClassBuilder::new("impl/Engine"))
        .class(&ClassBuilder::new("impl/Unused"))
        .write(&dir.path().join("impl.jar"));

    let mut tracker = UnusedClassTracker::new();
    tracker.add_root(&ArchiveSource::Archive(api_jar)).unwrap();
    tracker.add_candidate(&ArchiveSource::Archive(impl_jar)).unwrap();

    assert_eq!(tracker.find_unused(), BTreeSet::from(["impl/Unused".to_string()]));
}

#[test]
fn corrupt_class_names_its_source() {
    let dir = tempfile::tempdir().unwrap();
    let jar = JarBuilder::new()
        .file("x/Broken.class", b"\xCA\xFE\xBA\xBE")
        .write(&dir.path().join("broken.jar"));

    let err = UnusedClassTracker::new()
        .add_candidate(&ArchiveSource::Archive(jar))
        .unwrap_err();
    assert!(err.to_string().contains("x/Broken.class"), "{err}");
}
