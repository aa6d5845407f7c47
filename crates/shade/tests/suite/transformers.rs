use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use shade::{dependency_sources, merge, ShadeConfig, ShadeError};
use shade_archive::ArchiveSource;
use shade_deps::{Coordinates, DependencyGraph, FilterSpec};
use shade_properties::{Encoding, Properties};
use shade_relocation::SimpleRelocator;
use shade_test_utils::{read_jar, write_tree, ClassBuilder, JarBuilder};
use shade_transform::{
    DontIncludeResourceTransformer, MergeStrategy, PropertiesFileTransformer, ResourceEntry,
    ServiceFileTransformer, TransformError, Transformer, TransformerContext,
    XmlAppendingTransformer,
};

fn text_of(output: &std::path::Path, name: &str) -> Option<String> {
    read_jar(output)
        .into_iter()
        .find(|entry| entry.name == name)
        .map(|entry| entry.text())
}

#[test]
fn properties_merge_per_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let sources = vec![
        ArchiveSource::Archive(
            JarBuilder::new()
                .file("app.properties", "key1=a\nkey2=one\n")
                .write(&dir.path().join("one.jar")),
        ),
        ArchiveSource::Archive(
            JarBuilder::new()
                .file("app.properties", "key2=two\n")
                .write(&dir.path().join("two.jar")),
        ),
    ];

    let cases = [
        (MergeStrategy::Append, "one,two"),
        (MergeStrategy::First, "one"),
        (MergeStrategy::Latest, "two"),
    ];
    for (strategy, expected) in cases {
        let output = dir.path().join(format!("{strategy:?}.jar"));
        let transformer = PropertiesFileTransformer::new().merge_strategy(strategy);
        let report = merge(&sources, ShadeConfig::new(&output).with_transformer(transformer)).unwrap();

        let merged = text_of(&output, "app.properties").unwrap();
        let merged = Properties::parse(merged.as_bytes(), Encoding::Iso8859_1);
        assert_eq!(merged.get("key2"), Some(expected), "{strategy:?}");
        assert_eq!(merged.get("key1"), Some("a"));
        assert_eq!(report.transformed_entries, 2);
    }
}

#[test]
fn service_files_are_concatenated_and_relocated() {
    let dir = tempfile::tempdir().unwrap();
    let path = "META-INF/services/org.lib.Plugin";
    let sources = vec![
        ArchiveSource::Archive(JarBuilder::new().file(path, "one").write(&dir.path().join("a.jar"))),
        ArchiveSource::Archive(JarBuilder::new().file(path, "two").write(&dir.path().join("b.jar"))),
        ArchiveSource::Archive(
            JarBuilder::new()
                .file(path, "org.lib.Impl\n")
                .write(&dir.path().join("c.jar")),
        ),
    ];

    let plain = dir.path().join("plain.jar");
    merge(
        &sources[..2],
        ShadeConfig::new(&plain).with_transformer(ServiceFileTransformer::new()),
    )
    .unwrap();
    assert_eq!(text_of(&plain, path).as_deref(), Some("one\ntwo"));

    let relocated = dir.path().join("relocated.jar");
    merge(
        &sources,
        ShadeConfig::new(&relocated)
            .with_relocator(SimpleRelocator::new("org.lib", Some("shaded.lib")))
            .with_transformer(ServiceFileTransformer::new()),
    )
    .unwrap();
    assert_eq!(text_of(&relocated, path), None);
    assert_eq!(
        text_of(&relocated, "META-INF/services/shaded.lib.Plugin").as_deref(),
        Some("one\ntwo\nshaded.lib.Impl")
    );
}

#[test]
fn transformers_take_priority_over_class_relocation() {
    let dir = tempfile::tempdir().unwrap();
    let jar = JarBuilder::new()
        .class(&ClassBuilder::new("org/lib/Api"))
        .class(&ClassBuilder::new("org/lib/Keep"))
        .write(&dir.path().join("lib.jar"));

    let output = dir.path().join("out.jar");
    let report = merge(
        &[ArchiveSource::Archive(jar)],
        ShadeConfig::new(&output)
            .with_relocator(SimpleRelocator::new("org.lib", Some("shaded.lib")))
            .with_transformer(DontIncludeResourceTransformer::new("Api.class")),
    )
    .unwrap();

    let names: Vec<String> = read_jar(&output).into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["shaded/", "shaded/lib/", "shaded/lib/Keep.class"]);
    assert_eq!(report.transformed_entries, 1);
}

#[test]
fn transformer_failure_aborts_the_merge() {
    let dir = tempfile::tempdir().unwrap();
    let jar = JarBuilder::new()
        .file("META-INF/plexus/components.xml", "<component-set>")
        .write(&dir.path().join("lib.jar"));

    let output = dir.path().join("out.jar");
    let err = merge(
        &[ArchiveSource::Archive(jar)],
        ShadeConfig::new(&output)
            .with_transformer(XmlAppendingTransformer::new("META-INF/plexus/components.xml")),
    )
    .unwrap_err();

    match &err {
        ShadeError::Transform { transformer, path, .. } => {
            assert_eq!(transformer, "XmlAppendingTransformer");
            assert!(path.ends_with("lib.jar!/META-INF/plexus/components.xml"), "{path}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!output.exists());
}

/// Remembers the first contents offered for one path.
struct FirstSeen {
    path: &'static str,
    first: Arc<Mutex<Option<String>>>,
}

impl Transformer for FirstSeen {
    fn name(&self) -> &str {
        "FirstSeen"
    }

    fn can_transform_resource(&mut self, entry: &ResourceEntry<'_>) -> bool {
        entry.path == self.path
    }

    fn transform(&mut self, context: &TransformerContext<'_>) -> Result<(), TransformError> {
        let mut first = self.first.lock().unwrap();
        if first.is_none() {
            *first = Some(String::from_utf8_lossy(context.contents).into_owned());
        }
        Ok(())
    }
}

#[test]
fn project_resources_reach_transformers_before_dependencies() {
    let dir = tempfile::tempdir().unwrap();
    let dep = JarBuilder::new()
        .file("config/app.yml", "dependency")
        .write(&dir.path().join("dep-1.0.jar"));
    let project = write_tree(
        &dir.path().join("classes"),
        &[("config/app.yml", b"project".as_slice())],
    );

    let mut graph = DependencyGraph::new();
    let node = graph.add_node(Coordinates::new("org", "dep", "1.0"), vec![dep]);
    graph.add_root(node);
    let sources = dependency_sources(&[project], &graph, &FilterSpec::new());

    let first = Arc::new(Mutex::new(None));
    merge(
        &sources,
        ShadeConfig::new(dir.path().join("out.jar")).with_transformer(FirstSeen {
            path: "config/app.yml",
            first: Arc::clone(&first),
        }),
    )
    .unwrap();

    assert_eq!(first.lock().unwrap().as_deref(), Some("project"));
}
