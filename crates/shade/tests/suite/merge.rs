use pretty_assertions::assert_eq;
use shade::{merge, CancellationFlag, ShadeConfig, ShadeError};
use shade_archive::ArchiveSource;
use shade_classfile::ClassFile;
use shade_relocation::SimpleRelocator;
use shade_test_utils::{read_jar, write_tree, ClassBuilder, JarBuilder};

fn names(output: &std::path::Path) -> Vec<String> {
    read_jar(output).into_iter().map(|entry| entry.name).collect()
}

#[test]
fn project_output_then_dependencies_with_synthesized_directories() {
    let dir = tempfile::tempdir().unwrap();
    let project = write_tree(
        &dir.path().join("classes"),
        &[("app/config.txt", b"project".as_slice())],
    );
    let dep = JarBuilder::new()
        .dir("lib")
        .file("lib/util/data.txt", "dependency")
        .write(&dir.path().join("dep.jar"));

    let output = dir.path().join("out/app-all.jar");
    let report = merge(
        &[ArchiveSource::Directory(project), ArchiveSource::Archive(dep)],
        ShadeConfig::new(&output),
    )
    .unwrap();

    assert_eq!(
        names(&output),
        vec!["app/", "app/config.txt", "lib/", "lib/util/", "lib/util/data.txt"]
    );
    assert_eq!(report.sources, 2);
    assert_eq!(report.jars, 1);
    assert_eq!(report.entries_written, 5);
    assert_eq!(report.output, output);
}

#[test]
fn default_excludes_apply_to_every_source() {
    let dir = tempfile::tempdir().unwrap();
    let dep = JarBuilder::new()
        .file("META-INF/a.SF", "signature")
        .file("META-INF/INDEX.LIST", "index")
        .file("module-info.class", "module")
        .file("META-INF/versions/9/module-info.class", "module")
        .file("kept.txt", "kept")
        .write(&dir.path().join("signed.jar"));

    let output = dir.path().join("out.jar");
    let report = merge(&[ArchiveSource::Archive(dep)], ShadeConfig::new(&output)).unwrap();

    assert_eq!(names(&output), vec!["kept.txt"]);
    assert_eq!(report.filtered_entries, 4);
}

#[test]
fn user_patterns_narrow_the_output() {
    let dir = tempfile::tempdir().unwrap();
    let dep = JarBuilder::new()
        .file("a/keep.txt", "a")
        .file("a/skip.bin", "b")
        .file("b/other.txt", "c")
        .write(&dir.path().join("dep.jar"));

    let output = dir.path().join("out.jar");
    let config = ShadeConfig::new(&output)
        .with_include("a/**")
        .unwrap()
        .with_exclude("**/*.bin")
        .unwrap();
    merge(&[ArchiveSource::Archive(dep)], config).unwrap();

    assert_eq!(names(&output), vec!["a/", "a/keep.txt"]);
}

#[test]
fn relocated_class_path_agrees_with_its_name() {
    let dir = tempfile::tempdir().unwrap();
    let dep = JarBuilder::new()
        .class(&ClassBuilder::new("org/lib/Api").string_constant("name", "org.lib.Impl"))
        .class(&ClassBuilder::new("app/Main").calls("run", "org/lib/Api"))
        .file("META-INF/versions/11/org/lib/Api.class", ClassBuilder::new("org/lib/Api").to_bytes())
        .file("org/lib/messages.properties", "greeting=hi")
        .write(&dir.path().join("lib.jar"));

    let output = dir.path().join("out.jar");
    let config = ShadeConfig::new(&output)
        .with_relocator(SimpleRelocator::new("org.lib", Some("shaded.lib")));
    let report = merge(&[ArchiveSource::Archive(dep)], config).unwrap();

    let entries = read_jar(&output);
    let find = |name: &str| {
        entries
            .iter()
            .find(|entry| entry.name == name)
            .unwrap_or_else(|| panic!("missing {name}"))
    };

    let api = ClassFile::parse(&find("shaded/lib/Api.class").contents).unwrap();
    assert_eq!(api.this_class, "shaded/lib/Api");
    let versioned = ClassFile::parse(&find("META-INF/versions/11/shaded/lib/Api.class").contents).unwrap();
    assert_eq!(versioned.this_class, "shaded/lib/Api");

    let main = ClassFile::parse(&find("app/Main.class").contents).unwrap();
    assert!(main.referenced_classes().contains("shaded/lib/Api"));
    assert!(!main.referenced_classes().contains("org/lib/Api"));

    assert_eq!(find("shaded/lib/messages.properties").text(), "greeting=hi");
    assert!(entries.iter().all(|entry| !entry.name.starts_with("org/")));
    assert_eq!(report.classes_relocated, 3);
}

#[test]
fn malformed_archive_names_the_source_and_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.jar");
    std::fs::write(&broken, b"not a zip").unwrap();

    let output = dir.path().join("out.jar");
    let err = merge(&[ArchiveSource::Archive(broken.clone())], ShadeConfig::new(&output)).unwrap_err();

    match &err {
        ShadeError::MalformedArchive { source_path, .. } => assert_eq!(source_path, &broken),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("broken.jar"), "{err}");
    assert!(!output.exists());
    let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(leftovers.len(), 1, "staged output was not discarded");
}

#[test]
fn cancelled_merge_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let dep = JarBuilder::new()
        .file("a.txt", "a")
        .write(&dir.path().join("dep.jar"));

    let flag = CancellationFlag::new();
    flag.cancel();
    let output = dir.path().join("out.jar");
    let err = merge(
        &[ArchiveSource::Archive(dep)],
        ShadeConfig::new(&output).with_cancellation(flag),
    )
    .unwrap_err();

    assert!(matches!(err, ShadeError::Cancelled));
    assert!(!output.exists());
}

#[test]
fn reproducible_output_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let project = write_tree(
        &dir.path().join("classes"),
        &[("a/one.txt", b"1".as_slice()), ("b/two.txt", b"2".as_slice())],
    );

    let first = dir.path().join("first.jar");
    let second = dir.path().join("second.jar");
    merge(
        &[ArchiveSource::Directory(project.clone())],
        ShadeConfig::new(&first).with_reproducible(true),
    )
    .unwrap();
    merge(
        &[ArchiveSource::Directory(project)],
        ShadeConfig::new(&second).with_reproducible(true),
    )
    .unwrap();

    assert_eq!(std::fs::read(first).unwrap(), std::fs::read(second).unwrap());
}
