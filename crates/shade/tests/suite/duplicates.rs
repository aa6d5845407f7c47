use pretty_assertions::assert_eq;
use shade::{merge, DuplicatesStrategy, ShadeConfig, ShadeError};
use shade_archive::ArchiveSource;
use shade_test_utils::{read_jar, JarBuilder};
use shade_transform::sha256_hex;

fn two_jars(dir: &std::path::Path, first: &str, second: &str) -> Vec<ArchiveSource> {
    vec![
        ArchiveSource::Archive(JarBuilder::new().file("dup", first).write(&dir.join("one.jar"))),
        ArchiveSource::Archive(JarBuilder::new().file("dup", second).write(&dir.join("two.jar"))),
    ]
}

fn dup_entries(output: &std::path::Path) -> Vec<String> {
    read_jar(output)
        .into_iter()
        .filter(|entry| entry.name == "dup")
        .map(|entry| entry.text())
        .collect()
}

#[test]
fn identical_duplicates_are_written_once_under_fail() {
    let dir = tempfile::tempdir().unwrap();
    let sources = two_jars(dir.path(), "same", "same");
    let output = dir.path().join("out.jar");

    let report = merge(
        &sources,
        ShadeConfig::new(&output).with_duplicates(DuplicatesStrategy::Fail),
    )
    .unwrap();

    assert_eq!(dup_entries(&output), vec!["same"]);
    assert_eq!(report.duplicates.excluded, 1);
}

#[test]
fn differing_duplicates_fail_with_every_hash() {
    let dir = tempfile::tempdir().unwrap();
    let mut sources = two_jars(dir.path(), "one", "two");
    sources.push(ArchiveSource::Archive(
        JarBuilder::new()
            .file("other", "x")
            .file("more", "1")
            .write(&dir.path().join("three.jar")),
    ));
    sources.push(ArchiveSource::Archive(
        JarBuilder::new().file("more", "2").write(&dir.path().join("four.jar")),
    ));
    let output = dir.path().join("out.jar");

    let err = merge(
        &sources,
        ShadeConfig::new(&output).with_duplicates(DuplicatesStrategy::Fail),
    )
    .unwrap_err();

    let ShadeError::DuplicateEntries(violations) = &err else {
        panic!("unexpected error: {err}");
    };
    let paths: Vec<&str> = violations.iter().map(|v| v.path.as_str()).collect();
    assert_eq!(paths, vec!["dup", "more"]);

    let message = err.to_string();
    assert!(message.contains(&sha256_hex(b"one")), "{message}");
    assert!(message.contains(&sha256_hex(b"two")), "{message}");
    assert!(message.contains("one.jar") && message.contains("two.jar"), "{message}");
    assert!(!output.exists());
}

#[test]
fn strategies_decide_the_second_copy() {
    let dir = tempfile::tempdir().unwrap();
    let sources = two_jars(dir.path(), "first", "second");

    let cases = [
        (DuplicatesStrategy::Include, vec!["first", "second"]),
        (DuplicatesStrategy::Exclude, vec!["first"]),
        (DuplicatesStrategy::Warn, vec!["first"]),
    ];
    for (strategy, expected) in cases {
        let output = dir.path().join(format!("{strategy:?}.jar"));
        let report = merge(&sources, ShadeConfig::new(&output).with_duplicates(strategy)).unwrap();
        assert_eq!(dup_entries(&output), expected, "{strategy:?}");
        assert_eq!(report.duplicates.total(), 1, "{strategy:?}");
    }
}

#[test]
fn fail_on_duplicate_entries_rejects_identical_copies() {
    let dir = tempfile::tempdir().unwrap();
    let sources = two_jars(dir.path(), "same", "same");
    let output = dir.path().join("out.jar");

    let err = merge(
        &sources,
        ShadeConfig::new(&output)
            .with_duplicates(DuplicatesStrategy::Include)
            .with_fail_on_duplicate_entries(true),
    )
    .unwrap_err();

    assert!(matches!(err, ShadeError::DuplicateEntries(ref v) if v.len() == 1), "{err}");
}
