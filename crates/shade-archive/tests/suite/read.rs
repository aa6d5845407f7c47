use std::fs;

use pretty_assertions::assert_eq;
use shade_archive::{ArchiveSource, EntryKind, OpenSource};

#[test]
fn directory_sources_list_entries_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("org/foo")).unwrap();
    fs::write(dir.path().join("org/foo/B.class"), b"b").unwrap();
    fs::write(dir.path().join("org/foo/A.class"), b"a").unwrap();
    fs::write(dir.path().join("app.properties"), b"k=v").unwrap();

    let source = ArchiveSource::detect(dir.path());
    assert!(matches!(source, ArchiveSource::Directory(_)));
    let mut open = OpenSource::open(&source).unwrap();

    let listed: Vec<_> = open
        .entries()
        .iter()
        .map(|e| (e.path.as_str(), e.kind))
        .collect();
    assert_eq!(
        listed,
        vec![
            ("app.properties", EntryKind::File),
            ("org", EntryKind::Directory),
            ("org/foo", EntryKind::Directory),
            ("org/foo/A.class", EntryKind::File),
            ("org/foo/B.class", EntryKind::File),
        ]
    );
    assert_eq!(open.read(3).unwrap(), b"a");
}

#[test]
fn corrupt_archives_are_reported_with_their_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.jar");
    fs::write(&path, b"definitely not a zip").unwrap();

    let Err(err) = OpenSource::open(&ArchiveSource::Archive(path)) else {
        panic!("expected an error");
    };
    assert!(err.to_string().contains("broken.jar"), "{err}");
}
