use std::fs;

use pretty_assertions::assert_eq;
use shade_archive::{
    reproducible_timestamp, ArchiveSource, ArchiveWriter, DateTime, EntryMetadata, OpenSource,
    OutputOptions,
};

fn reproducible() -> OutputOptions {
    OutputOptions {
        reproducible: true,
        ..OutputOptions::default()
    }
}

fn list(path: &std::path::Path) -> Vec<String> {
    let open = OpenSource::open(&ArchiveSource::Archive(path.to_path_buf())).unwrap();
    open.entries()
        .iter()
        .map(|e| {
            if e.is_directory() {
                format!("{}/", e.path)
            } else {
                e.path.clone()
            }
        })
        .collect()
}

#[test]
fn parent_directories_are_written_once_before_files() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.jar");
    let meta = EntryMetadata::default();

    let mut writer = ArchiveWriter::create(&target, OutputOptions::default()).unwrap();
    writer.write_file("org/foo/A.class", b"a", &meta).unwrap();
    writer.write_file("org/foo/B.class", b"b", &meta).unwrap();
    writer.ensure_directory("org/bar", &meta).unwrap();
    writer.finish().unwrap();

    assert_eq!(
        list(&target),
        vec!["org/", "org/foo/", "org/foo/A.class", "org/foo/B.class", "org/bar/"]
    );
}

#[test]
fn reproducible_output_uses_a_fixed_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.jar");
    let meta = EntryMetadata {
        last_modified: DateTime::from_date_and_time(2020, 5, 6, 7, 8, 10).ok(),
        unix_mode: Some(0o600),
    };

    let mut writer = ArchiveWriter::create(&target, reproducible()).unwrap();
    writer.write_file("a.txt", b"a", &meta).unwrap();
    writer.finish().unwrap();

    let open = OpenSource::open(&ArchiveSource::Archive(target)).unwrap();
    let entry = &open.entries()[0];
    let fixed = reproducible_timestamp();
    let stamp = entry.last_modified.unwrap();
    assert_eq!(
        (stamp.year(), stamp.month(), stamp.day()),
        (fixed.year(), fixed.month(), fixed.day())
    );
    assert_eq!(entry.unix_mode.map(|m| m & 0o777), Some(0o644));
}

#[test]
fn source_timestamps_are_kept_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.jar");
    let meta = EntryMetadata {
        last_modified: DateTime::from_date_and_time(2020, 5, 6, 7, 8, 10).ok(),
        unix_mode: Some(0o600),
    };

    let mut writer = ArchiveWriter::create(&target, OutputOptions::default()).unwrap();
    writer.write_file("a.txt", b"a", &meta).unwrap();
    writer.finish().unwrap();

    let open = OpenSource::open(&ArchiveSource::Archive(target)).unwrap();
    let stamp = open.entries()[0].last_modified.unwrap();
    assert_eq!(
        (stamp.year(), stamp.month(), stamp.day(), stamp.hour(), stamp.minute()),
        (2020, 5, 6, 7, 8)
    );
    assert_eq!(open.entries()[0].unix_mode.map(|m| m & 0o777), Some(0o600));
}

#[test]
fn identical_inputs_produce_identical_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let write = |name: &str| {
        let target = dir.path().join(name);
        let mut writer = ArchiveWriter::create(&target, reproducible()).unwrap();
        writer
            .write_file("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\r\n\r\n", &EntryMetadata::default())
            .unwrap();
        writer.finish().unwrap();
        fs::read(target).unwrap()
    };
    assert_eq!(write("one.jar"), write("two.jar"));
}

#[test]
fn dropping_the_writer_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.jar");
    {
        let mut writer = ArchiveWriter::create(&target, OutputOptions::default()).unwrap();
        writer.write_file("a.txt", b"a", &EntryMetadata::default()).unwrap();
    }
    assert!(!target.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn duplicate_paths_are_written_as_separate_entries() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.jar");
    let mut writer = ArchiveWriter::create(&target, OutputOptions::default()).unwrap();
    writer.write_file("dup.txt", b"one", &EntryMetadata::default()).unwrap();
    writer.write_file("dup.txt", b"two", &EntryMetadata::default()).unwrap();
    assert_eq!(writer.entry_count(), 2);
    writer.finish().unwrap();
    assert!(fs::metadata(&target).unwrap().len() > 0);
}
