use std::path::Path;

use pretty_assertions::assert_eq;
use shade_config::{ConfigError, ConfigFile};
use shade_test_utils::{read_jar, write_tree, ClassBuilder, JarBuilder};

const CONFIG: &str = r#"
[project]
inputs = ["classes"]

[output]
path = "build/app-all.jar"

[[relocate]]
pattern = "org.lib"
destination = "shaded.lib"

[[transform]]
type = "service-file"

[minimize]
enabled = true

[dependencies]
exclude = ["org:log"]

[[dependencies.artifact]]
coordinates = "org:lib:1.0"
files = ["libs/lib-1.0.jar"]

[[dependencies.artifact]]
coordinates = "org:log:1.0"
files = ["libs/log-1.0.jar"]
"#;

fn write_project(root: &Path) {
    let main = ClassBuilder::new("app/Main").calls("run", "org/lib/Api").to_bytes();
    write_tree(
        &root.join("classes"),
        &[
            ("app/Main.class", main.as_slice()),
            ("META-INF/services/org.lib.Plugin", b"app.PluginImpl\n".as_slice()),
        ],
    );
    JarBuilder::new()
        .class(&ClassBuilder::new("org/lib/Api"))
        .class(&ClassBuilder::new("org/lib/Unused"))
        .file("META-INF/services/org.lib.Plugin", "org.lib.DefaultPlugin\n")
        .write(&root.join("libs/lib-1.0.jar"));
    JarBuilder::new()
        .class(&ClassBuilder::new("org/log/Logger"))
        .write(&root.join("libs/log-1.0.jar"));
}

#[test]
fn config_file_drives_a_full_merge() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());
    let path = dir.path().join("shade.toml");
    std::fs::write(&path, CONFIG).unwrap();

    let plan = ConfigFile::load_from_path(&path)
        .unwrap()
        .into_plan(dir.path())
        .unwrap();
    assert_eq!(plan.sources().len(), 2);
    assert_eq!(
        plan.unused_classes().unwrap().into_iter().collect::<Vec<_>>(),
        vec!["org/lib/Unused".to_string()]
    );

    let report = plan.run().unwrap();
    let output = dir.path().join("build/app-all.jar");
    assert_eq!(report.output, output);
    assert_eq!(report.unused_classes, vec!["org/lib/Unused".to_string()]);

    let entries = read_jar(&output);
    let files: Vec<&str> = entries
        .iter()
        .map(|e| e.name.as_str())
        .filter(|name| !name.ends_with('/'))
        .collect();
    assert_eq!(
        files,
        vec![
            "app/Main.class",
            "shaded/lib/Api.class",
            "META-INF/services/shaded.lib.Plugin",
        ]
    );
    let services = entries
        .iter()
        .find(|e| e.name == "META-INF/services/shaded.lib.Plugin")
        .unwrap();
    assert_eq!(services.text(), "app.PluginImpl\nshaded.lib.DefaultPlugin");
}

#[test]
fn invalid_files_do_not_produce_a_plan() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConfigFile::load_from_str(
        "[[relocate]]\npattern = \"\"\n\n[[transform]]\ntype = \"include\"\nfile = \"NOTICE\"\nresource = \"META-INF/NOTICE\"\n",
    )
    .unwrap();

    let err = config.into_plan(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert_eq!(err.problems().len(), 2, "{err}");
}

#[test]
fn missing_config_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConfigFile::load_from_path(dir.path().join("shade.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }), "{err}");
}
