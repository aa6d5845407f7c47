use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use shade_test_utils::{read_jar, ClassBuilder, JarBuilder};

fn shade() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("shade"))
}

fn project(temp: &TempDir, extra: &str) -> assert_fs::fixture::ChildPath {
    let main = ClassBuilder::new("app/Main").calls("run", "org/lib/Api").to_bytes();
    temp.child("classes/app/Main.class").write_binary(&main).unwrap();
    JarBuilder::new()
        .class(&ClassBuilder::new("org/lib/Api"))
        .class(&ClassBuilder::new("org/lib/Unused"))
        .write(temp.child("libs/lib-1.0.jar").path());

    let config = temp.child("shade.toml");
    config
        .write_str(&format!(
            r#"
[project]
inputs = ["classes"]

[output]
path = "out/app-all.jar"

[logging]
stderr = false

[[relocate]]
pattern = "org.lib"
destination = "shaded.lib"

[[dependencies.artifact]]
coordinates = "org:lib:1.0"
files = ["libs/lib-1.0.jar"]
{extra}
"#
        ))
        .unwrap();
    config
}

#[test]
fn help_mentions_commands() {
    shade().arg("--help").assert().success().stdout(
        predicate::str::contains("merge")
            .and(predicate::str::contains("unused"))
            .and(predicate::str::contains("check-config")),
    );
}

#[test]
fn merge_writes_the_configured_jar() {
    let temp = TempDir::new().unwrap();
    let config = project(&temp, "");

    let output = shade()
        .args(["merge", "--json", "--config"])
        .arg(config.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["sources"], 2);
    assert_eq!(report["classes_relocated"], 3);

    let names: Vec<String> = read_jar(temp.child("out/app-all.jar").path())
        .into_iter()
        .map(|entry| entry.name)
        .collect();
    assert!(names.contains(&"shaded/lib/Api.class".to_string()), "{names:?}");
    assert!(names.contains(&"shaded/lib/Unused.class".to_string()), "{names:?}");
}

#[test]
fn merge_output_flag_overrides_config() {
    let temp = TempDir::new().unwrap();
    let config = project(&temp, "");
    let target = temp.child("elsewhere.jar");

    shade()
        .args(["merge", "--config"])
        .arg(config.path())
        .arg("--output")
        .arg(target.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("elsewhere.jar"));
    target.assert(predicate::path::exists());
    temp.child("out/app-all.jar").assert(predicate::path::missing());
}

#[test]
fn unused_lists_unreferenced_classes() {
    let temp = TempDir::new().unwrap();
    let config = project(&temp, "\n[minimize]\nenabled = true\n");

    shade()
        .args(["unused", "--config"])
        .arg(config.path())
        .assert()
        .success()
        .stdout("org/lib/Unused\n");
    temp.child("out/app-all.jar").assert(predicate::path::missing());
}

#[test]
fn check_config_reports_problems() {
    let temp = TempDir::new().unwrap();
    let config = temp.child("shade.toml");
    config
        .write_str("[[relocate]]\npattern = \"\"\n\n[[transform]]\ntype = \"apache-license\"\n\n[[transform]]\ntype = \"apache-license\"\n")
        .unwrap();

    shade()
        .args(["check-config", "--config"])
        .arg(config.path())
        .assert()
        .code(1)
        .stdout(
            predicate::str::contains("2 problem(s)")
                .and(predicate::str::contains("relocate[0].pattern"))
                .and(predicate::str::contains("`apache-license` may only be configured once")),
        );
}

#[test]
fn check_config_accepts_a_valid_file() {
    let temp = TempDir::new().unwrap();
    let config = project(&temp, "");

    shade()
        .args(["check-config", "--config"])
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::str::ends_with(": ok\n"));
}

#[test]
fn failures_exit_with_code_two() {
    let temp = TempDir::new().unwrap();

    shade()
        .args(["merge", "--config"])
        .arg(temp.child("missing.toml").path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to load"));

    let config = temp.child("shade.toml");
    config.write_str("[output]\nduplicates = \"sometimes\"\n").unwrap();
    shade()
        .args(["merge", "--config"])
        .arg(config.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("sometimes"));
}
