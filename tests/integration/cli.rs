//! The `testprops` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use reactor_testprops::test_utils::ReactorFixture;
use reactor_testprops::testing::TestProperties;
use std::fs;

fn testprops(fixture: &ReactorFixture) -> Command {
    let mut cmd = Command::cargo_bin("testprops").unwrap();
    cmd.current_dir(fixture.path())
        .env_remove("TESTPROPS_WORKSPACE_RESOLVER")
        .env_remove("RUST_LOG");
    cmd
}

fn fixture() -> ReactorFixture {
    let fixture = ReactorFixture::new()
        .unwrap()
        .project("g:a:1.0", &["g:b"])
        .unwrap()
        .built_project("g:b:1.0", &[])
        .unwrap();
    fixture.write_manifest().unwrap();
    fixture
}

#[test]
fn test_generate_then_up_to_date() {
    let fixture = fixture();
    let output = fixture.project_dir("a").join("target/test-classes/test.properties");

    testprops(&fixture)
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("generated"));
    assert!(output.is_file());
    assert!(fixture.project_dir("a").join("target/workspacestate.properties").is_file());

    testprops(&fixture)
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));
}

#[test]
fn test_status_writes_nothing() {
    let fixture = fixture();

    testprops(&fixture)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("regeneration required"));
    assert!(!fixture.project_dir("a").join("target").exists());

    testprops(&fixture).arg("generate").assert().success();
    testprops(&fixture)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));
}

#[test]
fn test_project_and_property_options() {
    let fixture = fixture();
    fixture.custom_properties("b", "url=http://${host}/${project.artifactId}\n").unwrap();

    testprops(&fixture)
        .args(["generate", "--project", "g:b", "-D", "host=example.org"])
        .assert()
        .success();

    let output = fixture.project_dir("b").join("target/test-classes/test.properties");
    let props = TestProperties::load(&output).unwrap();
    assert_eq!(props.get("project.artifactId"), Some("b"));
    assert_eq!(props.get("url"), Some("http://example.org/b"));
    assert!(!fixture.project_dir("a").join("target").exists());
}

#[test]
fn test_project_with_other_version_fails() {
    let fixture = fixture();

    testprops(&fixture)
        .args(["generate", "--project", "g:b:9.9"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("g:b:1.0"));
    assert!(!fixture.project_dir("b").join("target/test-classes").exists());

    testprops(&fixture).args(["generate", "--project", "g:b:1.0"]).assert().success();
}

#[test]
fn test_output_option_relative_to_current_directory() {
    let fixture = fixture();

    testprops(&fixture)
        .args(["generate", "--output", "out/test.properties"])
        .assert()
        .success();

    assert!(fixture.path().join("out/test.properties").is_file());
}

#[test]
fn test_missing_manifest_fails() {
    let fixture = ReactorFixture::new().unwrap();

    testprops(&fixture)
        .arg("generate")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("reactor manifest"));
}

#[test]
fn test_malformed_custom_properties_fail_without_output() {
    let fixture = fixture();
    fixture.custom_properties("a", "broken=\\u12\n").unwrap();

    testprops(&fixture)
        .arg("generate")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Could not read properties file"));
    assert!(!fixture.project_dir("a").join("target/test-classes/test.properties").exists());
}

#[test]
fn test_verify_log() {
    let fixture = ReactorFixture::new().unwrap();
    let log = fixture.path().join("build.log");
    fs::write(&log, "[INFO] Building a 1.0\n[INFO] BUILD SUCCESS\n").unwrap();

    testprops(&fixture)
        .args(["verify-log", "--log", "build.log", "--error-free", "--contains", "BUILD SUCCESS"])
        .assert()
        .success()
        .stdout(predicate::str::contains("verified"));

    testprops(&fixture)
        .args(["verify-log", "--log", "build.log", "--contains", "BUILD FAILURE"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Log text not present: BUILD FAILURE"));

    fs::write(&log, "[ERROR] Failed to execute goal\n").unwrap();
    testprops(&fixture)
        .args(["verify-log", "--log", "build.log", "--error-free"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("[ERROR] Failed to execute goal"));
}

#[test]
fn test_verify_log_requires_a_check() {
    let fixture = ReactorFixture::new().unwrap();

    testprops(&fixture).args(["verify-log", "--log", "build.log"]).assert().failure().code(2);
}
