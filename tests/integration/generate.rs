//! Contents of the generated files.

use reactor_testprops::generator::{Outcome, TestPropertiesGenerator};
use reactor_testprops::test_utils::{ReactorFixture, init_test_logging};
use reactor_testprops::testing::{TestDependencies, TestProperties};
use reactor_testprops::verifier::VerifierResult;
use reactor_testprops::workspace::{EntryKind, WorkspaceState};
use std::fs;
use std::path::Path;

fn two_projects() -> ReactorFixture {
    init_test_logging(None);
    let fixture = ReactorFixture::new()
        .unwrap()
        .project("g:a:1.0", &["g:b"])
        .unwrap()
        .built_project("g:b:1.0", &[])
        .unwrap()
        .property("db.host", "localhost");
    fixture.write_manifest().unwrap();
    fixture
}

#[test]
fn test_root_with_one_built_upstream_project() {
    let fixture = two_projects();
    let config = fixture.config().unwrap();

    let outcome = TestPropertiesGenerator::new(&config).execute().unwrap();
    assert_eq!(
        outcome,
        Outcome::Generated {
            properties: config.output_file.clone(),
            workspace: config.workspace_state.clone(),
        }
    );

    let props = TestProperties::load(&config.output_file).unwrap();
    let path_of = |p: &Path| p.display().to_string();
    assert_eq!(props.get("localRepository"), Some(path_of(&fixture.path().join("repo")).as_str()));
    assert_eq!(
        props.get("userSettingsFile"),
        Some(path_of(&fixture.path().join("settings.xml")).as_str())
    );
    assert_eq!(props.get("project.groupId"), Some("g"));
    assert_eq!(props.get("project.artifactId"), Some("a"));
    assert_eq!(props.get("project.version"), Some("1.0"));
    assert_eq!(
        props.get("workspaceStateProperties"),
        Some(path_of(&config.workspace_state).as_str())
    );
    assert_eq!(
        props.get("workspaceResolver"),
        Some(path_of(&fixture.path().join("resolver.jar")).as_str())
    );
    assert_eq!(props.properties().len(), 7);

    let state = WorkspaceState::load(&config.workspace_state).unwrap();
    assert_eq!(state.projects().count(), 2);
    assert_eq!(state.artifacts().count(), 1);
    assert_eq!(state.get("g:a:pom::1.0"), Some(fixture.project_dir("a").join("pom.xml").as_path()));
    assert_eq!(state.get("g:b:pom::1.0"), Some(fixture.project_dir("b").join("pom.xml").as_path()));
    assert_eq!(
        state.get("g:b:jar::1.0"),
        Some(fixture.project_dir("b").join("target/b.jar").as_path())
    );
}

#[test]
fn test_only_upstream_projects_are_recorded() {
    let fixture = ReactorFixture::new()
        .unwrap()
        .project("g:a:1.0", &["g:b"])
        .unwrap()
        .built_project("g:b:1.0", &["g:c"])
        .unwrap()
        .project("g:c:2.0-SNAPSHOT", &[])
        .unwrap()
        .built_project("g:d:1.0", &["g:a"])
        .unwrap();
    fixture.write_manifest().unwrap();
    let config = fixture.config().unwrap();

    TestPropertiesGenerator::new(&config).execute().unwrap();

    let state = WorkspaceState::load(&config.workspace_state).unwrap();
    let keys: Vec<&str> = state.iter().map(|(key, _)| key).collect();
    assert!(keys.contains(&"g:c:pom::2.0-SNAPSHOT"));
    // c has no built artifact, d is downstream of the root
    assert!(!keys.iter().any(|key| key.starts_with("g:c:jar")));
    assert!(!keys.iter().any(|key| key.starts_with("g:d:")));
    assert_eq!(keys.first(), Some(&"g:a:pom::1.0"));
    assert!(state.iter().all(|(key, entry)| {
        (entry.kind == EntryKind::Project) == key.contains(":pom::")
    }));
}

#[test]
fn test_user_values_win_over_well_known_values() {
    let fixture = two_projects();
    fixture
        .custom_properties("a", "localRepository=/opt/repository\nproject.version=9.9\nextra=1\n")
        .unwrap();
    let config = fixture.config().unwrap();

    TestPropertiesGenerator::new(&config).execute().unwrap();

    let props = TestProperties::load(&config.output_file).unwrap();
    assert_eq!(props.get("localRepository"), Some("/opt/repository"));
    assert_eq!(props.get("project.version"), Some("9.9"));
    assert_eq!(props.get("project.groupId"), Some("g"));
    assert_eq!(props.get("extra"), Some("1"));
    assert_eq!(props.properties().len(), 8);
}

#[test]
fn test_placeholders_expand_or_stay_literal() {
    let fixture = two_projects();
    fixture
        .custom_properties(
            "a",
            "url=jdbc:h2://${db.host}/${project.artifactId}-${project.version}\nport=${db.port}\n",
        )
        .unwrap();
    let config = fixture.config().unwrap();

    TestPropertiesGenerator::new(&config).execute().unwrap();

    let props = TestProperties::load(&config.output_file).unwrap();
    assert_eq!(props.get("url"), Some("jdbc:h2://localhost/a-1.0"));
    assert_eq!(props.get("port"), Some("${db.port}"));
}

#[test]
fn test_output_starts_with_generator_header() {
    let fixture = two_projects();
    let config = fixture.config().unwrap();

    TestPropertiesGenerator::new(&config).execute().unwrap();

    let text = fs::read_to_string(&config.output_file).unwrap();
    assert!(text.starts_with("#Generated by reactor-testprops"));
    let state = fs::read_to_string(&config.workspace_state).unwrap();
    assert!(state.starts_with("#Generated by reactor-testprops"));
}

#[test]
fn test_consumer_reads_runtime_classpath() {
    let fixture = two_projects();
    let classes = fixture.project_dir("a").join("target/classes");
    let jar = fixture.project_dir("b").join("target/b.jar");
    let classpath = std::env::join_paths([&classes, &jar]).unwrap();
    let escaped = classpath.to_string_lossy().replace('\\', "\\\\");
    fixture.custom_properties("a", &format!("classpath={escaped}\n")).unwrap();
    let config = fixture.config().unwrap();

    TestPropertiesGenerator::new(&config).execute().unwrap();

    let props = TestProperties::load(&config.output_file).unwrap();
    let entries = TestDependencies::new(&props).runtime_classpath().unwrap();
    assert_eq!(entries, vec![classes, jar]);
}

#[test]
fn test_verifier_over_build_log() {
    let fixture = two_projects();
    let log = fixture.path().join("build.log");
    fs::write(&log, "[INFO] Tests run: 3, Failures: 0\n[INFO] BUILD SUCCESS\n").unwrap();

    let result = VerifierResult::load(&log);
    result.assert_error_free_log().unwrap();
    result.assert_log_text("BUILD SUCCESS").unwrap();
    result.assert_log_text("Tests run: 3").unwrap();

    let err = result.assert_log_text("BUILD FAILURE").unwrap_err();
    assert!(err.to_string().contains("Log text not present: BUILD FAILURE"));

    let missing = VerifierResult::load(&fixture.path().join("absent.log"));
    assert!(missing.assert_log_text("BUILD SUCCESS").is_err());
    missing.assert_error_free_log().unwrap();
}
