//! When a second run regenerates.

use reactor_testprops::config::GenerateConfig;
use reactor_testprops::generator::{Outcome, TestPropertiesGenerator};
use reactor_testprops::test_utils::ReactorFixture;
use reactor_testprops::workspace::WorkspaceState;
use std::fs;

fn generated(fixture: &ReactorFixture) -> (GenerateConfig, Vec<u8>) {
    let config = fixture.config().unwrap();
    let outcome = TestPropertiesGenerator::new(&config).execute().unwrap();
    assert!(matches!(outcome, Outcome::Generated { .. }));
    let bytes = fs::read(&config.output_file).unwrap();
    (config, bytes)
}

fn run(fixture: &ReactorFixture) -> Outcome {
    let config = fixture.config().unwrap();
    TestPropertiesGenerator::new(&config).execute().unwrap()
}

fn fixture() -> ReactorFixture {
    let fixture = ReactorFixture::new()
        .unwrap()
        .project("g:a:1.0", &["g:b"])
        .unwrap()
        .built_project("g:b:1.0", &[])
        .unwrap();
    fixture.write_manifest().unwrap();
    fixture.custom_properties("a", "k=${project.version}\n").unwrap();
    fixture
}

#[test]
fn test_unchanged_inputs_are_up_to_date() {
    let fixture = fixture();
    let (config, first) = generated(&fixture);
    let state = fs::read(&config.workspace_state).unwrap();

    assert_eq!(run(&fixture), Outcome::UpToDate);
    assert_eq!(run(&fixture), Outcome::UpToDate);
    assert_eq!(fs::read(&config.output_file).unwrap(), first);
    assert_eq!(fs::read(&config.workspace_state).unwrap(), state);
}

#[test]
fn test_rewriting_identical_content_is_not_a_change() {
    let fixture = fixture();
    let (config, _) = generated(&fixture);

    let descriptor = fixture.project_dir("a").join("pom.xml");
    let content = fs::read(&descriptor).unwrap();
    fs::write(&descriptor, &content).unwrap();
    fs::write(&config.custom_properties, "k=${project.version}\n").unwrap();

    assert_eq!(run(&fixture), Outcome::UpToDate);
}

#[test]
fn test_changed_descriptor_regenerates() {
    let fixture = fixture();
    generated(&fixture);

    fs::write(fixture.project_dir("a").join("pom.xml"), "<project><version>2</version></project>")
        .unwrap();
    assert!(matches!(run(&fixture), Outcome::Generated { .. }));
    assert_eq!(run(&fixture), Outcome::UpToDate);
}

#[test]
fn test_changed_custom_properties_regenerate() {
    let fixture = fixture();
    let (config, first) = generated(&fixture);

    fixture.custom_properties("a", "k=changed\n").unwrap();
    assert!(matches!(run(&fixture), Outcome::Generated { .. }));
    assert_ne!(fs::read(&config.output_file).unwrap(), first);
}

#[test]
fn test_removed_custom_properties_regenerate() {
    let fixture = fixture();
    let (config, _) = generated(&fixture);

    fs::remove_file(&config.custom_properties).unwrap();
    assert!(matches!(run(&fixture), Outcome::Generated { .. }));

    let output = fs::read_to_string(&config.output_file).unwrap();
    assert!(!output.contains("k="));
}

#[test]
fn test_changed_setting_regenerates() {
    let fixture = fixture();
    generated(&fixture);

    let changed = fixture.manifest().unwrap().replace("\"repo\"", "\"other-repo\"");
    fs::write(fixture.manifest_path(), changed).unwrap();
    assert!(matches!(run(&fixture), Outcome::Generated { .. }));
}

#[test]
fn test_upstream_built_after_first_run_regenerates() {
    let fixture = ReactorFixture::new()
        .unwrap()
        .project("g:a:1.0", &["g:b"])
        .unwrap()
        .project("g:b:1.0", &[])
        .unwrap();
    fixture.write_manifest().unwrap();
    let (config, _) = generated(&fixture);
    assert_eq!(WorkspaceState::load(&config.workspace_state).unwrap().artifacts().count(), 0);

    fs::create_dir_all(fixture.project_dir("b").join("target")).unwrap();
    fs::write(fixture.project_dir("b").join("target/b.jar"), "jar").unwrap();
    let built = fixture.manifest().unwrap().replace(
        "descriptor = \"b/pom.xml\"\n",
        "descriptor = \"b/pom.xml\"\nartifact = \"b/target/b.jar\"\n",
    );
    fs::write(fixture.manifest_path(), built).unwrap();

    assert!(matches!(run(&fixture), Outcome::Generated { .. }));
    let state = WorkspaceState::load(&config.workspace_state).unwrap();
    assert_eq!(
        state.get("g:b:jar::1.0"),
        Some(fixture.project_dir("b").join("target/b.jar").as_path())
    );
    assert_eq!(run(&fixture), Outcome::UpToDate);
}

#[test]
fn test_new_dependency_edge_regenerates() {
    let fixture = ReactorFixture::new()
        .unwrap()
        .project("g:a:1.0", &[])
        .unwrap()
        .built_project("g:b:1.0", &[])
        .unwrap();
    fixture.write_manifest().unwrap();
    let (config, _) = generated(&fixture);
    assert_eq!(WorkspaceState::load(&config.workspace_state).unwrap().projects().count(), 1);

    let linked = fixture.manifest().unwrap().replacen(
        "dependencies = []",
        "dependencies = [\"g:b\"]",
        1,
    );
    fs::write(fixture.manifest_path(), linked).unwrap();

    assert!(matches!(run(&fixture), Outcome::Generated { .. }));
    let state = WorkspaceState::load(&config.workspace_state).unwrap();
    assert_eq!(state.projects().count(), 2);
    assert_eq!(state.artifacts().count(), 1);
}

#[test]
fn test_rebuilt_upstream_artifact_in_place_is_up_to_date() {
    let fixture = fixture();
    generated(&fixture);

    fs::write(fixture.project_dir("b").join("target/b.jar"), "rebuilt").unwrap();
    assert_eq!(run(&fixture), Outcome::UpToDate);
}

#[test]
fn test_missing_or_corrupt_state_regenerates() {
    let fixture = fixture();
    let (config, first) = generated(&fixture);

    fs::write(&config.build_state, "not json").unwrap();
    assert!(matches!(run(&fixture), Outcome::Generated { .. }));
    assert_eq!(fs::read(&config.output_file).unwrap(), first);

    fs::remove_file(&config.build_state).unwrap();
    assert!(matches!(run(&fixture), Outcome::Generated { .. }));
    assert_eq!(run(&fixture), Outcome::UpToDate);
}

#[test]
fn test_edited_output_regenerates() {
    let fixture = fixture();
    let (config, first) = generated(&fixture);

    fs::write(&config.output_file, "tampered=1\n").unwrap();
    assert!(matches!(run(&fixture), Outcome::Generated { .. }));
    assert_eq!(fs::read(&config.output_file).unwrap(), first);
}

#[test]
fn test_status_agrees_with_execute() {
    let fixture = fixture();
    let config = fixture.config().unwrap();
    let generator = TestPropertiesGenerator::new(&config);

    assert!(generator.status().unwrap());
    assert!(!config.output_file.exists());
    generator.execute().unwrap();
    assert!(!generator.status().unwrap());
}
