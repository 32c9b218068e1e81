//! Names and default locations used across the crate.
//!
//! Keys listed here are part of the output contract: downstream test harnesses read them from
//! the generated properties file by exactly these names.

/// Header comment written at the top of the generated properties file.
pub const GENERATOR_HEADER: &str = "Generated by reactor-testprops";

/// Key of the local artifact repository directory.
pub const LOCAL_REPOSITORY_KEY: &str = "localRepository";

/// Key of the user settings file.
pub const USER_SETTINGS_FILE_KEY: &str = "userSettingsFile";

/// Key of the root project's group identifier.
pub const PROJECT_GROUP_ID_KEY: &str = "project.groupId";

/// Key of the root project's artifact identifier.
pub const PROJECT_ARTIFACT_ID_KEY: &str = "project.artifactId";

/// Key of the root project's version.
pub const PROJECT_VERSION_KEY: &str = "project.version";

/// Key of the workspace-state file.
pub const WORKSPACE_STATE_KEY: &str = "workspaceStateProperties";

/// Key of the workspace-resolver artifact.
pub const WORKSPACE_RESOLVER_KEY: &str = "workspaceResolver";

/// Property holding the runtime classpath in consumer-side dependency files.
pub const CLASSPATH_KEY: &str = "classpath";

/// Custom properties file, relative to the project base directory.
pub const DEFAULT_CUSTOM_PROPERTIES: &str = "src/test/test.properties";

/// Generated properties file, relative to the project base directory.
pub const DEFAULT_OUTPUT_FILE: &str = "target/test-classes/test.properties";

/// Workspace-state file, relative to the project base directory.
pub const DEFAULT_WORKSPACE_STATE: &str = "target/workspacestate.properties";

/// Incremental build state, relative to the project base directory.
pub const DEFAULT_BUILD_STATE: &str = "target/incremental/testprops.json";

/// Local repository, relative to the user's home directory.
pub const DEFAULT_LOCAL_REPOSITORY: &str = ".m2/repository";

/// User settings file, relative to the user's home directory.
pub const DEFAULT_USER_SETTINGS: &str = ".m2/settings.xml";

/// Default reactor manifest file name.
pub const REACTOR_MANIFEST: &str = "reactor.toml";

/// Format version of the persisted incremental build state.
pub const BUILD_STATE_VERSION: u32 = 1;
