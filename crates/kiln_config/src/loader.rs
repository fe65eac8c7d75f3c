//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::Path;

/// Name of the configuration file at the project root.
pub const CONFIG_FILE_NAME: &str = "kiln.toml";

/// Loads and validates `<project_dir>/kiln.toml`.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    load_config_file(&project_dir.join(CONFIG_FILE_NAME))
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `kiln.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and configuration values are consistent.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.compiler.program.is_empty() {
        return Err(ConfigError::MissingField("compiler.program".to_string()));
    }
    if config.cache.enabled && config.cache.path.is_empty() {
        return Err(ConfigError::ValidationError(
            "cache.path must not be empty when the cache is enabled".to_string(),
        ));
    }
    if config.compiler.max_include_depth == 0 {
        return Err(ConfigError::ValidationError(
            "compiler.max_include_depth must be at least 1".to_string(),
        ));
    }
    if let Some(name) = config.defines.keys().find(|name| !is_identifier(name)) {
        return Err(ConfigError::ValidationError(format!(
            "define '{name}' is not a valid identifier"
        )));
    }
    Ok(())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
[project]
name = "demo"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.project.name, "demo");
        assert!(config.include.search_paths.is_empty());
        assert!(config.include.builtins);
        assert_eq!(config.cache.path, ".kiln/shader_cache.bin");
        assert!(config.cache.enabled);
        assert_eq!(config.compiler.program, "glslc");
        assert_eq!(config.compiler.max_include_depth, 64);
        assert!(config.defines.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[project]
name = "demo"
description = "Deferred renderer shaders"

[include]
search_paths = ["shaders/include", "third_party/glsl"]
builtins = false

[cache]
path = "build/shaders.cache"
enabled = true

[compiler]
program = "glslangValidator"
args = ["-V", "--stdin", "-S", "{stage}", "-o", "/dev/stdout"]
target = "vulkan1.2"
debug_info = true
optimize = false
max_include_depth = 16

[defines]
USE_FAST_PATH = "1"
SHADOW_CASCADES = "4"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.project.description, "Deferred renderer shaders");
        assert_eq!(config.include.search_paths.len(), 2);
        assert!(!config.include.builtins);
        assert_eq!(config.cache.path, "build/shaders.cache");
        assert_eq!(config.compiler.program, "glslangValidator");
        assert_eq!(config.compiler.args[3], "{stage}");
        assert_eq!(config.compiler.target, "vulkan1.2");
        assert!(config.compiler.debug_info);
        assert!(!config.compiler.optimize);
        assert_eq!(config.compiler.max_include_depth, 16);
        assert_eq!(config.defines["SHADOW_CASCADES"], "4");
    }

    #[test]
    fn missing_name_errors() {
        let err = load_config_from_str("[project]\nname = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(ref f) if f == "project.name"));
    }

    #[test]
    fn missing_project_table_errors() {
        let err = load_config_from_str("[cache]\nenabled = false\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn empty_program_errors() {
        let toml = "[project]\nname = \"demo\"\n[compiler]\nprogram = \"\"\n";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(ref f) if f == "compiler.program"));
    }

    #[test]
    fn empty_cache_path_errors_only_when_enabled() {
        let toml = "[project]\nname = \"demo\"\n[cache]\npath = \"\"\n";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        let toml = "[project]\nname = \"demo\"\n[cache]\npath = \"\"\nenabled = false\n";
        assert!(load_config_from_str(toml).is_ok());
    }

    #[test]
    fn zero_include_depth_errors() {
        let toml = "[project]\nname = \"demo\"\n[compiler]\nmax_include_depth = 0\n";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn invalid_define_name_errors() {
        let toml = "[project]\nname = \"demo\"\n[defines]\n\"1BAD\" = \"x\"\n";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(err.to_string().contains("'1BAD'"));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_project_dir() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "[project]\nname = \"disk\"\n").unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.project.name, "disk");
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
