//! Shared helpers for CLI commands.
//!
//! Contains project root and configuration resolution, include finder
//! construction, define parsing and output path derivation.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_cache::{CompileOptions, ShaderStage};
use kiln_config::{load_config, load_config_file, resolve_paths, ProjectConfig, CONFIG_FILE_NAME};
use kiln_include::{IncludeFinder, OsFileSystem};

use crate::GlobalArgs;

/// A loaded project: its root directory and configuration.
pub struct Project {
    /// Directory containing `kiln.toml`, or the current directory.
    pub root: PathBuf,
    /// The parsed configuration.
    pub config: ProjectConfig,
}

impl Project {
    /// Cache file path, ignoring whether the cache is enabled.
    pub fn cache_path(&self) -> PathBuf {
        self.root.join(&self.config.cache.path)
    }
}

/// Walks up from `start` looking for the nearest directory containing `kiln.toml`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE_NAME).is_file())
        .map(Path::to_path_buf)
}

/// Loads the project from global CLI args.
///
/// If `--config` is specified, uses that path (file → parent dir, dir →
/// itself). Otherwise walks up from the current directory; without a
/// `kiln.toml` the defaults apply with the current directory as root.
pub fn load_project(global: &GlobalArgs) -> Result<Project, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    if let Some(ref config_path) = global.config {
        let path = PathBuf::from(config_path);
        return if path.is_dir() {
            Ok(Project {
                config: load_config(&path)?,
                root: path,
            })
        } else {
            let root = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| cwd.clone(), Path::to_path_buf);
            Ok(Project {
                config: load_config_file(&path)?,
                root,
            })
        };
    }

    match find_project_root(&cwd) {
        Some(root) => Ok(Project {
            config: load_config(&root)?,
            root,
        }),
        None => {
            tracing::debug!(dir = %cwd.display(), "no kiln.toml found, using defaults");
            Ok(Project {
                root: cwd,
                config: ProjectConfig::standalone(),
            })
        }
    }
}

/// Builds an include finder over the host filesystem.
///
/// `extra_dirs` come first, then the configured search paths.
pub fn build_finder(project: &Project, extra_dirs: &[PathBuf]) -> IncludeFinder {
    let fs = Arc::new(OsFileSystem);
    let mut finder = if project.config.include.builtins {
        IncludeFinder::with_builtins(fs)
    } else {
        IncludeFinder::new(fs)
    };
    for dir in extra_dirs {
        finder.add_search_dir(dir.clone());
    }
    for dir in resolve_paths(&project.config, &project.root).search_dirs {
        finder.add_search_dir(dir);
    }
    finder
}

/// Parses `NAME` or `NAME=VALUE`.
pub fn parse_define(arg: &str) -> Result<(String, String), String> {
    let (name, value) = arg.split_once('=').unwrap_or((arg, ""));
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("invalid define '{arg}': empty name"));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Configured defines followed by command-line defines. A command-line define
/// replaces a configured one with the same name.
pub fn merged_defines(
    config: &ProjectConfig,
    cli_defines: &[String],
) -> Result<Vec<(String, String)>, String> {
    let mut defines = config.define_pairs();
    for arg in cli_defines {
        let (name, value) = parse_define(arg)?;
        match defines.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => defines.push((name, value)),
        }
    }
    Ok(defines)
}

/// Compile options for `stage` from the `[compiler]` table.
pub fn compile_options(
    config: &ProjectConfig,
    stage: ShaderStage,
    defines: Vec<(String, String)>,
) -> CompileOptions {
    CompileOptions {
        stage,
        target_env: config.compiler.target.clone(),
        debug_info: config.compiler.debug_info,
        optimize: config.compiler.optimize,
        extra_defines: defines,
    }
}

/// Determines a file's stage from `--stage` or its extension.
pub fn stage_for(file: &Path, explicit: Option<ShaderStage>) -> Result<ShaderStage, String> {
    explicit
        .or_else(|| {
            file.extension()
                .and_then(|ext| ext.to_str())
                .and_then(ShaderStage::from_extension)
        })
        .ok_or_else(|| {
            format!(
                "cannot infer the shader stage of {}; pass --stage",
                file.display()
            )
        })
}

/// Output path for `file`.
///
/// Without `--output` the artifact goes next to the source as `<file>.spv`.
/// With several inputs `--output` names a directory.
pub fn output_path(file: &Path, output: Option<&Path>, multiple: bool) -> PathBuf {
    let mut default_name: OsString = file.file_name().unwrap_or_default().to_os_string();
    default_name.push(".spv");
    match output {
        Some(out) if multiple => out.join(default_name),
        Some(out) => out.to_path_buf(),
        None => file.with_file_name(default_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn find_project_root_in_parent() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "[project]\nname = \"t\"\n").unwrap();
        let sub = tmp.path().join("shaders/post");
        fs::create_dir_all(&sub).unwrap();
        assert_eq!(find_project_root(&sub).unwrap(), tmp.path());
    }

    #[test]
    fn find_project_root_not_found() {
        let tmp = TempDir::new().unwrap();
        let sub = tmp.path().join("a");
        fs::create_dir_all(&sub).unwrap();
        // The temp dir itself may live under a directory with a kiln.toml;
        // only check that the result is not inside the temp dir.
        if let Some(root) = find_project_root(&sub) {
            assert!(!root.starts_with(tmp.path()));
        }
    }

    #[test]
    fn load_project_from_explicit_file() {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(&config, "[project]\nname = \"explicit\"\n").unwrap();
        let global = GlobalArgs {
            quiet: false,
            verbose: false,
            config: Some(config.to_string_lossy().into_owned()),
        };
        let project = load_project(&global).unwrap();
        assert_eq!(project.config.project.name, "explicit");
        assert_eq!(project.root, tmp.path());
        assert_eq!(
            project.cache_path(),
            tmp.path().join(".kiln/shader_cache.bin")
        );
    }

    #[test]
    fn finder_puts_cli_dirs_first() {
        let tmp = TempDir::new().unwrap();
        let mut config = ProjectConfig::standalone();
        config.include.search_paths = vec!["configured".to_string()];
        let project = Project {
            root: tmp.path().to_path_buf(),
            config,
        };
        let finder = build_finder(&project, &[PathBuf::from("cli")]);
        let roots: Vec<_> = finder.search_paths().iter().map(|e| e.root.clone()).collect();
        assert_eq!(
            roots,
            vec![
                PathBuf::new(),
                PathBuf::from("cli"),
                tmp.path().join("configured")
            ]
        );
        assert!(!finder.generators().is_empty());
    }

    #[test]
    fn parse_define_forms() {
        assert_eq!(parse_define("FAST").unwrap(), ("FAST".into(), String::new()));
        assert_eq!(parse_define("N=4").unwrap(), ("N".into(), "4".into()));
        assert_eq!(parse_define("EXPR=a=b").unwrap(), ("EXPR".into(), "a=b".into()));
        assert!(parse_define("=1").is_err());
    }

    #[test]
    fn cli_defines_override_config() {
        let mut config = ProjectConfig::standalone();
        config.defines.insert("A".into(), "1".into());
        config.defines.insert("B".into(), "2".into());
        let defines = merged_defines(&config, &["B=3".into(), "C".into()]).unwrap();
        assert_eq!(
            defines,
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "3".to_string()),
                ("C".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn stage_inferred_from_extension() {
        assert_eq!(
            stage_for(Path::new("s/blur.comp"), None).unwrap(),
            ShaderStage::Compute
        );
        assert_eq!(
            stage_for(Path::new("s/blur.glsl"), Some(ShaderStage::Fragment)).unwrap(),
            ShaderStage::Fragment
        );
        assert!(stage_for(Path::new("s/blur.glsl"), None).is_err());
    }

    #[test]
    fn output_paths() {
        let file = Path::new("shaders/main.frag");
        assert_eq!(
            output_path(file, None, false),
            PathBuf::from("shaders/main.frag.spv")
        );
        assert_eq!(
            output_path(file, Some(Path::new("out.spv")), false),
            PathBuf::from("out.spv")
        );
        assert_eq!(
            output_path(file, Some(Path::new("build")), true),
            PathBuf::from("build/main.frag.spv")
        );
    }

    #[test]
    fn options_from_config() {
        let mut config = ProjectConfig::standalone();
        config.compiler.debug_info = true;
        let options = compile_options(&config, ShaderStage::Vertex, Vec::new());
        assert_eq!(options.target_env, "vulkan1.3");
        assert!(options.debug_info);
        assert!(options.optimize);
    }
}
