//! Resolution of configured paths against the project root.

use std::path::{Path, PathBuf};

use crate::types::ProjectConfig;

/// Paths from the configuration made absolute (or root-relative).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// Include search directories, in priority order.
    pub search_dirs: Vec<PathBuf>,
    /// Cache file, or `None` when the cache is disabled.
    pub cache_file: Option<PathBuf>,
}

/// Resolves the configured include and cache paths under `project_root`.
///
/// Absolute paths in the configuration are kept as they are.
pub fn resolve_paths(config: &ProjectConfig, project_root: &Path) -> ResolvedPaths {
    let search_dirs = config
        .include
        .search_paths
        .iter()
        .map(|dir| project_root.join(dir))
        .collect();
    let cache_file = config
        .cache
        .enabled
        .then(|| project_root.join(&config.cache.path));
    ResolvedPaths {
        search_dirs,
        cache_file,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn relative_paths_join_root() {
        let config = load_config_from_str(
            "[project]\nname = \"demo\"\n[include]\nsearch_paths = [\"shaders/include\"]\n",
        )
        .unwrap();
        let paths = resolve_paths(&config, Path::new("/work/demo"));
        assert_eq!(paths.search_dirs, vec![PathBuf::from("/work/demo/shaders/include")]);
        assert_eq!(
            paths.cache_file,
            Some(PathBuf::from("/work/demo/.kiln/shader_cache.bin"))
        );
    }

    #[test]
    fn absolute_paths_kept() {
        let config = load_config_from_str(
            "[project]\nname = \"demo\"\n[include]\nsearch_paths = \"/opt/glsl\"\n",
        )
        .unwrap();
        let paths = resolve_paths(&config, Path::new("/work/demo"));
        assert_eq!(paths.search_dirs, vec![PathBuf::from("/opt/glsl")]);
    }

    #[test]
    fn disabled_cache_has_no_file() {
        let config =
            load_config_from_str("[project]\nname = \"demo\"\n[cache]\nenabled = false\n").unwrap();
        assert_eq!(resolve_paths(&config, Path::new(".")).cache_file, None);
    }
}
