//! Configuration types deserialized from `kiln.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// The top-level project configuration parsed from `kiln.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Project metadata.
    pub project: ProjectMeta,
    /// Include resolution settings.
    #[serde(default)]
    pub include: IncludeConfig,
    /// Shader cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// External compiler settings.
    #[serde(default)]
    pub compiler: CompilerConfig,
    /// Preprocessor defines applied to every shader, sorted by name.
    #[serde(default)]
    pub defines: BTreeMap<String, String>,
}

impl ProjectConfig {
    /// Configuration used when no `kiln.toml` exists.
    pub fn standalone() -> Self {
        Self {
            project: ProjectMeta {
                name: "kiln".to_string(),
                description: String::new(),
            },
            include: IncludeConfig::default(),
            cache: CacheConfig::default(),
            compiler: CompilerConfig::default(),
            defines: BTreeMap::new(),
        }
    }

    /// The `[defines]` table as ordered `(name, value)` pairs.
    pub fn define_pairs(&self) -> Vec<(String, String)> {
        self.defines
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// Core project metadata.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// A brief description of the project.
    #[serde(default)]
    pub description: String,
}

/// Include resolution settings.
#[derive(Debug, Deserialize)]
pub struct IncludeConfig {
    /// Directories searched for includes, relative to the project root.
    ///
    /// Accepts a single string or a list.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub search_paths: Vec<String>,
    /// Whether the builtin `kiln/builtin/glsl` generators are registered.
    #[serde(default = "default_true")]
    pub builtins: bool,
}

impl Default for IncludeConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            builtins: true,
        }
    }
}

/// Shader cache settings.
#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    /// Cache file path, relative to the project root.
    #[serde(default = "default_cache_path")]
    pub path: String,
    /// Whether compiles go through the cache.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            enabled: true,
        }
    }
}

/// Settings for the external shader compiler.
///
/// `args` may contain the placeholders `{stage}`, `{target}` and
/// `{identifier}`; the preprocessed source is written to the program's stdin
/// and the artifact is read from its stdout.
#[derive(Debug, Deserialize)]
pub struct CompilerConfig {
    /// Program to run.
    #[serde(default = "default_program")]
    pub program: String,
    /// Argument templates.
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Target environment substituted for `{target}`.
    #[serde(default = "default_target")]
    pub target: String,
    /// Emit debug information.
    #[serde(default)]
    pub debug_info: bool,
    /// Run the optimizer.
    #[serde(default = "default_true")]
    pub optimize: bool,
    /// Extra arguments appended when `debug_info` is set.
    #[serde(default = "default_debug_args")]
    pub debug_args: Vec<String>,
    /// Extra arguments appended when `optimize` is set.
    #[serde(default = "default_optimize_args")]
    pub optimize_args: Vec<String>,
    /// Maximum include nesting depth.
    #[serde(default = "default_max_include_depth")]
    pub max_include_depth: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            target: default_target(),
            debug_info: false,
            optimize: true,
            debug_args: default_debug_args(),
            optimize_args: default_optimize_args(),
            max_include_depth: default_max_include_depth(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_cache_path() -> String {
    ".kiln/shader_cache.bin".to_string()
}

fn default_program() -> String {
    "glslc".to_string()
}

fn default_args() -> Vec<String> {
    ["-fshader-stage={stage}", "--target-env={target}", "-o", "-", "-"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_debug_args() -> Vec<String> {
    vec!["-g".to_string()]
}

fn default_optimize_args() -> Vec<String> {
    vec!["-O".to_string()]
}

fn default_target() -> String {
    "vulkan1.3".to_string()
}

fn default_max_include_depth() -> usize {
    64
}

/// Deserializes a field that can be either a single string or a list of strings.
///
/// Allows `search_paths = "include"` as well as
/// `search_paths = ["include", "third_party"]`.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}
