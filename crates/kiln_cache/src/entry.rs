//! Cache keys, entries and compiled artifacts.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use kiln_include::PreprocessingDependency;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_128;

/// Pipeline stage a shader is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderStage {
    /// Vertex shader.
    Vertex,
    /// Tessellation control shader.
    TessControl,
    /// Tessellation evaluation shader.
    TessEvaluation,
    /// Geometry shader.
    Geometry,
    /// Fragment shader.
    Fragment,
    /// Compute shader.
    Compute,
    /// Task shader.
    Task,
    /// Mesh shader.
    Mesh,
}

impl ShaderStage {
    /// All stages, in pipeline order.
    pub const ALL: [ShaderStage; 8] = [
        ShaderStage::Vertex,
        ShaderStage::TessControl,
        ShaderStage::TessEvaluation,
        ShaderStage::Geometry,
        ShaderStage::Fragment,
        ShaderStage::Compute,
        ShaderStage::Task,
        ShaderStage::Mesh,
    ];

    /// Short name, as used in file extensions and compiler flags.
    pub fn short_name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vert",
            ShaderStage::TessControl => "tesc",
            ShaderStage::TessEvaluation => "tese",
            ShaderStage::Geometry => "geom",
            ShaderStage::Fragment => "frag",
            ShaderStage::Compute => "comp",
            ShaderStage::Task => "task",
            ShaderStage::Mesh => "mesh",
        }
    }

    /// Guesses the stage from a file extension such as `frag`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.short_name() == ext)
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Error returned when a stage name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown shader stage '{0}'")]
pub struct UnknownStage(pub String);

impl FromStr for ShaderStage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stage = match s {
            "vert" | "vertex" => ShaderStage::Vertex,
            "tesc" | "tess_control" => ShaderStage::TessControl,
            "tese" | "tess_evaluation" => ShaderStage::TessEvaluation,
            "geom" | "geometry" => ShaderStage::Geometry,
            "frag" | "fragment" => ShaderStage::Fragment,
            "comp" | "compute" => ShaderStage::Compute,
            "task" => ShaderStage::Task,
            "mesh" => ShaderStage::Mesh,
            other => return Err(UnknownStage(other.to_string())),
        };
        Ok(stage)
    }
}

/// Format of a compiled artifact's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// SPIR-V binary.
    Spirv,
    /// GLSL source text.
    Glsl,
    /// HLSL source text.
    Hlsl,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContentType::Spirv => "spirv",
            ContentType::Glsl => "glsl",
            ContentType::Hlsl => "hlsl",
        })
    }
}

/// Resolved options that affect the compiled output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOptions {
    /// Stage to compile for.
    pub stage: ShaderStage,
    /// Target environment, e.g. `vulkan1.3`.
    pub target_env: String,
    /// Emit debug information.
    pub debug_info: bool,
    /// Run the optimizer.
    pub optimize: bool,
    /// `(name, value)` defines injected before compiling, in order.
    pub extra_defines: Vec<(String, String)>,
}

impl CompileOptions {
    /// Options for `stage` with a Vulkan 1.3 target, optimized, no debug info.
    pub fn new(stage: ShaderStage) -> Self {
        Self {
            stage,
            target_env: "vulkan1.3".to_string(),
            debug_info: false,
            optimize: true,
            extra_defines: Vec::new(),
        }
    }
}

/// Everything a compile depends on apart from its includes.
///
/// Keys compare by value; entries with equal keys share a bucket and are
/// told apart by their dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheKey {
    /// Main source text, before preprocessing.
    pub main_source: String,
    /// Identifier of the main source, usually its path.
    pub source_identifier: String,
    /// Compile options.
    pub options: CompileOptions,
}

impl CacheKey {
    /// Creates a key.
    pub fn new(
        main_source: impl Into<String>,
        source_identifier: impl Into<String>,
        options: CompileOptions,
    ) -> Self {
        Self {
            main_source: main_source.into(),
            source_identifier: source_identifier.into(),
            options,
        }
    }

    /// 128-bit fingerprint used to locate the key's bucket.
    ///
    /// Stable across runs and platforms. Distinct keys may collide; bucket
    /// members are always compared by value.
    pub fn fingerprint(&self) -> u128 {
        let mut buf = Vec::with_capacity(self.main_source.len() + 128);
        push_field(&mut buf, self.main_source.as_bytes());
        push_field(&mut buf, self.source_identifier.as_bytes());
        push_field(&mut buf, self.options.stage.short_name().as_bytes());
        push_field(&mut buf, self.options.target_env.as_bytes());
        buf.push(u8::from(self.options.debug_info));
        buf.push(u8::from(self.options.optimize));
        for (name, value) in &self.options.extra_defines {
            push_field(&mut buf, name.as_bytes());
            push_field(&mut buf, value.as_bytes());
        }
        xxh3_128(&buf)
    }
}

fn push_field(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    buf.extend_from_slice(bytes);
}

/// A compiled shader artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledShader {
    /// Stage the artifact was compiled for.
    pub stage: ShaderStage,
    /// Format of `code`.
    pub content_type: ContentType,
    /// Human-readable origin, usually the source path.
    pub filepath_hint: String,
    /// The artifact bytes.
    pub code: Vec<u8>,
}

/// One cached compile result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The key the entry was compiled from.
    pub key: CacheKey,
    /// Include resolutions, in the order the preprocessor performed them.
    pub dependencies: Vec<PreprocessingDependency>,
    /// The compiled artifact.
    pub value: Arc<CompiledShader>,
}

impl CacheEntry {
    /// Creates an entry.
    pub fn new(
        key: CacheKey,
        dependencies: Vec<PreprocessingDependency>,
        value: CompiledShader,
    ) -> Self {
        Self {
            key,
            dependencies,
            value: Arc::new(value),
        }
    }
}
