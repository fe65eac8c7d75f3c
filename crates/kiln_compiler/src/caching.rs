//! The caching compile driver.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_cache::{CacheEntry, CacheKey, CompileOptions, CompiledShader, ShaderCache};
use kiln_include::{IncludeFinder, PreprocessOptions, Preprocessor};
use rayon::prelude::*;

use crate::compiler::{CompileRequest, ShaderCompiler};
use crate::error::CompileError;

/// Result of a compile through the cache.
#[derive(Debug, Clone)]
pub struct CompileOutcome {
    /// The compiled artifact.
    pub shader: Arc<CompiledShader>,
    /// `true` if the artifact came from the cache.
    pub cache_hit: bool,
}

/// One shader in a batch passed to [`CachingCompiler::compile_many`].
#[derive(Debug, Clone)]
pub struct CompileJob {
    /// Main source text.
    pub source: String,
    /// Path the source was read from.
    pub path: PathBuf,
    /// Compile options.
    pub options: CompileOptions,
}

/// Compiles shaders, reusing cached artifacts whose includes are unchanged.
///
/// On a miss the source is preprocessed, compiled by the backend, and the
/// result is inserted together with the include resolutions performed while
/// preprocessing. Safe to share across threads.
pub struct CachingCompiler {
    finder: Arc<IncludeFinder>,
    cache: Arc<ShaderCache>,
    backend: Arc<dyn ShaderCompiler>,
    max_include_depth: usize,
}

impl CachingCompiler {
    /// Creates a driver.
    pub fn new(
        finder: Arc<IncludeFinder>,
        cache: Arc<ShaderCache>,
        backend: Arc<dyn ShaderCompiler>,
    ) -> Self {
        Self {
            finder,
            cache,
            backend,
            max_include_depth: kiln_include::DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }

    /// Sets the include nesting limit used when preprocessing.
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// The include finder.
    pub fn finder(&self) -> &IncludeFinder {
        &self.finder
    }

    /// The shader cache.
    pub fn cache(&self) -> &Arc<ShaderCache> {
        &self.cache
    }

    /// Compiles `source`, read from `source_path`, with `options`.
    pub fn compile(
        &self,
        source: &str,
        source_path: &Path,
        options: &CompileOptions,
    ) -> Result<CompileOutcome, CompileError> {
        let identifier = source_path.to_string_lossy().replace('\\', "/");
        let key = CacheKey::new(source, identifier.as_str(), options.clone());

        if let Some(shader) = self.cache.find(&key, &self.finder) {
            return Ok(CompileOutcome {
                shader,
                cache_hit: true,
            });
        }

        let preprocess_options = PreprocessOptions {
            extra_defines: options.extra_defines.clone(),
            max_include_depth: self.max_include_depth,
        };
        let expanded =
            Preprocessor::new(&self.finder, &preprocess_options).preprocess(source, source_path)?;

        let code = self.backend.compile(&CompileRequest {
            source: &expanded.code,
            identifier: &identifier,
            options,
        })?;

        let entry = CacheEntry::new(
            key,
            expanded.dependencies,
            CompiledShader {
                stage: options.stage,
                content_type: self.backend.content_type(),
                filepath_hint: identifier,
                code,
            },
        );
        let shader = Arc::clone(&entry.value);
        self.cache.insert(entry);

        Ok(CompileOutcome {
            shader,
            cache_hit: false,
        })
    }

    /// Compiles a batch in parallel. Results are in job order.
    pub fn compile_many(&self, jobs: &[CompileJob]) -> Vec<Result<CompileOutcome, CompileError>> {
        jobs.par_iter()
            .map(|job| self.compile(&job.source, &job.path, &job.options))
            .collect()
    }
}
