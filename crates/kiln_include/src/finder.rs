//! Include resolution across search paths and generators.
//!
//! The [`IncludeFinder`] answers standard (`#include <...>`) and relative
//! (`#include "..."`) requests. Standard requests try generators first (by
//! "path peeling", see [`IncludeFinder::get_include_standard`]), then the
//! search paths in registration order, then the requesting file's directory.
//! Relative requests try the requesting directory first, then search paths,
//! and never consult generators.
//!
//! The finder is configured up front and then shared read-only; every
//! mutating method takes `&mut self`.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::builtin::{builtin_generators, BUILTIN_GLSL_PREFIX};
use crate::fs::{FileSystem, OsFileSystem};
use crate::generator::IncludeGenerator;
use crate::loader::{FileSystemIncludeLoader, FoundInclude, IncludeLoader, RawInclude};

/// Identifier resolved once when a finder is built with builtins, so the
/// embedded table is exercised before any compile runs.
const WARMUP_INCLUDE: &str = "kiln/builtin/glsl/utils/common.glsl";

/// A loader paired with the root it resolves against.
#[derive(Clone)]
pub struct SearchPathEntry {
    /// The loader.
    pub loader: Arc<dyn IncludeLoader>,
    /// Root passed to the loader for every lookup.
    pub root: PathBuf,
}

/// A generator paired with its standardized prefix.
#[derive(Clone)]
pub struct GeneratorEntry {
    /// The generator.
    pub generator: Arc<dyn IncludeGenerator>,
    /// The generator's prefix without a trailing `/`.
    pub prefix: String,
}

/// Resolves include identifiers through loaders and generators.
pub struct IncludeFinder {
    default_loader: Arc<FileSystemIncludeLoader>,
    search_paths: Vec<SearchPathEntry>,
    /// Sorted by descending prefix.
    generators: Vec<GeneratorEntry>,
    builtins_registered: bool,
}

impl IncludeFinder {
    /// Creates a finder whose default loader reads through `fs`.
    ///
    /// The default loader is registered as the first search path with an
    /// empty root.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        let default_loader = Arc::new(FileSystemIncludeLoader::new(fs));
        let mut finder = Self {
            default_loader: Arc::clone(&default_loader),
            search_paths: Vec::new(),
            generators: Vec::new(),
            builtins_registered: false,
        };
        finder.add_search_path("", default_loader);
        finder
    }

    /// Creates a finder reading from the host filesystem.
    pub fn with_os_filesystem() -> Self {
        Self::new(Arc::new(OsFileSystem))
    }

    /// Creates a finder with the builtin generators registered.
    pub fn with_builtins(fs: Arc<dyn FileSystem>) -> Self {
        let mut finder = Self::new(fs);
        finder.ensure_builtins_registered();
        let warm = finder.get_include_standard(Path::new(""), WARMUP_INCLUDE);
        debug_assert!(warm.is_found(), "builtin header {WARMUP_INCLUDE} missing");
        finder
    }

    /// Registers the shared builtin generators. Calling this more than once
    /// has no further effect.
    pub fn ensure_builtins_registered(&mut self) {
        if self.builtins_registered {
            return;
        }
        for generator in builtin_generators() {
            self.add_generator(Arc::clone(generator));
        }
        self.builtins_registered = true;
        tracing::debug!(prefix = BUILTIN_GLSL_PREFIX, "builtin include generators registered");
    }

    /// Appends a search path. Earlier search paths take priority.
    pub fn add_search_path(&mut self, root: impl Into<PathBuf>, loader: Arc<dyn IncludeLoader>) {
        self.search_paths.push(SearchPathEntry {
            loader,
            root: root.into(),
        });
    }

    /// Appends a search path served by the default filesystem loader.
    pub fn add_search_dir(&mut self, root: impl Into<PathBuf>) {
        let loader: Arc<dyn IncludeLoader> = self.default_loader.clone();
        self.add_search_path(root, loader);
    }

    /// Inserts a generator, keeping the list sorted by descending prefix.
    ///
    /// The generator is placed before any existing generator with an equal
    /// prefix.
    pub fn add_generator(&mut self, generator: Arc<dyn IncludeGenerator>) {
        let prefix = standardize_prefix(generator.prefix());
        let at = self
            .generators
            .partition_point(|entry| entry.prefix.as_str() > prefix.as_str());
        self.generators.insert(at, GeneratorEntry { generator, prefix });
    }

    /// The path the default loader reports for a file at `path`.
    ///
    /// Include results carry paths in this form, so callers comparing a file
    /// they read themselves against resolved includes should use it too.
    pub fn resolved_path(&self, path: &Path) -> PathBuf {
        self.default_loader.resolved_path(path)
    }

    /// Registered search paths, in priority order.
    pub fn search_paths(&self) -> &[SearchPathEntry] {
        &self.search_paths
    }

    /// Registered generators, sorted by descending prefix.
    pub fn generators(&self) -> &[GeneratorEntry] {
        &self.generators
    }

    /// Resolves an `#include <...>` request.
    ///
    /// Order: generators whose prefix is an ancestor directory of
    /// `include_name`, then search paths, then the default loader relative to
    /// `requesting_dir`.
    pub fn get_include_standard(&self, requesting_dir: &Path, include_name: &str) -> FoundInclude {
        let raw = self
            .try_include_generators(include_name)
            .or_else(|| self.try_search_paths(include_name))
            .or_else(|| {
                non_empty(self.default_loader.get_include(requesting_dir, include_name))
            });
        FoundInclude::from_raw(raw)
    }

    /// Resolves an `#include "..."` request.
    ///
    /// Order: the default loader relative to `requesting_dir`, then search
    /// paths.
    pub fn get_include_relative(&self, requesting_dir: &Path, include_name: &str) -> FoundInclude {
        let raw = non_empty(self.default_loader.get_include(requesting_dir, include_name))
            .or_else(|| self.try_search_paths(include_name));
        FoundInclude::from_raw(raw)
    }

    /// First non-empty result from the search paths, in registration order.
    pub fn try_search_paths(&self, include_name: &str) -> Option<RawInclude> {
        self.search_paths
            .iter()
            .find_map(|entry| non_empty(entry.loader.get_include(&entry.root, include_name)))
    }

    /// Path peeling: strips the extension (and any parameter segments after
    /// it), then walks up the directory chain trying every generator whose
    /// prefix equals the current directory. Generators always receive the
    /// original identifier.
    pub fn try_include_generators(&self, include_name: &str) -> Option<RawInclude> {
        // Parameters after the extension (`tex.glsl/512/64`) are not path
        // components, so the cut is at the last '.' of the whole identifier.
        let stem = include_name
            .rfind('.')
            .map_or(include_name, |dot| &include_name[..dot]);
        let mut path = parent(stem);

        let mut end = 0;
        while !path.is_empty() && !is_rooted(path) && end != self.generators.len() {
            // Shorter ancestors sort after longer ones in descending order, so
            // each run starts at or after the previous one.
            let begin = end
                + self.generators[end..].partition_point(|entry| entry.prefix.as_str() > path);
            end = begin
                + self.generators[begin..].partition_point(|entry| entry.prefix.as_str() >= path);

            for entry in &self.generators[begin..end] {
                if let Some(found) = non_empty(entry.generator.get_include(include_name)) {
                    return Some(found);
                }
            }

            path = parent(path);
        }

        None
    }
}

fn non_empty(raw: Option<RawInclude>) -> Option<RawInclude> {
    raw.filter(|raw| !raw.contents.is_empty())
}

/// Removes a single trailing `/` so prefixes compare equal to directory
/// strings produced by [`parent`].
fn standardize_prefix(prefix: &str) -> String {
    match prefix.strip_suffix('/') {
        Some(stripped) if prefix.len() > 1 => stripped.to_string(),
        _ => prefix.to_string(),
    }
}

fn parent(path: &str) -> &str {
    path.rfind('/').map_or("", |slash| &path[..slash])
}

fn is_rooted(path: &str) -> bool {
    matches!(
        Path::new(path).components().next(),
        Some(Component::RootDir | Component::Prefix(_))
    )
}
