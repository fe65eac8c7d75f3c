//! Include loaders and resolution results.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_common::ContentHash;

use crate::fs::FileSystem;

/// Text produced by a loader or generator, before hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInclude {
    /// Where the text came from: a canonical file path, or the identifier
    /// itself for generated includes.
    pub resolved_path: PathBuf,
    /// The include text.
    pub contents: String,
}

impl RawInclude {
    /// Creates a raw include result.
    pub fn new(resolved_path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            resolved_path: resolved_path.into(),
            contents: contents.into(),
        }
    }
}

/// The hashed result of resolving an include.
///
/// Empty contents mean "not found"; [`FoundInclude::is_found`] is then
/// `false`. The hash is always the digest of exactly [`FoundInclude::contents`],
/// including for the not-found value, which carries the digest of empty input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundInclude {
    resolved_path: PathBuf,
    contents: String,
    hash: ContentHash,
}

impl FoundInclude {
    /// Hashes a raw result. `None` becomes the not-found value.
    pub fn from_raw(raw: Option<RawInclude>) -> Self {
        match raw {
            Some(raw) => {
                let hash = ContentHash::from_bytes(raw.contents.as_bytes());
                Self {
                    resolved_path: raw.resolved_path,
                    contents: raw.contents,
                    hash,
                }
            }
            None => Self::not_found(),
        }
    }

    /// The not-found value.
    pub fn not_found() -> Self {
        Self {
            resolved_path: PathBuf::new(),
            contents: String::new(),
            hash: ContentHash::empty(),
        }
    }

    /// Returns `true` if the include resolved to non-empty text.
    pub fn is_found(&self) -> bool {
        !self.contents.is_empty()
    }

    /// The path the include resolved to.
    pub fn resolved_path(&self) -> &Path {
        &self.resolved_path
    }

    /// The resolved text.
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Digest of [`FoundInclude::contents`].
    pub fn hash(&self) -> ContentHash {
        self.hash
    }

    /// Consumes the result, returning the text.
    pub fn into_contents(self) -> String {
        self.contents
    }
}

impl Default for FoundInclude {
    fn default() -> Self {
        Self::not_found()
    }
}

/// Resolves an include identifier relative to one search root.
///
/// Loaders never fail hard: anything that prevents reading the include is a
/// miss (`None`). Loaders do not hash; the finder does.
pub trait IncludeLoader: Send + Sync {
    /// Looks up `include_name` under `search_root`.
    fn get_include(&self, search_root: &Path, include_name: &str) -> Option<RawInclude>;
}

/// Loads includes from a [`FileSystem`].
pub struct FileSystemIncludeLoader {
    fs: Arc<dyn FileSystem>,
}

impl FileSystemIncludeLoader {
    /// Creates a loader reading through `fs`.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// The path this loader reports for a file at `path`: canonical when the
    /// file exists, `path` unchanged otherwise.
    pub fn resolved_path(&self, path: &Path) -> PathBuf {
        self.fs
            .canonicalize(path)
            .unwrap_or_else(|| path.to_path_buf())
    }
}

impl IncludeLoader for FileSystemIncludeLoader {
    fn get_include(&self, search_root: &Path, include_name: &str) -> Option<RawInclude> {
        let path = self.resolved_path(&search_root.join(include_name));

        let bytes = match self.fs.read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::trace!(path = %path.display(), error = %e, "include not readable");
                return None;
            }
        };

        match String::from_utf8(bytes) {
            Ok(contents) => Some(RawInclude::new(path, contents)),
            Err(_) => {
                tracing::trace!(path = %path.display(), "include is not valid UTF-8");
                None
            }
        }
    }
}
