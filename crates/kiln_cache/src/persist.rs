//! Loading and saving cache files.

use std::io::{self, Write};
use std::path::Path;

use crate::cache::ShaderCache;
use crate::error::CacheError;

/// Reads and decodes the cache file at `path`.
pub fn load_cache(path: &Path) -> Result<ShaderCache, CacheError> {
    let bytes = std::fs::read(path).map_err(|e| CacheError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let cache = ShaderCache::deserialize(&bytes)?;
    tracing::debug!(path = %path.display(), entries = cache.len(), "loaded shader cache");
    Ok(cache)
}

/// Loads the cache at `path`, falling back to an empty cache.
///
/// A missing file is the normal first-run case and is not reported. Any other
/// failure is logged as a warning; the caller proceeds with an empty cache and
/// overwrites the file on the next save.
pub fn load_cache_or_empty(path: &Path) -> ShaderCache {
    match load_cache(path) {
        Ok(cache) => cache,
        Err(CacheError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            ShaderCache::new()
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "discarding unusable shader cache");
            ShaderCache::new()
        }
    }
}

/// Encodes `cache` and writes it to `path`.
///
/// Parent directories are created as needed. The blob goes to a uniquely
/// named temporary file in the same directory, is synced, and is then renamed
/// over `path`. Concurrent saves each use their own temporary file; the last
/// rename wins. The temporary file is removed on every failure path.
pub fn save_cache(cache: &ShaderCache, path: &Path) -> Result<(), CacheError> {
    let dir = match path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
            dir
        }
        None => Path::new("."),
    };

    let bytes = cache.serialize()?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".kiln-cache")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| io_error(dir, e))?;
    tmp.write_all(&bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| io_error(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| io_error(path, e.error))?;

    tracing::debug!(path = %path.display(), entries = cache.len(), bytes = bytes.len(), "saved shader cache");
    Ok(())
}

fn io_error(path: &Path, source: io::Error) -> CacheError {
    CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}
