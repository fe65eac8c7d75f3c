//! Read-only filesystem boundary used by include loaders.
//!
//! Loaders never touch `std::fs` directly. [`OsFileSystem`] is the host
//! implementation; [`MemoryFileSystem`] keeps files in memory for embedders
//! that ship shader sources inside an archive, and for tests.

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use parking_lot::RwLock;

/// Read-only access to shader sources.
pub trait FileSystem: Send + Sync {
    /// Reads the full contents of the file at `path`.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Returns the canonical form of `path` if it exists, `None` otherwise.
    fn canonicalize(&self, path: &Path) -> Option<PathBuf>;
}

/// The host operating system's filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn canonicalize(&self, path: &Path) -> Option<PathBuf> {
        std::fs::canonicalize(path).ok()
    }
}

/// An in-memory filesystem keyed by lexically normalized paths.
///
/// Files may be replaced or removed while a finder holds the filesystem,
/// which is how tests simulate an include being edited on disk.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RwLock<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryFileSystem {
    /// Creates an empty in-memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file.
    pub fn insert(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        self.files
            .write()
            .insert(normalize(path.as_ref()), contents.into());
    }

    /// Removes a file, returning `true` if it existed.
    pub fn remove(&self, path: impl AsRef<Path>) -> bool {
        self.files.write().remove(&normalize(path.as_ref())).is_some()
    }

    /// Returns the number of stored files.
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    /// Returns `true` if no files are stored.
    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl FileSystem for MemoryFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .read()
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} not found", path.display()),
                )
            })
    }

    fn canonicalize(&self, path: &Path) -> Option<PathBuf> {
        let normalized = normalize(path);
        self.files
            .read()
            .contains_key(&normalized)
            .then_some(normalized)
    }
}

/// Resolves `.` and `..` components without consulting the disk.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}
