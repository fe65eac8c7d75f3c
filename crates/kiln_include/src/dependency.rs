//! Recorded include resolutions.

use std::path::{Path, PathBuf};

use kiln_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::finder::IncludeFinder;
use crate::loader::FoundInclude;

/// One include resolution performed while preprocessing a shader.
///
/// Records how and where the include was requested, so it can be resolved
/// again later and compared without rerunning the preprocessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreprocessingDependency {
    /// The identifier between the delimiters of the directive.
    pub identifier: String,
    /// Directory of the file containing the directive.
    pub requesting_source_dir: PathBuf,
    /// `true` for `#include <...>`, `false` for `#include "..."`.
    pub standard_include: bool,
    /// Digest of `contents` at resolution time.
    pub hash: ContentHash,
    /// The resolved text.
    pub contents: String,
}

impl PreprocessingDependency {
    /// Records a resolution result.
    pub fn record(
        identifier: &str,
        requesting_source_dir: &Path,
        standard_include: bool,
        found: &FoundInclude,
    ) -> Self {
        Self {
            identifier: identifier.to_string(),
            requesting_source_dir: requesting_source_dir.to_path_buf(),
            standard_include,
            hash: found.hash(),
            contents: found.contents().to_string(),
        }
    }

    /// Resolves the include again the same way it was originally resolved.
    pub fn resolve(&self, finder: &IncludeFinder) -> FoundInclude {
        if self.standard_include {
            finder.get_include_standard(&self.requesting_source_dir, &self.identifier)
        } else {
            finder.get_include_relative(&self.requesting_source_dir, &self.identifier)
        }
    }

    /// Returns `true` if re-resolving yields the same hash and the same text.
    ///
    /// Both are compared; the contents comparison is the authoritative one.
    pub fn is_unchanged(&self, finder: &IncludeFinder) -> bool {
        let current = self.resolve(finder);
        current.hash() == self.hash && current.contents() == self.contents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use std::sync::Arc;

    #[test]
    fn unchanged_until_file_edited() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.insert("shaders/foo.glsl", "float foo;");
        let finder = IncludeFinder::new(fs.clone());

        let found = finder.get_include_relative(Path::new("shaders"), "foo.glsl");
        let dep = PreprocessingDependency::record("foo.glsl", Path::new("shaders"), false, &found);
        assert!(dep.is_unchanged(&finder));

        fs.insert("shaders/foo.glsl", "float bar;");
        assert!(!dep.is_unchanged(&finder));
    }

    #[test]
    fn resolve_uses_recorded_kind() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.insert("shaders/x.glsl", "// local");
        fs.insert("include/x.glsl", "// search");
        let mut finder = IncludeFinder::new(fs);
        finder.add_search_dir("include");

        let mut dep = PreprocessingDependency {
            identifier: "x.glsl".into(),
            requesting_source_dir: "shaders".into(),
            standard_include: false,
            hash: ContentHash::empty(),
            contents: String::new(),
        };
        assert_eq!(dep.resolve(&finder).contents(), "// local");
        dep.standard_include = true;
        assert_eq!(dep.resolve(&finder).contents(), "// search");
    }

    #[test]
    fn serde_uses_camel_case() {
        let dep = PreprocessingDependency {
            identifier: "a.glsl".into(),
            requesting_source_dir: "dir".into(),
            standard_include: true,
            hash: ContentHash::from_bytes(b"x"),
            contents: "x".into(),
        };
        let json = serde_json::to_string(&dep).unwrap();
        assert!(json.contains("\"requestingSourceDir\":\"dir\""));
        assert!(json.contains("\"standardInclude\":true"));
        let back: PreprocessingDependency = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dep);
    }
}
