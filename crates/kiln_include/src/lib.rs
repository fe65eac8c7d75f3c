//! Include resolution for shader sources.
//!
//! Resolves `#include` identifiers through a priority-ordered list of
//! [`IncludeLoader`]s and a prefix-sorted list of procedural
//! [`IncludeGenerator`]s, orchestrated by the [`IncludeFinder`]. The
//! [`Preprocessor`] expands includes in a source file and records every
//! resolution as a [`PreprocessingDependency`] so a compilation cache can
//! revalidate it later.

#![warn(missing_docs)]

pub mod builtin;
pub mod dependency;
pub mod error;
pub mod finder;
pub mod fs;
pub mod generator;
pub mod loader;
pub mod preprocess;

pub use builtin::{builtin_generators, EmbeddedIncludeGenerator, VirtualTexturingIncludeGenerator};
pub use dependency::PreprocessingDependency;
pub use error::PreprocessError;
pub use finder::{GeneratorEntry, IncludeFinder, SearchPathEntry};
pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use generator::{parse_arguments_from_path, BuiltinMapping, IncludeGenerator};
pub use loader::{FileSystemIncludeLoader, FoundInclude, IncludeLoader, RawInclude};
pub use preprocess::{
    PreprocessOptions, PreprocessOutput, Preprocessor, DEFAULT_MAX_INCLUDE_DEPTH,
};
