//! Compiled shader cache keyed by source and options, validated against the
//! include dependencies recorded at compile time.
//!
//! A cached artifact is only served when every include it was built from still
//! resolves to identical text. The cache can be written to a single binary
//! blob and restored from it.

#![warn(missing_docs)]

pub mod cache;
pub mod entry;
pub mod error;
pub mod persist;
pub mod serialize;

pub use cache::ShaderCache;
pub use entry::{
    CacheEntry, CacheKey, CompileOptions, CompiledShader, ContentType, ShaderStage, UnknownStage,
};
pub use error::{CacheError, DecodeError};
pub use persist::{load_cache, load_cache_or_empty, save_cache};
