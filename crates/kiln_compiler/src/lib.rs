//! Shader compilation through the include finder and the shader cache.
//!
//! [`ShaderCompiler`] is the opaque compile step. [`CachingCompiler`] wraps a
//! backend with cache lookup, preprocessing and cache insertion.

#![warn(missing_docs)]

pub mod caching;
pub mod compiler;
pub mod error;

pub use caching::{CachingCompiler, CompileJob, CompileOutcome};
pub use compiler::{CompileRequest, ProcessCompiler, ShaderCompiler};
pub use error::CompileError;
