//! Shared foundational types used across the kiln shader toolchain.
//!
//! This crate provides the content digest used for include and cache
//! validation, and the common internal result type.

#![warn(missing_docs)]

pub mod hash;
pub mod result;

pub use hash::{ContentHash, ParseHashError};
pub use result::{InternalError, KilnResult};
