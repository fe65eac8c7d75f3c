//! Error types for include expansion.

use std::path::PathBuf;

/// Errors that stop the preprocessor.
///
/// Failing to resolve an include is a normal miss inside the finder; it only
/// becomes an error here, where the source cannot be expanded without it.
#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    /// No loader, generator or search path resolved the include.
    #[error("{file}:{line}: cannot find include '{identifier}'")]
    IncludeNotFound {
        /// The identifier that failed to resolve.
        identifier: String,
        /// The file containing the directive.
        file: PathBuf,
        /// 1-based line of the directive.
        line: usize,
    },

    /// The include resolved to a file that is already being expanded.
    #[error("{file}:{line}: '{identifier}' is recursively included")]
    RecursiveInclude {
        /// The identifier that closed the cycle.
        identifier: String,
        /// The file containing the directive.
        file: PathBuf,
        /// 1-based line of the directive.
        line: usize,
    },

    /// Include nesting exceeded the configured limit.
    #[error("{file}:{line}: include depth limit of {limit} exceeded by '{identifier}'")]
    IncludeDepthExceeded {
        /// The identifier that exceeded the limit.
        identifier: String,
        /// The file containing the directive.
        file: PathBuf,
        /// 1-based line of the directive.
        line: usize,
        /// The configured limit.
        limit: usize,
    },

    /// An `#include` directive without a `<...>` or `"..."` operand.
    #[error("{file}:{line}: malformed #include directive")]
    MalformedInclude {
        /// The file containing the directive.
        file: PathBuf,
        /// 1-based line of the directive.
        line: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_not_found_display() {
        let err = PreprocessError::IncludeNotFound {
            identifier: "lights.glsl".to_string(),
            file: PathBuf::from("shaders/main.frag"),
            line: 12,
        };
        assert_eq!(
            err.to_string(),
            "shaders/main.frag:12: cannot find include 'lights.glsl'"
        );
    }

    #[test]
    fn depth_exceeded_display() {
        let err = PreprocessError::IncludeDepthExceeded {
            identifier: "deep.glsl".to_string(),
            file: PathBuf::from("a.glsl"),
            line: 1,
            limit: 64,
        };
        assert!(err.to_string().contains("limit of 64"));
    }

    #[test]
    fn malformed_display() {
        let err = PreprocessError::MalformedInclude {
            file: PathBuf::from("a.glsl"),
            line: 3,
        };
        assert_eq!(err.to_string(), "a.glsl:3: malformed #include directive");
    }
}
