//! Error types for shader compilation.

use kiln_include::PreprocessError;

/// Errors that can occur while compiling a shader.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Include expansion failed.
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    /// The compiler program could not be started or talked to.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        /// The program that was run.
        program: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The compiler rejected the shader.
    #[error("{identifier}: compilation failed ({status})\n{diagnostics}")]
    Failed {
        /// The shader identifier.
        identifier: String,
        /// Exit status description.
        status: String,
        /// Compiler diagnostics, usually its stderr.
        diagnostics: String,
    },

    /// The compiler succeeded but produced no output.
    #[error("{identifier}: compiler produced no output")]
    EmptyOutput {
        /// The shader identifier.
        identifier: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn failed_display_includes_diagnostics() {
        let err = CompileError::Failed {
            identifier: "main.frag".to_string(),
            status: "exit status: 1".to_string(),
            diagnostics: "main.frag:3: error: 'x' undeclared".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("main.frag: compilation failed (exit status: 1)"));
        assert!(msg.contains("'x' undeclared"));
    }

    #[test]
    fn preprocess_error_is_transparent() {
        let err: CompileError = PreprocessError::MalformedInclude {
            file: PathBuf::from("a.glsl"),
            line: 2,
        }
        .into();
        assert_eq!(err.to_string(), "a.glsl:2: malformed #include directive");
    }
}
