//! The compile step and its external-process implementation.

use std::io::Write;
use std::process::{Command, Stdio};

use kiln_cache::{CompileOptions, ContentType};
use kiln_config::CompilerConfig;

use crate::error::CompileError;

/// Input to a single compile.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    /// Fully preprocessed source text.
    pub source: &'a str,
    /// Identifier of the main source, used in diagnostics.
    pub identifier: &'a str,
    /// Resolved compile options.
    pub options: &'a CompileOptions,
}

/// Turns preprocessed shader source into an artifact.
pub trait ShaderCompiler: Send + Sync {
    /// Compiles `request` and returns the artifact bytes.
    fn compile(&self, request: &CompileRequest<'_>) -> Result<Vec<u8>, CompileError>;

    /// Format of the bytes returned by [`ShaderCompiler::compile`].
    fn content_type(&self) -> ContentType;
}

/// Runs an external compiler such as `glslc`.
///
/// The preprocessed source is written to the program's stdin and the artifact
/// is read from its stdout. Arguments may contain `{stage}`, `{target}` and
/// `{identifier}` placeholders.
#[derive(Debug, Clone)]
pub struct ProcessCompiler {
    program: String,
    args: Vec<String>,
    debug_args: Vec<String>,
    optimize_args: Vec<String>,
    content_type: ContentType,
}

impl ProcessCompiler {
    /// Creates a compiler running `program` with argument templates `args`.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            debug_args: Vec::new(),
            optimize_args: Vec::new(),
            content_type: ContentType::Spirv,
        }
    }

    /// Creates a compiler from the `[compiler]` configuration table.
    pub fn from_config(config: &CompilerConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            debug_args: config.debug_args.clone(),
            optimize_args: config.optimize_args.clone(),
            content_type: ContentType::Spirv,
        }
    }

    /// Sets the arguments appended when debug info or optimization is requested.
    pub fn with_flag_args(mut self, debug_args: Vec<String>, optimize_args: Vec<String>) -> Self {
        self.debug_args = debug_args;
        self.optimize_args = optimize_args;
        self
    }

    /// Sets the content type of the program's output.
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// The program name.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The final argument list for `request`.
    pub fn command_args(&self, request: &CompileRequest<'_>) -> Vec<String> {
        let options = request.options;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                arg.replace("{stage}", options.stage.short_name())
                    .replace("{target}", &options.target_env)
                    .replace("{identifier}", request.identifier)
            })
            .collect();
        if options.debug_info {
            args.extend(self.debug_args.iter().cloned());
        }
        if options.optimize {
            args.extend(self.optimize_args.iter().cloned());
        }
        args
    }
}

impl ShaderCompiler for ProcessCompiler {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<Vec<u8>, CompileError> {
        let spawn_error = |source| CompileError::Spawn {
            program: self.program.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(self.command_args(request))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        // Feed stdin from a separate thread so a chatty compiler cannot fill
        // its stdout pipe while we are still writing.
        let stdin = child.stdin.take();
        let output = std::thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(request.source.as_bytes()),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            let written = writer.join().unwrap_or(Ok(()));
            output.and_then(|output| {
                // A compiler that exits early may close stdin; its exit status
                // is the more useful error then.
                match written {
                    Err(e) if output.status.success() => Err(e),
                    _ => Ok(output),
                }
            })
        })
        .map_err(spawn_error)?;

        if !output.status.success() {
            return Err(CompileError::Failed {
                identifier: request.identifier.to_string(),
                status: output.status.to_string(),
                diagnostics: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            });
        }
        if output.stdout.is_empty() {
            return Err(CompileError::EmptyOutput {
                identifier: request.identifier.to_string(),
            });
        }

        tracing::debug!(
            program = %self.program,
            identifier = request.identifier,
            bytes = output.stdout.len(),
            "external compiler finished"
        );
        Ok(output.stdout)
    }

    fn content_type(&self) -> ContentType {
        self.content_type
    }
}
