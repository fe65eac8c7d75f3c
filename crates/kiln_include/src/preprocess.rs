//! `#include` expansion with dependency recording.
//!
//! This is not a full C preprocessor. Only `#include` directives and
//! `#pragma once` are interpreted; every other line, including conditional
//! directives and include guards, is copied through for the shader compiler
//! to handle.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::dependency::PreprocessingDependency;
use crate::error::PreprocessError;
use crate::finder::IncludeFinder;

/// Default limit on include nesting.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 64;

/// Options controlling expansion.
#[derive(Debug, Clone)]
pub struct PreprocessOptions {
    /// `(name, value)` pairs emitted as `#define` lines after `#version`.
    pub extra_defines: Vec<(String, String)>,
    /// Maximum include nesting depth.
    pub max_include_depth: usize,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            extra_defines: Vec::new(),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }
}

/// Result of expanding a source file.
#[derive(Debug, Clone)]
pub struct PreprocessOutput {
    /// The expanded source text.
    pub code: String,
    /// Every include resolution, in the order it happened.
    pub dependencies: Vec<PreprocessingDependency>,
}

/// Expands `#include` directives through an [`IncludeFinder`].
pub struct Preprocessor<'a> {
    finder: &'a IncludeFinder,
    options: &'a PreprocessOptions,
}

struct Expansion {
    code: String,
    dependencies: Vec<PreprocessingDependency>,
    /// Files currently being expanded, outermost first.
    stack: Vec<PathBuf>,
    /// Files marked `#pragma once` that were already expanded.
    once: HashSet<PathBuf>,
}

struct IncludeDirective<'s> {
    identifier: &'s str,
    standard: bool,
}

impl<'a> Preprocessor<'a> {
    /// Creates a preprocessor.
    pub fn new(finder: &'a IncludeFinder, options: &'a PreprocessOptions) -> Self {
        Self { finder, options }
    }

    /// Expands `source`, which was read from `source_path`.
    ///
    /// Relative includes in the main file resolve against the parent of
    /// `source_path`.
    pub fn preprocess(
        &self,
        source: &str,
        source_path: &Path,
    ) -> Result<PreprocessOutput, PreprocessError> {
        let main_path = self.finder.resolved_path(source_path);
        let mut expansion = Expansion {
            code: String::with_capacity(source.len()),
            dependencies: Vec::new(),
            stack: vec![main_path.clone()],
            once: HashSet::new(),
        };
        if has_pragma_once(source) {
            expansion.once.insert(main_path);
        }

        let dir = parent_dir(source_path);
        self.expand(source, source_path, &dir, 0, &mut expansion)?;

        let code = inject_defines(&expansion.code, &self.options.extra_defines);
        tracing::debug!(
            source = %source_path.display(),
            dependencies = expansion.dependencies.len(),
            "preprocessed shader"
        );
        Ok(PreprocessOutput {
            code,
            dependencies: expansion.dependencies,
        })
    }

    fn expand(
        &self,
        text: &str,
        file: &Path,
        dir: &Path,
        depth: usize,
        expansion: &mut Expansion,
    ) -> Result<(), PreprocessError> {
        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let directive = match parse_include(line) {
                None => {
                    if !is_pragma_once(line) {
                        expansion.code.push_str(line);
                        expansion.code.push('\n');
                    }
                    continue;
                }
                Some(None) => {
                    return Err(PreprocessError::MalformedInclude {
                        file: file.to_path_buf(),
                        line: line_no,
                    })
                }
                Some(Some(directive)) => directive,
            };

            let identifier = directive.identifier;
            let found = if directive.standard {
                self.finder.get_include_standard(dir, identifier)
            } else {
                self.finder.get_include_relative(dir, identifier)
            };
            if !found.is_found() {
                return Err(PreprocessError::IncludeNotFound {
                    identifier: identifier.to_string(),
                    file: file.to_path_buf(),
                    line: line_no,
                });
            }

            expansion.dependencies.push(PreprocessingDependency::record(
                identifier,
                dir,
                directive.standard,
                &found,
            ));

            let resolved = found.resolved_path().to_path_buf();
            if expansion.stack.contains(&resolved) {
                return Err(PreprocessError::RecursiveInclude {
                    identifier: identifier.to_string(),
                    file: file.to_path_buf(),
                    line: line_no,
                });
            }
            if expansion.once.contains(&resolved) {
                continue;
            }
            if depth + 1 > self.options.max_include_depth {
                return Err(PreprocessError::IncludeDepthExceeded {
                    identifier: identifier.to_string(),
                    file: file.to_path_buf(),
                    line: line_no,
                    limit: self.options.max_include_depth,
                });
            }
            if has_pragma_once(found.contents()) {
                expansion.once.insert(resolved.clone());
            }

            let child_dir = parent_dir(&resolved);
            expansion.stack.push(resolved.clone());
            self.expand(found.contents(), &resolved, &child_dir, depth + 1, expansion)?;
            expansion.stack.pop();
        }
        Ok(())
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

/// Strips the leading `#` and any whitespace after it.
fn directive_body(line: &str) -> Option<&str> {
    Some(line.trim_start().strip_prefix('#')?.trim_start())
}

/// `None`: not an include directive. `Some(None)`: an include directive
/// with a malformed operand.
fn parse_include(line: &str) -> Option<Option<IncludeDirective<'_>>> {
    let rest = directive_body(line)?.strip_prefix("include")?;
    if !rest.is_empty() && !rest.starts_with(|c: char| c.is_whitespace() || c == '<' || c == '"')
    {
        // `#include_next` and friends
        return None;
    }

    let rest = rest.trim_start();
    let (standard, close) = match rest.chars().next() {
        Some('<') => (true, '>'),
        Some('"') => (false, '"'),
        _ => return Some(None),
    };
    let operand = &rest[1..];
    let directive = operand
        .find(close)
        .map(|end| &operand[..end])
        .filter(|identifier| !identifier.is_empty())
        .map(|identifier| IncludeDirective {
            identifier,
            standard,
        });
    Some(directive)
}

fn is_pragma_once(line: &str) -> bool {
    directive_body(line)
        .and_then(|body| body.strip_prefix("pragma"))
        .is_some_and(|rest| rest.trim() == "once")
}

fn has_pragma_once(text: &str) -> bool {
    text.lines().any(is_pragma_once)
}

/// Inserts `#define` lines after the `#version` line, or at the top.
fn inject_defines(code: &str, defines: &[(String, String)]) -> String {
    if defines.is_empty() {
        return code.to_string();
    }

    let mut block = String::new();
    for (name, value) in defines {
        if value.is_empty() {
            block.push_str(&format!("#define {name}\n"));
        } else {
            block.push_str(&format!("#define {name} {value}\n"));
        }
    }

    let version_end = code
        .lines()
        .scan(0usize, |offset, line| {
            let start = *offset;
            *offset += line.len() + 1;
            Some((start, line))
        })
        .find(|(_, line)| {
            directive_body(line).is_some_and(|body| body.starts_with("version"))
        })
        .map(|(start, line)| (start + line.len() + 1).min(code.len()));

    let mut out = String::with_capacity(code.len() + block.len());
    match version_end {
        Some(at) => {
            out.push_str(&code[..at]);
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&block);
            out.push_str(&code[at..]);
        }
        None => {
            out.push_str(&block);
            out.push_str(code);
        }
    }
    out
}
