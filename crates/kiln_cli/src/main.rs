//! Command-line interface for the kiln shader toolchain.
//!
//! Provides `kiln compile` for cached shader compilation, `kiln preprocess`
//! for include expansion, and `kiln cache` for inspecting and clearing the
//! persisted shader cache.

#![warn(missing_docs)]

mod cache_cmd;
mod compile;
mod pipeline;
mod preprocess;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use kiln_cache::ShaderStage;
use tracing_subscriber::EnvFilter;

/// Shader include resolution and compilation cache.
#[derive(Parser, Debug)]
#[command(name = "kiln", version, about = "Kiln shader toolchain")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `kiln.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile shaders through the cache.
    Compile(CompileArgs),
    /// Expand includes and print the result.
    Preprocess(PreprocessArgs),
    /// Inspect or clear the shader cache.
    #[command(subcommand)]
    Cache(CacheCommand),
}

/// Arguments for the `kiln compile` subcommand.
#[derive(Parser, Debug)]
pub struct CompileArgs {
    /// Shader source files.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Shader stage (default: inferred from the file extension).
    #[arg(short, long)]
    pub stage: Option<ShaderStage>,

    /// Output file, or output directory when compiling several files.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Additional include search directory (searched before configured ones).
    #[arg(short = 'I', long = "include")]
    pub include_dirs: Vec<PathBuf>,

    /// Extra define as `NAME` or `NAME=VALUE`.
    #[arg(short = 'D', long = "define")]
    pub defines: Vec<String>,

    /// Bypass the persisted cache.
    #[arg(long)]
    pub no_cache: bool,
}

/// Arguments for the `kiln preprocess` subcommand.
#[derive(Parser, Debug)]
pub struct PreprocessArgs {
    /// Shader source file.
    pub file: PathBuf,

    /// Additional include search directory (searched before configured ones).
    #[arg(short = 'I', long = "include")]
    pub include_dirs: Vec<PathBuf>,

    /// Extra define as `NAME` or `NAME=VALUE`.
    #[arg(short = 'D', long = "define")]
    pub defines: Vec<String>,
}

/// `kiln cache` subcommands.
#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Print a summary of the cache contents.
    Inspect {
        /// Cache file (default: the configured cache path).
        path: Option<PathBuf>,
    },
    /// Delete the cache file.
    Clear {
        /// Cache file (default: the configured cache path).
        path: Option<PathBuf>,
    },
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };
    init_tracing(&global);

    let result = match cli.command {
        Command::Compile(ref args) => compile::run(args, &global),
        Command::Preprocess(ref args) => preprocess::run(args, &global),
        Command::Cache(ref command) => cache_cmd::run(command, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the stderr log subscriber. `KILN_LOG` overrides the flag-derived level.
fn init_tracing(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_env("KILN_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(global)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn default_log_level(global: &GlobalArgs) -> &'static str {
    if global.quiet {
        "error"
    } else if global.verbose {
        "debug"
    } else {
        "warn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_compile_minimal() {
        let cli = Cli::parse_from(["kiln", "compile", "shaders/main.frag"]);
        match cli.command {
            Command::Compile(ref args) => {
                assert_eq!(args.files, vec![PathBuf::from("shaders/main.frag")]);
                assert!(args.stage.is_none());
                assert!(args.output.is_none());
                assert!(args.include_dirs.is_empty());
                assert!(!args.no_cache);
            }
            _ => panic!("expected Compile command"),
        }
    }

    #[test]
    fn parse_compile_with_args() {
        let cli = Cli::parse_from([
            "kiln",
            "compile",
            "a.glsl",
            "b.glsl",
            "--stage",
            "comp",
            "-o",
            "out",
            "-I",
            "include",
            "-I",
            "third_party",
            "-D",
            "FAST=1",
            "--no-cache",
        ]);
        match cli.command {
            Command::Compile(ref args) => {
                assert_eq!(args.files.len(), 2);
                assert_eq!(args.stage, Some(ShaderStage::Compute));
                assert_eq!(args.output, Some(PathBuf::from("out")));
                assert_eq!(
                    args.include_dirs,
                    vec![PathBuf::from("include"), PathBuf::from("third_party")]
                );
                assert_eq!(args.defines, vec!["FAST=1"]);
                assert!(args.no_cache);
            }
            _ => panic!("expected Compile command"),
        }
    }

    #[test]
    fn parse_compile_requires_files() {
        assert!(Cli::try_parse_from(["kiln", "compile"]).is_err());
    }

    #[test]
    fn parse_compile_rejects_unknown_stage() {
        assert!(Cli::try_parse_from(["kiln", "compile", "a.glsl", "--stage", "pixel"]).is_err());
    }

    #[test]
    fn parse_preprocess() {
        let cli = Cli::parse_from(["kiln", "preprocess", "main.frag", "-I", "inc"]);
        match cli.command {
            Command::Preprocess(ref args) => {
                assert_eq!(args.file, PathBuf::from("main.frag"));
                assert_eq!(args.include_dirs, vec![PathBuf::from("inc")]);
            }
            _ => panic!("expected Preprocess command"),
        }
    }

    #[test]
    fn parse_cache_inspect_default_path() {
        let cli = Cli::parse_from(["kiln", "cache", "inspect"]);
        assert!(matches!(
            cli.command,
            Command::Cache(CacheCommand::Inspect { path: None })
        ));
    }

    #[test]
    fn parse_cache_clear_with_path() {
        let cli = Cli::parse_from(["kiln", "cache", "clear", "build/cache.bin"]);
        match cli.command {
            Command::Cache(CacheCommand::Clear { path }) => {
                assert_eq!(path, Some(PathBuf::from("build/cache.bin")));
            }
            _ => panic!("expected cache clear"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["kiln", "--quiet", "cache", "inspect"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_config_path() {
        let cli = Cli::parse_from(["kiln", "--config", "/path/to/kiln.toml", "cache", "clear"]);
        assert_eq!(cli.config.as_deref(), Some("/path/to/kiln.toml"));
    }

    #[test]
    fn log_level_follows_flags() {
        let mut global = GlobalArgs {
            quiet: false,
            verbose: false,
            config: None,
        };
        assert_eq!(default_log_level(&global), "warn");
        global.verbose = true;
        assert_eq!(default_log_level(&global), "debug");
        global.quiet = true;
        assert_eq!(default_log_level(&global), "error");
    }
}
