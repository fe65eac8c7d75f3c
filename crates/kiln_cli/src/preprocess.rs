//! The `kiln preprocess` command.

use kiln_include::{PreprocessOptions, Preprocessor};

use crate::pipeline::{build_finder, load_project, merged_defines};
use crate::{GlobalArgs, PreprocessArgs};

/// Prints the expanded source to stdout and the dependency list to stderr.
pub fn run(args: &PreprocessArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let finder = build_finder(&project, &args.include_dirs);
    let options = PreprocessOptions {
        extra_defines: merged_defines(&project.config, &args.defines)?,
        max_include_depth: project.config.compiler.max_include_depth,
    };

    let source = std::fs::read_to_string(&args.file)
        .map_err(|e| format!("cannot read {}: {e}", args.file.display()))?;
    let output = Preprocessor::new(&finder, &options).preprocess(&source, &args.file)?;

    print!("{}", output.code);
    if !global.quiet {
        eprintln!("{} dependencies:", output.dependencies.len());
        for dep in &output.dependencies {
            let (open, close) = if dep.standard_include { ('<', '>') } else { ('"', '"') };
            eprintln!(
                "  {open}{}{close} from {} [{}]",
                dep.identifier,
                dep.requesting_source_dir.display(),
                dep.hash
            );
        }
    }
    Ok(0)
}
