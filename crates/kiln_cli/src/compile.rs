//! The `kiln compile` command.

use std::sync::Arc;

use kiln_cache::{load_cache_or_empty, save_cache, ShaderCache};
use kiln_compiler::{CachingCompiler, CompileJob, ProcessCompiler};

use crate::pipeline::{
    build_finder, compile_options, load_project, merged_defines, output_path, stage_for,
};
use crate::{CompileArgs, GlobalArgs};

/// Compiles every input through the cache and writes the artifacts.
///
/// Returns exit code 1 if any file failed; the others are still written and
/// the cache is still saved.
pub fn run(args: &CompileArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let config = &project.config;
    let defines = merged_defines(config, &args.defines)?;

    let mut jobs = Vec::with_capacity(args.files.len());
    for file in &args.files {
        let source = std::fs::read_to_string(file)
            .map_err(|e| format!("cannot read {}: {e}", file.display()))?;
        let stage = stage_for(file, args.stage)?;
        jobs.push(CompileJob {
            source,
            path: file.clone(),
            options: compile_options(config, stage, defines.clone()),
        });
    }

    let cache_file = (config.cache.enabled && !args.no_cache).then(|| project.cache_path());
    let cache = match &cache_file {
        Some(path) => load_cache_or_empty(path),
        None => ShaderCache::new(),
    };

    let compiler = CachingCompiler::new(
        Arc::new(build_finder(&project, &args.include_dirs)),
        Arc::new(cache),
        Arc::new(ProcessCompiler::from_config(&config.compiler)),
    )
    .with_max_include_depth(config.compiler.max_include_depth);

    let multiple = jobs.len() > 1;
    if multiple {
        if let Some(dir) = &args.output {
            std::fs::create_dir_all(dir)?;
        }
    }

    let mut failed = 0usize;
    let mut hits = 0usize;
    for (job, result) in jobs.iter().zip(compiler.compile_many(&jobs)) {
        match result {
            Ok(outcome) => {
                let out = output_path(&job.path, args.output.as_deref(), multiple);
                if let Err(e) = std::fs::write(&out, &outcome.shader.code) {
                    eprintln!("error: cannot write {}: {e}", out.display());
                    failed += 1;
                    continue;
                }
                if outcome.cache_hit {
                    hits += 1;
                }
                if !global.quiet {
                    let status = if outcome.cache_hit { "cached" } else { "compiled" };
                    println!("{status:>9} {} -> {}", job.path.display(), out.display());
                }
            }
            Err(e) => {
                eprintln!("error: {e}");
                failed += 1;
            }
        }
    }

    if let Some(path) = &cache_file {
        save_cache(compiler.cache(), path)?;
    }

    if !global.quiet {
        println!(
            "{} file(s): {} cached, {} compiled, {} failed",
            jobs.len(),
            hits,
            jobs.len() - hits - failed,
            failed
        );
    }
    Ok(if failed > 0 { 1 } else { 0 })
}
