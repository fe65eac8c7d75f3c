//! The `kiln cache` commands.

use std::io;
use std::path::PathBuf;

use kiln_cache::load_cache;

use crate::pipeline::load_project;
use crate::{CacheCommand, GlobalArgs};

/// Dispatches a `kiln cache` subcommand.
pub fn run(command: &CacheCommand, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    match command {
        CacheCommand::Inspect { path } => inspect(resolve_path(path, global)?, global),
        CacheCommand::Clear { path } => clear(resolve_path(path, global)?, global),
    }
}

fn resolve_path(
    explicit: &Option<PathBuf>,
    global: &GlobalArgs,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match explicit {
        Some(path) => Ok(path.clone()),
        None => Ok(load_project(global)?.cache_path()),
    }
}

fn inspect(path: PathBuf, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let cache = load_cache(&path)?;
    println!(
        "{}: {} entries in {} buckets",
        path.display(),
        cache.len(),
        cache.bucket_count()
    );
    if global.quiet {
        return Ok(0);
    }
    for (index, entry) in cache.entries().iter().enumerate() {
        let shader = &entry.value;
        println!(
            "  [{index}] {:<5} {:<6} {:>8} bytes  {} deps  {}",
            shader.stage.to_string(),
            shader.content_type.to_string(),
            shader.code.len(),
            entry.dependencies.len(),
            shader.filepath_hint
        );
        if global.verbose {
            for dep in &entry.dependencies {
                println!("        {} {}", dep.hash, dep.identifier);
            }
        }
    }
    Ok(0)
}

fn clear(path: PathBuf, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    match std::fs::remove_file(&path) {
        Ok(()) => {
            if !global.quiet {
                println!("removed {}", path.display());
            }
            Ok(0)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if !global.quiet {
                println!("no cache at {}", path.display());
            }
            Ok(0)
        }
        Err(e) => Err(format!("cannot remove {}: {e}", path.display()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_cache::{save_cache, ShaderCache};

    fn quiet() -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            config: None,
        }
    }

    #[test]
    fn clear_removes_file_and_tolerates_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cache.bin");
        save_cache(&ShaderCache::new(), &path).unwrap();

        assert_eq!(clear(path.clone(), &quiet()).unwrap(), 0);
        assert!(!path.exists());
        assert_eq!(clear(path, &quiet()).unwrap(), 0);
    }

    #[test]
    fn inspect_reports_decode_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cache.bin");
        std::fs::write(&path, b"garbage").unwrap();
        let err = inspect(path, &quiet()).unwrap_err();
        assert!(err.to_string().contains("failed to decode shader cache"));
    }

    #[test]
    fn inspect_empty_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cache.bin");
        save_cache(&ShaderCache::new(), &path).unwrap();
        assert_eq!(inspect(path, &quiet()).unwrap(), 0);
    }
}
