//! Compile, persist, reload and revalidate against files on disk.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use kiln_cache::{load_cache, save_cache, CompileOptions, ContentType, ShaderCache, ShaderStage};
use kiln_compiler::{CachingCompiler, CompileError, CompileRequest, ShaderCompiler};
use kiln_include::{IncludeFinder, OsFileSystem};

/// Backend that returns the preprocessed text and counts invocations.
#[derive(Default)]
struct CountingCompiler {
    calls: AtomicUsize,
}

impl ShaderCompiler for CountingCompiler {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<Vec<u8>, CompileError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(request.source.as_bytes().to_vec())
    }

    fn content_type(&self) -> ContentType {
        ContentType::Glsl
    }
}

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn finder(root: &Path) -> Arc<IncludeFinder> {
    let mut finder = IncludeFinder::with_builtins(Arc::new(OsFileSystem));
    finder.add_search_dir(root.join("include"));
    Arc::new(finder)
}

const MAIN: &str = "\
#version 450
#include \"lighting.glsl\"
#include <kiln/builtin/glsl/utils/common.glsl>
void main() {}
";

fn project() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "shaders/main.frag", MAIN);
    write(
        tmp.path(),
        "shaders/lighting.glsl",
        "#pragma once\n#include <brdf.glsl>\nvec3 shade();\n",
    );
    write(tmp.path(), "include/brdf.glsl", "float brdf();\n");
    tmp
}

#[test]
fn cache_survives_restart_and_revalidates() {
    let tmp = project();
    let root = tmp.path();
    let main_path = root.join("shaders/main.frag");
    let cache_path = root.join(".kiln/shader_cache.bin");
    let options = CompileOptions::new(ShaderStage::Fragment);

    // First run: cold cache.
    let backend = Arc::new(CountingCompiler::default());
    let compiler = CachingCompiler::new(finder(root), Arc::new(ShaderCache::new()), backend.clone());
    let outcome = compiler.compile(MAIN, &main_path, &options).unwrap();
    assert!(!outcome.cache_hit);
    let text = String::from_utf8(outcome.shader.code.clone()).unwrap();
    assert!(text.contains("float brdf();"));
    assert!(text.contains("vec3 shade();"));
    assert!(text.contains("kiln_saturate"));
    assert!(!text.contains("#pragma once"));

    let entry = &compiler.cache().entries()[0];
    let identifiers: Vec<&str> = entry
        .dependencies
        .iter()
        .map(|d| d.identifier.as_str())
        .collect();
    assert_eq!(
        identifiers,
        ["lighting.glsl", "brdf.glsl", "kiln/builtin/glsl/utils/common.glsl"]
    );
    save_cache(compiler.cache(), &cache_path).unwrap();

    // Second run: restored cache, nothing changed.
    let backend = Arc::new(CountingCompiler::default());
    let restored = Arc::new(load_cache(&cache_path).unwrap());
    let compiler = CachingCompiler::new(finder(root), restored, backend.clone());
    let outcome = compiler.compile(MAIN, &main_path, &options).unwrap();
    assert!(outcome.cache_hit);
    assert_eq!(outcome.shader.code, text.as_bytes());
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);

    // Editing a transitive include invalidates the entry.
    write(root, "include/brdf.glsl", "float brdf(vec3 n);\n");
    let outcome = compiler.compile(MAIN, &main_path, &options).unwrap();
    assert!(!outcome.cache_hit);
    assert!(String::from_utf8_lossy(&outcome.shader.code).contains("brdf(vec3 n)"));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    assert_eq!(compiler.cache().len(), 2);
}

#[test]
fn shadowing_include_invalidates() {
    let tmp = project();
    let root = tmp.path();
    let main_path = root.join("shaders/main.frag");
    let options = CompileOptions::new(ShaderStage::Fragment);

    let backend = Arc::new(CountingCompiler::default());
    let compiler = CachingCompiler::new(finder(root), Arc::new(ShaderCache::new()), backend.clone());
    compiler.compile(MAIN, &main_path, &options).unwrap();

    // A file next to the requester now wins for `<brdf.glsl>` only after
    // generators and search paths, so the search-path copy still resolves.
    write(root, "shaders/brdf.glsl", "float other();\n");
    assert!(compiler.compile(MAIN, &main_path, &options).unwrap().cache_hit);

    // Removing the search-path copy makes the requester-relative file win.
    fs::remove_file(root.join("include/brdf.glsl")).unwrap();
    let outcome = compiler.compile(MAIN, &main_path, &options).unwrap();
    assert!(!outcome.cache_hit);
    assert!(String::from_utf8_lossy(&outcome.shader.code).contains("float other();"));
}

#[test]
fn missing_include_reports_location() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let source = "#version 450\n\n#include \"nope.glsl\"\n";
    write(root, "shaders/main.vert", source);

    let compiler = CachingCompiler::new(
        finder(root),
        Arc::new(ShaderCache::new()),
        Arc::new(CountingCompiler::default()),
    );
    let err = compiler
        .compile(
            source,
            &root.join("shaders/main.vert"),
            &CompileOptions::new(ShaderStage::Vertex),
        )
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("main.vert:3: cannot find include 'nope.glsl'"), "{msg}");
}
