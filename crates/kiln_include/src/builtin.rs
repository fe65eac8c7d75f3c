//! Builtin include generators shipped with kiln.
//!
//! Two generators are registered by
//! [`IncludeFinder::ensure_builtins_registered`](crate::IncludeFinder::ensure_builtins_registered):
//!
//! * [`EmbeddedIncludeGenerator`] serves fixed headers compiled into the
//!   binary under `kiln/builtin/glsl/`.
//! * [`VirtualTexturingIncludeGenerator`] synthesizes virtual texturing
//!   headers whose bindings and sizes are encoded in the include path.
//!
//! The builtin set is created once per process and shared by every finder.

use std::sync::{Arc, OnceLock};

use crate::generator::{parse_arguments_from_path, BuiltinMapping, IncludeGenerator};

/// Prefix of the embedded builtin headers.
pub const BUILTIN_GLSL_PREFIX: &str = "kiln/builtin/glsl";

/// Prefix owned by the virtual texturing generator.
pub const VIRTUAL_TEXTURING_PREFIX: &str = "kiln/builtin/glsl/virtual_texturing";

const COMMON_GLSL: &str = "\
#ifndef _KILN_BUILTIN_UTILS_COMMON_INCLUDED_
#define _KILN_BUILTIN_UTILS_COMMON_INCLUDED_

float kiln_saturate(float x) { return clamp(x, 0.0, 1.0); }
vec3 kiln_saturate(vec3 x) { return clamp(x, vec3(0.0), vec3(1.0)); }
float kiln_luma(vec3 rgb) { return dot(rgb, vec3(0.2126, 0.7152, 0.0722)); }

#endif
";

const CONSTANTS_GLSL: &str = "\
#ifndef _KILN_BUILTIN_UTILS_CONSTANTS_INCLUDED_
#define _KILN_BUILTIN_UTILS_CONSTANTS_INCLUDED_

#define KILN_PI 3.14159265358979323846
#define KILN_TWO_PI 6.28318530717958647693
#define KILN_FLT_EPSILON 1.19209290e-07

#endif
";

const EMBEDDED_HEADERS: &[(&str, &str)] = &[
    ("utils/common.glsl", COMMON_GLSL),
    ("utils/constants.glsl", CONSTANTS_GLSL),
];

/// Serves a fixed table of header texts under a prefix.
pub struct EmbeddedIncludeGenerator {
    prefix: String,
    mappings: Vec<BuiltinMapping>,
}

impl EmbeddedIncludeGenerator {
    /// Creates a generator serving `headers` (relative path, text) under `prefix`.
    pub fn new(prefix: &str, headers: &[(&str, &str)]) -> Self {
        let prefix = prefix.trim_end_matches('/').to_string();
        let mappings = headers
            .iter()
            .map(|(relative, text)| {
                let text = text.to_string();
                let pattern = regex::escape(&format!("{prefix}/{relative}"));
                BuiltinMapping::new(&pattern, move |_| text.clone())
                    .expect("escaped literal is a valid pattern")
            })
            .collect();
        Self { prefix, mappings }
    }

    /// The headers kiln ships under [`BUILTIN_GLSL_PREFIX`].
    pub fn builtin() -> Self {
        Self::new(BUILTIN_GLSL_PREFIX, EMBEDDED_HEADERS)
    }
}

impl IncludeGenerator for EmbeddedIncludeGenerator {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn builtin_mappings(&self) -> &[BuiltinMapping] {
        &self.mappings
    }
}

/// Synthesizes virtual texturing headers from path-encoded parameters.
///
/// * `descriptors.glsl/<set>/<page_table_binding>/<physical_tiles_binding>`
///   declares the page table and physical tile array bindings.
/// * `extensions.glsl/<page_table_size>/<tile_size>` defines the size
///   constants; `tile_size` must be a power of two.
pub struct VirtualTexturingIncludeGenerator {
    mappings: Vec<BuiltinMapping>,
}

impl VirtualTexturingIncludeGenerator {
    /// Creates the generator.
    pub fn new() -> Self {
        let prefix = regex::escape(VIRTUAL_TEXTURING_PREFIX);
        let mappings = vec![
            BuiltinMapping::new(
                &format!(r"{prefix}/descriptors\.glsl/[0-9]+/[0-9]+/[0-9]+"),
                descriptors_header,
            )
            .expect("descriptor pattern is valid"),
            BuiltinMapping::new(
                &format!(r"{prefix}/extensions\.glsl/[0-9]+/[0-9]+"),
                extensions_header,
            )
            .expect("extensions pattern is valid"),
        ];
        Self { mappings }
    }
}

impl Default for VirtualTexturingIncludeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IncludeGenerator for VirtualTexturingIncludeGenerator {
    fn prefix(&self) -> &str {
        VIRTUAL_TEXTURING_PREFIX
    }

    fn builtin_mappings(&self) -> &[BuiltinMapping] {
        &self.mappings
    }
}

/// Parses the numeric segments that follow `file` in a virtual texturing path.
fn numeric_args(include_name: &str, file: &str) -> Option<Vec<u32>> {
    let rest = include_name
        .strip_prefix(VIRTUAL_TEXTURING_PREFIX)?
        .strip_prefix('/')?;
    let args = parse_arguments_from_path(rest);
    let (head, tail) = args.split_first()?;
    if head != file {
        return None;
    }
    tail.iter().map(|a| a.parse().ok()).collect()
}

fn descriptors_header(include_name: &str) -> String {
    let Some(args) = numeric_args(include_name, "descriptors.glsl") else {
        return String::new();
    };
    let [set, page_table, physical_tiles] = args[..] else {
        return String::new();
    };
    if page_table == physical_tiles {
        return String::new();
    }
    format!(
        "#ifndef _KILN_VIRTUAL_TEXTURING_DESCRIPTORS_INCLUDED_
#define _KILN_VIRTUAL_TEXTURING_DESCRIPTORS_INCLUDED_
layout(set = {set}, binding = {page_table}) uniform usampler2DArray kiln_vt_page_table;
layout(set = {set}, binding = {physical_tiles}) uniform sampler2DArray kiln_vt_physical_tiles;
#endif
"
    )
}

fn extensions_header(include_name: &str) -> String {
    let Some(args) = numeric_args(include_name, "extensions.glsl") else {
        return String::new();
    };
    let [page_table_size, tile_size] = args[..] else {
        return String::new();
    };
    if page_table_size == 0 || !tile_size.is_power_of_two() {
        return String::new();
    }
    format!(
        "#ifndef _KILN_VIRTUAL_TEXTURING_EXTENSIONS_INCLUDED_
#define _KILN_VIRTUAL_TEXTURING_EXTENSIONS_INCLUDED_
#define KILN_VT_PAGE_TABLE_SIZE {page_table_size}
#define KILN_VT_TILE_SIZE {tile_size}
#define KILN_VT_TILE_SIZE_LOG2 {}
#endif
",
        tile_size.trailing_zeros()
    )
}

static BUILTIN_GENERATORS: OnceLock<Vec<Arc<dyn IncludeGenerator>>> = OnceLock::new();

/// The process-wide builtin generator set, created on first use.
pub fn builtin_generators() -> &'static [Arc<dyn IncludeGenerator>] {
    BUILTIN_GENERATORS.get_or_init(|| {
        vec![
            Arc::new(EmbeddedIncludeGenerator::builtin()) as Arc<dyn IncludeGenerator>,
            Arc::new(VirtualTexturingIncludeGenerator::new()),
        ]
    })
}
