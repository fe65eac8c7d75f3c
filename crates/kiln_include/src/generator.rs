//! Procedural include generators.
//!
//! A generator owns a path prefix (for example
//! `kiln/builtin/glsl/virtual_texturing`) and an ordered list of
//! pattern → producer mappings. Producers usually decode parameters that are
//! encoded as trailing path segments of the identifier, such as
//! `descriptors.glsl/0/1/2`.

use std::fmt;

use regex::Regex;

use crate::loader::RawInclude;

/// Produces include text for an identifier matched by a [`BuiltinMapping`].
///
/// An empty result means the producer declined (malformed arguments, for
/// example) and the next mapping is tried.
pub type ContentProducer = Box<dyn Fn(&str) -> String + Send + Sync>;

/// A pattern matched against the whole include identifier, paired with the
/// producer that generates its text.
pub struct BuiltinMapping {
    pattern: Regex,
    producer: ContentProducer,
}

impl BuiltinMapping {
    /// Creates a mapping. `pattern` must match the entire identifier.
    pub fn new(
        pattern: &str,
        producer: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(&format!("^(?:{pattern})$"))?,
            producer: Box::new(producer),
        })
    }

    /// Returns `true` if the pattern matches all of `include_name`.
    pub fn matches(&self, include_name: &str) -> bool {
        self.pattern.is_match(include_name)
    }

    /// Runs the producer.
    pub fn produce(&self, include_name: &str) -> String {
        (self.producer)(include_name)
    }
}

impl fmt::Debug for BuiltinMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinMapping")
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

/// A procedural include provider registered with an
/// [`IncludeFinder`](crate::IncludeFinder) under a path prefix.
pub trait IncludeGenerator: Send + Sync {
    /// The path namespace this generator owns.
    fn prefix(&self) -> &str;

    /// Ordered pattern → producer mappings.
    fn builtin_mappings(&self) -> &[BuiltinMapping];

    /// Tries each mapping in order and returns the first non-empty result.
    fn get_include(&self, include_name: &str) -> Option<RawInclude> {
        for mapping in self.builtin_mappings() {
            if !mapping.matches(include_name) {
                continue;
            }
            let contents = mapping.produce(include_name);
            if !contents.is_empty() {
                tracing::debug!(
                    prefix = self.prefix(),
                    include = include_name,
                    "include generator matched"
                );
                return Some(RawInclude::new(include_name, contents));
            }
        }
        None
    }
}

/// Splits a path on `/` into its segments, in order.
///
/// Empty segments between separators are kept; a trailing separator does not
/// produce a trailing empty segment.
pub fn parse_arguments_from_path(path: &str) -> Vec<String> {
    let mut args: Vec<String> = path.split('/').map(str::to_string).collect();
    if args.last().is_some_and(String::is_empty) {
        args.pop();
    }
    args
}
