//! Binary form of a [`ShaderCache`].
//!
//! Layout:
//!
//! ```text
//! [ L: u64 little-endian ][ L bytes of UTF-8 JSON metadata ][ code region ]
//! ```
//!
//! The metadata is `{"entries": [...], "shaderCreationParams": [...]}`; both
//! arrays have one element per entry, in insertion order. Entries hold the key
//! and dependencies. Params hold the artifact fields and the `offset` and
//! `codeByteSize` of the entry's code within the code region. Code ranges are
//! laid out in entry order without overlap.

use kiln_common::{InternalError, KilnResult};
use kiln_include::PreprocessingDependency;
use serde::{Deserialize, Serialize};

use crate::cache::ShaderCache;
use crate::entry::{CacheEntry, CacheKey, CompiledShader, ContentType, ShaderStage};
use crate::error::DecodeError;

/// Size of the metadata length prefix.
const PREFIX_LEN: usize = 8;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MetadataRef<'a> {
    entries: Vec<EntryRef<'a>>,
    shader_creation_params: Vec<ShaderCreationParams>,
}

#[derive(Serialize)]
struct EntryRef<'a> {
    key: &'a CacheKey,
    dependencies: &'a [PreprocessingDependency],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    entries: Vec<EntryRecord>,
    shader_creation_params: Vec<ShaderCreationParams>,
}

#[derive(Deserialize)]
struct EntryRecord {
    key: CacheKey,
    dependencies: Vec<PreprocessingDependency>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShaderCreationParams {
    stage: ShaderStage,
    content_type: ContentType,
    filepath_hint: String,
    offset: u64,
    code_byte_size: u64,
}

impl ShaderCache {
    /// Encodes the cache into its binary form.
    pub fn serialize(&self) -> KilnResult<Vec<u8>> {
        let entries = self.entries();

        let mut offset = 0u64;
        let mut params = Vec::with_capacity(entries.len());
        for entry in &entries {
            let size = entry.value.code.len() as u64;
            params.push(ShaderCreationParams {
                stage: entry.value.stage,
                content_type: entry.value.content_type,
                filepath_hint: entry.value.filepath_hint.clone(),
                offset,
                code_byte_size: size,
            });
            offset += size;
        }

        let metadata = MetadataRef {
            entries: entries
                .iter()
                .map(|entry| EntryRef {
                    key: &entry.key,
                    dependencies: &entry.dependencies,
                })
                .collect(),
            shader_creation_params: params,
        };
        let json = serde_json::to_vec(&metadata)
            .map_err(|e| InternalError::new(format!("cache metadata encoding failed: {e}")))?;

        let mut out = Vec::with_capacity(PREFIX_LEN + json.len() + offset as usize);
        out.extend_from_slice(&(json.len() as u64).to_le_bytes());
        out.extend_from_slice(&json);
        for entry in &entries {
            out.extend_from_slice(&entry.value.code);
        }
        Ok(out)
    }

    /// Restores a cache from its binary form.
    ///
    /// Every structural problem is reported as a [`DecodeError`]; nothing in
    /// the input can cause a panic.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, DecodeError> {
        let prefix: [u8; PREFIX_LEN] = bytes
            .get(..PREFIX_LEN)
            .and_then(|prefix| prefix.try_into().ok())
            .ok_or(DecodeError::TruncatedPrefix { len: bytes.len() })?;
        let declared = u64::from_le_bytes(prefix);

        let rest = &bytes[PREFIX_LEN..];
        let metadata_len = usize::try_from(declared)
            .ok()
            .filter(|&len| len <= rest.len())
            .ok_or(DecodeError::MetadataOutOfBounds {
                declared,
                available: rest.len(),
            })?;

        let (metadata, region) = rest.split_at(metadata_len);
        let metadata: Metadata = serde_json::from_str(std::str::from_utf8(metadata)?)?;

        if metadata.entries.len() != metadata.shader_creation_params.len() {
            return Err(DecodeError::LengthMismatch {
                entries: metadata.entries.len(),
                params: metadata.shader_creation_params.len(),
            });
        }

        let cache = ShaderCache::new();
        let mut previous_end = 0u64;
        let records = metadata.entries.into_iter();
        let params = metadata.shader_creation_params.into_iter();
        for (index, (record, params)) in records.zip(params).enumerate() {
            let code = code_range(region, index, &params, previous_end)?;
            previous_end = params.offset + params.code_byte_size;

            cache.insert(CacheEntry::new(
                record.key,
                record.dependencies,
                CompiledShader {
                    stage: params.stage,
                    content_type: params.content_type,
                    filepath_hint: params.filepath_hint,
                    code: code.to_vec(),
                },
            ));
        }
        Ok(cache)
    }
}

/// Validates an entry's range and returns its bytes.
fn code_range<'r>(
    region: &'r [u8],
    index: usize,
    params: &ShaderCreationParams,
    previous_end: u64,
) -> Result<&'r [u8], DecodeError> {
    let out_of_bounds = || DecodeError::CodeOutOfBounds {
        index,
        offset: params.offset,
        size: params.code_byte_size,
        region: region.len(),
    };

    let end = params
        .offset
        .checked_add(params.code_byte_size)
        .ok_or_else(out_of_bounds)?;
    let start = usize::try_from(params.offset).map_err(|_| out_of_bounds())?;
    let end = usize::try_from(end).map_err(|_| out_of_bounds())?;
    let code = region.get(start..end).ok_or_else(out_of_bounds)?;

    if params.offset < previous_end {
        return Err(DecodeError::CodeOverlap {
            index,
            offset: params.offset,
            previous_end,
        });
    }
    Ok(code)
}
