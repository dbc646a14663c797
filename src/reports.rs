//! Serializable analysis report structures
//!
//! Everything written to `results.json` (and printable as a JSON schema via
//! the `schema` command) lives here.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level structure of `results.json`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunSummary {
    /// callsweep version that produced this run
    pub tool_version: String,

    /// When this summary was generated
    #[serde(with = "chrono::serde::ts_seconds")]
    #[schemars(with = "String")]
    pub generated_at: DateTime<Utc>,

    /// Per-file results, keyed by file name
    pub files: BTreeMap<String, FileReport>,
}

/// All call groups found in one source file.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileReport {
    /// Content hash of the file as analyzed (`sha256:` + first 8 bytes hex)
    pub source_hash: String,

    /// Every contiguous call group in the file, in source order
    pub groups: Vec<GroupJson>,
}

/// One call group: its summary plus the original call previews.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GroupJson {
    pub summary: GroupSummary,
    pub original: Vec<String>,
}

/// Digest of a contiguous chunk of calls.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GroupSummary {
    pub num_calls_in_this_chunk: usize,
    /// Call type of each member, in order
    pub call_types: Vec<usize>,
    /// Call types with adjacent duplicates collapsed
    pub cleaned_call_types: Vec<usize>,
    pub chunk_start_line: usize,
    pub chunk_end_line: usize,
    /// Second argument of every member call, joined with `" *** "`
    pub concatenated_messages: String,
}
