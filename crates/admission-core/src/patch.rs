//! JSON Patch generation
//!
//! Computes the RFC 6902 operations that turn one encoded Pod into another.
//! Both inputs come from the same deterministic codec, so a structural diff
//! of the two JSON trees only reports fields the mutator actually changed.
//! Map key order is irrelevant to the diff, array order is significant.

use json_patch::Patch;
use serde_json::Value;

use crate::{Error, Result};

/// Diff two encoded snapshots into a JSON Patch
///
/// Returns an empty patch when the snapshots are structurally equal.
pub fn create_patch(original: &[u8], mutated: &[u8]) -> Result<Patch> {
    let original: Value = serde_json::from_slice(original)
        .map_err(|e| Error::patch(format!("original object is not JSON: {e}")))?;
    let mutated: Value = serde_json::from_slice(mutated)
        .map_err(|e| Error::patch(format!("mutated object is not JSON: {e}")))?;

    Ok(json_patch::diff(&original, &mutated))
}

/// Serialize a patch into the bytes carried by an admission response
pub fn patch_bytes(patch: &Patch) -> Result<Vec<u8>> {
    serde_json::to_vec(patch).map_err(|e| Error::patch(format!("failed to serialize patch: {e}")))
}
