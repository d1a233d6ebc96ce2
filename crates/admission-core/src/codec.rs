//! Object codec
//!
//! Converts the raw object bytes carried in an admission request into a typed
//! [`Pod`] and back. Encoding must be deterministic: the patch generator diffs
//! two encodings structurally, so the same Pod has to produce byte-identical
//! output every time. `k8s_openapi` types give us that for free since struct
//! fields serialize in declaration order and every map is a `BTreeMap`.

use k8s_openapi::api::core::v1::Pod;

use crate::{Error, Result};

/// Decodes and encodes the object under admission
pub trait ObjectCodec: Send + Sync {
    /// Decode raw object bytes; never returns a partially populated Pod
    fn decode(&self, raw: &[u8]) -> Result<Pod>;

    /// Encode a Pod deterministically
    fn encode(&self, pod: &Pod) -> Result<Vec<u8>>;
}

/// JSON codec, the encoding the API server uses for admission payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ObjectCodec for JsonCodec {
    fn decode(&self, raw: &[u8]) -> Result<Pod> {
        serde_json::from_slice(raw).map_err(Error::Decode)
    }

    fn encode(&self, pod: &Pod) -> Result<Vec<u8>> {
        serde_json::to_vec(pod).map_err(Error::Encode)
    }
}
