//! glTF model inspection.
//!
//! The `gltf` crate parses the container (binary `.glb` or plain JSON) and
//! validates the document. Only top-level counts are kept; meshes are not
//! decoded.

use crate::engine::{EngineError, EngineResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlbInfo {
    pub meshes: usize,
    pub nodes: usize,
    pub generator: Option<String>,
    /// Length of the embedded binary chunk, if any.
    pub bin_len: Option<usize>,
}

fn bad(msg: impl Into<String>) -> EngineError {
    EngineError::Asset(msg.into())
}

pub fn parse_glb(bytes: &[u8]) -> EngineResult<GlbInfo> {
    let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| bad(format!("invalid glTF: {e}")))?;

    let asset = &gltf.as_json().asset;
    if !asset.version.starts_with('2') {
        return Err(bad(format!("unsupported glTF asset version {}", asset.version)));
    }
    if let Some(ext) = gltf.extensions_required().next() {
        return Err(bad(format!("unsupported required extension {ext}")));
    }

    Ok(GlbInfo {
        meshes: gltf.meshes().count(),
        nodes: gltf.nodes().count(),
        generator: asset.generator.clone(),
        bin_len: gltf.blob.as_ref().map(Vec::len),
    })
}

/// One-triangle document whose buffer is the embedded 36-byte BIN chunk.
#[cfg(test)]
pub(crate) const TRIANGLE: &str = r#"{
    "asset": { "version": "2.0", "generator": "test" },
    "buffers": [{ "byteLength": 36 }],
    "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
    "accessors": [{
        "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
        "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
    }],
    "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
    "nodes": [{ "mesh": 0 }, {}]
}"#;

/// Assemble a glb container around `json` (padded with spaces). The BIN chunk
/// header declares `bin_claim` bytes regardless of how many `bin` holds.
#[cfg(test)]
pub(crate) fn build_glb_claiming(json: &str, bin: Option<(&[u8], u32)>) -> Vec<u8> {
    let mut json = json.as_bytes().to_vec();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }

    let mut body = Vec::new();
    body.extend_from_slice(&(json.len() as u32).to_le_bytes());
    body.extend_from_slice(b"JSON");
    body.extend_from_slice(&json);
    if let Some((bin, bin_claim)) = bin {
        body.extend_from_slice(&bin_claim.to_le_bytes());
        body.extend_from_slice(b"BIN\0");
        body.extend_from_slice(bin);
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&((12 + body.len()) as u32).to_le_bytes());
    out.extend_from_slice(&body);
    out
}

#[cfg(test)]
pub(crate) fn build_glb(json: &str, bin: Option<&[u8]>) -> Vec<u8> {
    build_glb_claiming(json, bin.map(|b| (b, b.len() as u32)))
}
