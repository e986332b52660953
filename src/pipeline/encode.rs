//! Image encoding: raw image bytes → base64 text.
//!
//! The Ollama generate API takes images as plain base64 strings in the JSON
//! body (no data-URI prefix). The uploaded bytes are forwarded untouched;
//! re-encoding would only cost time and, for JPEG, quality.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::debug;

/// Encode an in-memory image.
pub fn encode_bytes(bytes: &[u8]) -> String {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded image {} bytes → {} bytes base64", bytes.len(), b64.len());
    b64
}

/// Read an image file and encode its full contents.
pub async fn encode_file(path: &Path) -> std::io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(encode_bytes(&bytes))
}
