//! Final byte encoding of a rendered document.

use bytes::Bytes;
use tracing::warn;

use crate::layout::LayoutError;

/// Every representation a rendering backend may hand back.
#[derive(Debug, Clone)]
pub enum RenderedOutput {
    Bytes(Bytes),
    ByteBuffer(Vec<u8>),
    /// One char per byte. Anything above U+00FF cannot survive this path.
    LegacyString(String),
    /// A representation the encoder has no mapping for, named for diagnostics.
    Unsupported(&'static str),
}

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Converts backend output into the payload returned to callers.
///
/// The result is guaranteed non-empty and to start with the PDF header;
/// anything else is an `OutputEncoding` error rather than a silent success.
pub fn encode_output(output: RenderedOutput) -> Result<Vec<u8>, LayoutError> {
    let bytes = match output {
        RenderedOutput::Bytes(bytes) => bytes.to_vec(),
        RenderedOutput::ByteBuffer(buffer) => buffer,
        RenderedOutput::LegacyString(text) => {
            let (bytes, replaced) = latin1_encode(&text);
            warn!(
                replaced_chars = replaced,
                len = bytes.len(),
                "Renderer returned a string; encoding as Latin-1"
            );
            bytes
        }
        RenderedOutput::Unsupported(kind) => {
            return Err(LayoutError::OutputEncoding(format!(
                "renderer returned an unsupported output type: {kind}"
            )));
        }
    };

    if bytes.is_empty() {
        return Err(LayoutError::OutputEncoding(
            "renderer returned an empty document".to_string(),
        ));
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(LayoutError::OutputEncoding(
            "rendered output is not a PDF document".to_string(),
        ));
    }
    Ok(bytes)
}

/// Single-byte encoding; characters above U+00FF become `?`.
fn latin1_encode(text: &str) -> (Vec<u8>, usize) {
    let mut replaced = 0;
    let bytes = text
        .chars()
        .map(|c| match u8::try_from(c as u32) {
            Ok(b) => b,
            Err(_) => {
                replaced += 1;
                b'?'
            }
        })
        .collect();
    (bytes, replaced)
}
