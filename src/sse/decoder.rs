//! Incremental UTF-8 decoding of transport chunks.
//!
//! Network chunks are not aligned to character boundaries, so a multi-byte
//! character can arrive split across two reads. The decoder holds the
//! incomplete tail back until the next chunk completes it. Malformed
//! sequences become U+FFFD and never fail. A byte-order mark at the very
//! start of the body is dropped.

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Stateful byte-to-text decoder.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    /// Bytes of a character whose remaining bytes have not arrived yet
    pending: Vec<u8>,
    /// Set once the start of the body has been checked for a BOM
    bom_checked: bool,
}

impl Utf8StreamDecoder {
    /// Create a new decoder with no pending bytes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk, returning all text that is complete so far.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(chunk);

        if !self.bom_checked {
            // Wait until enough bytes arrived to tell a BOM from text
            if input.len() < UTF8_BOM.len() && UTF8_BOM.starts_with(&input) {
                self.pending = input;
                return String::new();
            }
            self.bom_checked = true;
            if input.starts_with(UTF8_BOM) {
                input.drain(..UTF8_BOM.len());
            }
        }

        let mut out = String::with_capacity(input.len());
        let mut rest: &[u8] = &input;

        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    if let Ok(text) = std::str::from_utf8(valid) {
                        out.push_str(text);
                    }
                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            // Truncated sequence at the end of the chunk
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Flush at end of stream. A dangling partial character becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let pending = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&pending).into_owned()
    }

    /// Whether an incomplete character is being held back.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
