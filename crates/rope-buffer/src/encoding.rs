//! Byte-stream decoding into UTF-16 code units.
//!
//! The rope always stores UTF-16. Sources are decoded chunk by chunk; when a chunk ends in the
//! middle of a character the decoder keeps the incomplete bytes (as many as the encoding needs
//! for that character) and prepends them to the next chunk, so a character is never inserted in
//! two halves.

use crate::buffer::is_high_surrogate;

const REPLACEMENT: u16 = 0xFFFD;

/// Source encodings accepted by [`Rope::from_bytes`](crate::Rope::from_bytes) and
/// [`Rope::from_reader`](crate::Rope::from_reader).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextEncoding {
    /// UTF-8; invalid sequences decode to U+FFFD.
    #[default]
    Utf8,
    /// UTF-16, little endian.
    Utf16Le,
    /// UTF-16, big endian.
    Utf16Be,
    /// ISO-8859-1: every byte is one code point.
    Latin1,
}

impl TextEncoding {
    /// Byte order mark of this encoding (empty for Latin-1).
    pub fn bom(self) -> &'static [u8] {
        match self {
            Self::Utf8 => &[0xEF, 0xBB, 0xBF],
            Self::Utf16Le => &[0xFF, 0xFE],
            Self::Utf16Be => &[0xFE, 0xFF],
            Self::Latin1 => &[],
        }
    }

    /// Sniff a byte order mark. Returns the encoding and the BOM length.
    pub fn detect_bom(bytes: &[u8]) -> Option<(Self, usize)> {
        [Self::Utf8, Self::Utf16Le, Self::Utf16Be]
            .into_iter()
            .find(|encoding| bytes.starts_with(encoding.bom()))
            .map(|encoding| (encoding, encoding.bom().len()))
    }
}

/// Incremental decoder that carries incomplete characters across chunks.
#[derive(Debug)]
pub(crate) struct StreamDecoder {
    encoding: TextEncoding,
    pending: Vec<u8>,
    bom_checked: bool,
}

impl StreamDecoder {
    pub(crate) fn new(encoding: TextEncoding) -> Self {
        Self {
            encoding,
            pending: Vec::new(),
            bom_checked: false,
        }
    }

    /// Decode `bytes` (after any carried tail) into `out`.
    ///
    /// Returns the number of bytes held back for the next call.
    pub(crate) fn decode(&mut self, bytes: &[u8], out: &mut Vec<u16>) -> usize {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(bytes);

        let mut start = 0;
        if !self.bom_checked {
            let bom = self.encoding.bom();
            if input.len() < bom.len() && bom.starts_with(&input) {
                self.pending = input;
                return self.pending.len();
            }
            if input.starts_with(bom) {
                start = bom.len();
            }
            self.bom_checked = true;
        }

        let carried = match self.encoding {
            TextEncoding::Utf8 => decode_utf8(&input[start..], out),
            TextEncoding::Utf16Le => decode_utf16(&input[start..], u16::from_le_bytes, out),
            TextEncoding::Utf16Be => decode_utf16(&input[start..], u16::from_be_bytes, out),
            TextEncoding::Latin1 => {
                out.extend(input[start..].iter().map(|&b| u16::from(b)));
                0
            }
        };
        self.pending = input[input.len() - carried..].to_vec();
        self.pending.len()
    }

    /// Flush whatever is still held back at end of input.
    pub(crate) fn finish(&mut self, out: &mut Vec<u16>) {
        self.bom_checked = true;
        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            return;
        }
        match self.encoding {
            TextEncoding::Utf8 => out.extend(String::from_utf8_lossy(&pending).encode_utf16()),
            TextEncoding::Utf16Le | TextEncoding::Utf16Be => {
                let to_unit: fn([u8; 2]) -> u16 = match self.encoding {
                    TextEncoding::Utf16Le => u16::from_le_bytes,
                    _ => u16::from_be_bytes,
                };
                let chunks = pending.chunks_exact(2);
                let odd = !chunks.remainder().is_empty();
                out.extend(chunks.map(|pair| to_unit([pair[0], pair[1]])));
                if odd {
                    out.push(REPLACEMENT);
                }
            }
            TextEncoding::Latin1 => out.extend(pending.iter().map(|&b| u16::from(b))),
        }
    }
}

/// Decode as much UTF-8 as possible; returns the length of an incomplete trailing sequence.
fn decode_utf8(mut bytes: &[u8], out: &mut Vec<u16>) -> usize {
    loop {
        match std::str::from_utf8(bytes) {
            Ok(text) => {
                out.extend(text.encode_utf16());
                return 0;
            }
            Err(err) => {
                let valid = err.valid_up_to();
                out.extend(String::from_utf8_lossy(&bytes[..valid]).encode_utf16());
                match err.error_len() {
                    None => return bytes.len() - valid,
                    Some(bad) => {
                        out.push(REPLACEMENT);
                        bytes = &bytes[valid + bad..];
                    }
                }
            }
        }
    }
}

/// Decode whole code units; holds back an odd byte and a trailing high surrogate.
fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16, out: &mut Vec<u16>) -> usize {
    let chunks = bytes.chunks_exact(2);
    let mut carried = chunks.remainder().len();
    let before = out.len();
    out.extend(chunks.map(|pair| to_unit([pair[0], pair[1]])));
    if out.len() > before && out.last().copied().is_some_and(is_high_surrogate) {
        out.pop();
        carried += 2;
    }
    carried
}

/// Decode a complete byte slice.
pub(crate) fn decode_all(bytes: &[u8], encoding: TextEncoding) -> Vec<u16> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut decoder = StreamDecoder::new(encoding);
    decoder.decode(bytes, &mut out);
    decoder.finish(&mut out);
    out
}
