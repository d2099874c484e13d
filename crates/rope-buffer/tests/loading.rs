use pretty_assertions::assert_eq;
use rope_buffer::{Rope, RopeConfig, RopeError, TextEncoding};
use std::io::{self, Read};

const SAMPLE: &str = "aö€b\u{1F600}c\nzweite Zeile ü\r\n\u{1D400}\u{1D400}";

fn tiny_chunks(chunk: usize) -> RopeConfig {
    RopeConfig {
        stream_chunk_size: chunk,
        ..RopeConfig::with_capacities(2, 8)
    }
}

fn utf16_bytes(text: &str, little_endian: bool) -> Vec<u8> {
    text.encode_utf16()
        .flat_map(|u| {
            if little_endian {
                u.to_le_bytes()
            } else {
                u.to_be_bytes()
            }
        })
        .collect()
}

#[test]
fn test_from_bytes_all_encodings() {
    assert_eq!(
        Rope::from_bytes(SAMPLE.as_bytes(), TextEncoding::Utf8).to_string(),
        SAMPLE
    );
    assert_eq!(
        Rope::from_bytes(&utf16_bytes(SAMPLE, true), TextEncoding::Utf16Le).to_string(),
        SAMPLE
    );
    assert_eq!(
        Rope::from_bytes(&utf16_bytes(SAMPLE, false), TextEncoding::Utf16Be).to_string(),
        SAMPLE
    );
    assert_eq!(
        Rope::from_bytes(&[b'a', 0xE4, b'b'], TextEncoding::Latin1).to_string(),
        "aäb"
    );
}

#[test]
fn test_bom_is_skipped_on_load() {
    let mut bytes = TextEncoding::Utf16Le.bom().to_vec();
    bytes.extend(utf16_bytes("hi", true));
    let (encoding, bom_len) = TextEncoding::detect_bom(&bytes).unwrap();
    assert_eq!((encoding, bom_len), (TextEncoding::Utf16Le, 2));

    let rope = Rope::from_bytes(&bytes, encoding);
    assert_eq!(rope.to_string(), "hi");
    assert_eq!(rope.char_count(), 2);
}

#[test]
fn test_reader_chunks_never_split_characters() {
    for chunk in 1..=9 {
        let rope =
            Rope::from_reader_with_config(SAMPLE.as_bytes(), TextEncoding::Utf8, tiny_chunks(chunk))
                .unwrap();
        assert_eq!(rope.to_string(), SAMPLE, "chunk size {chunk}");
        assert_eq!(rope.line_break_count(), 2);
        rope.check_invariants().unwrap();

        let bytes = utf16_bytes(SAMPLE, false);
        let rope =
            Rope::from_reader_with_config(bytes.as_slice(), TextEncoding::Utf16Be, tiny_chunks(chunk))
                .unwrap();
        assert_eq!(rope.to_string(), SAMPLE, "chunk size {chunk}");
        rope.check_invariants().unwrap();
    }
}

#[test]
fn test_loading_is_not_undoable() {
    let mut rope = Rope::from_reader(SAMPLE.as_bytes(), TextEncoding::Utf8).unwrap();
    assert!(!rope.can_undo());
    assert_eq!(rope.undo().unwrap(), None);
    assert_eq!(rope.version(), 0);
}

struct FailingReader {
    served: bool,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.served {
            return Err(io::Error::other("disk went away"));
        }
        self.served = true;
        buf[0] = b'x';
        Ok(1)
    }
}

#[test]
fn test_reader_errors_are_propagated() {
    let err = Rope::from_reader(FailingReader { served: false }, TextEncoding::Utf8).unwrap_err();
    assert!(matches!(err, RopeError::Io(_)));
    assert!(err.to_string().contains("disk went away"));
}
