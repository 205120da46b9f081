//! SLIP framing for capture files.
//!
//! Escaping is done as two whole-buffer substitutions (ESC first, then END)
//! and unescaping as two substitutions in the other order, so the byte output
//! stays identical to captures written by existing tools. Malformed escape
//! sequences (a dangling ESC, or ESC followed by anything but 0xDC/0xDD) are
//! not validated and pass through unchanged.

use std::fs;
use std::path::Path;

/// Frame delimiter.
pub const END: u8 = 0xC0;
/// Escape byte.
pub const ESC: u8 = 0xDB;
/// Follows ESC to encode a literal END.
pub const ESC_END: u8 = 0xDC;
/// Follows ESC to encode a literal ESC.
pub const ESC_ESC: u8 = 0xDD;

/// Encode datagrams as one SLIP byte stream, END-separated with a trailing END.
pub fn encode<D: AsRef<[u8]>>(datagrams: &[D]) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, dgram) in datagrams.iter().enumerate() {
        if i > 0 {
            out.push(END);
        }
        let escaped = replace(dgram.as_ref(), &[ESC], &[ESC, ESC_ESC]);
        out.extend(replace(&escaped, &[END], &[ESC, ESC_END]));
    }
    out.push(END);
    out
}

/// Split a SLIP byte stream into datagrams.
///
/// Leading and trailing END bytes are stripped and the remainder is split on
/// every END, so consecutive ENDs inside the stream produce empty datagrams.
/// An empty (or all-END) input yields a single empty datagram.
pub fn decode(data: &[u8]) -> Vec<Vec<u8>> {
    let start = data.iter().position(|&b| b != END).unwrap_or(data.len());
    let end = data.iter().rposition(|&b| b != END).map_or(start, |i| i + 1);

    data[start..end]
        .split(|&b| b == END)
        .map(|chunk| {
            let unescaped = replace(chunk, &[ESC, ESC_END], &[END]);
            replace(&unescaped, &[ESC, ESC_ESC], &[ESC])
        })
        .collect()
}

/// Read a whole capture file and split it into datagrams.
///
/// The file is buffered in memory in one piece; very large captures need
/// as much RAM as the file size plus the decoded datagrams.
pub fn decode_file(path: impl AsRef<Path>) -> std::io::Result<Vec<Vec<u8>>> {
    let data = fs::read(path.as_ref())?;
    tracing::debug!(path = %path.as_ref().display(), bytes = data.len(), "read capture");
    Ok(decode(&data))
}

/// Replace every non-overlapping occurrence of `from`, scanning left to right.
fn replace(data: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if data[i..].starts_with(from) {
            out.extend_from_slice(to);
            i += from.len();
        } else {
            out.push(data[i]);
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_escapes_end() {
        assert_eq!(encode(&[b"\xc0"]), b"\xdb\xdc\xc0");
    }

    #[test]
    fn test_encode_escapes_esc() {
        assert_eq!(encode(&[b"\xdb"]), b"\xdb\xdd\xc0");
    }

    #[test]
    fn test_encode_esc_then_end() {
        // ESC is expanded before END, so the ESC introduced for END is not re-escaped
        assert_eq!(encode(&[b"\xdb\xc0"]), b"\xdb\xdd\xdb\xdc\xc0");
    }

    #[test]
    fn test_encode_joins_with_single_end() {
        assert_eq!(encode(&[&b"ab"[..], &b"c"[..]]), b"ab\xc0c\xc0");
    }

    #[test]
    fn test_decode_empty_yields_one_empty_datagram() {
        assert_eq!(decode(b"\xc0"), vec![Vec::<u8>::new()]);
        assert_eq!(decode(b""), vec![Vec::<u8>::new()]);
        assert_eq!(decode(b"\xc0\xc0\xc0"), vec![Vec::<u8>::new()]);
    }

    #[test]
    fn test_decode_strips_outer_ends() {
        assert_eq!(decode(b"\xc0\xc0ab\xc0cd\xc0\xc0"), vec![b"ab".to_vec(), b"cd".to_vec()]);
    }

    #[test]
    fn test_decode_inner_double_end_gives_empty_datagram() {
        assert_eq!(
            decode(b"ab\xc0\xc0cd\xc0"),
            vec![b"ab".to_vec(), Vec::new(), b"cd".to_vec()]
        );
    }

    #[test]
    fn test_decode_unescapes() {
        assert_eq!(decode(b"\xdb\xdc\xdb\xdd\xc0"), vec![vec![END, ESC]]);
    }

    #[test]
    fn test_decode_passes_malformed_escapes_through() {
        assert_eq!(decode(b"\xdb\x01\xc0"), vec![vec![ESC, 0x01]]);
        assert_eq!(decode(b"A\xdb\xc0"), vec![vec![b'A', ESC]]);
    }

    #[test]
    fn test_decode_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.bin");
        fs::write(&path, encode(&[&b"one"[..], &b"\xc0two"[..]])).unwrap();

        let datagrams = decode_file(&path).unwrap();
        assert_eq!(datagrams, vec![b"one".to_vec(), b"\xc0two".to_vec()]);
    }

    #[test]
    fn test_decode_file_missing() {
        let err = decode_file("/nonexistent/capture.bin").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
