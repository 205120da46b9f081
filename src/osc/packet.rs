//! Datagram to [`Packet`] decoding.
//!
//! Bundles are decoded recursively; whether a bundle has the single-message
//! shape a capture file requires is checked separately by
//! [`validate_single_message_bundle`].

use rosc::{OscArray, OscMessage, OscType};

use super::args::{ArgumentDecoder, StandardArguments};
use super::{Bundle, Packet, TimeTag};
use crate::error::{ParseError, ValidationError};

const BUNDLE_TAG: &[u8; 8] = b"#bundle\0";
const BUNDLE_HEADER_LEN: usize = 16;

/// Deepest bundle nesting accepted; a top-level bundle is depth 1.
pub const MAX_BUNDLE_DEPTH: usize = 32;

/// True iff the datagram starts with `#bundle\0`.
pub fn is_bundle(dgram: &[u8]) -> bool {
    dgram.starts_with(BUNDLE_TAG)
}

/// Decode one datagram with the standard argument table.
pub fn decode(dgram: &[u8]) -> Result<Packet, ParseError> {
    PacketDecoder::new(StandardArguments).decode(dgram)
}

/// Unwrap a bundle that must hold exactly one message.
pub fn validate_single_message_bundle(bundle: Bundle) -> Result<OscMessage, ValidationError> {
    let Bundle { timetag, mut content } = bundle;
    if content.len() != 1 {
        return Err(ValidationError::BundleSize {
            timetag,
            count: content.len(),
        });
    }
    match content.pop() {
        Some(Packet::Message(msg)) => Ok(msg),
        _ => Err(ValidationError::NestedBundle { timetag }),
    }
}

/// Stateless OSC packet decoder over a pluggable argument decoder.
#[derive(Debug, Clone, Default)]
pub struct PacketDecoder<D = StandardArguments> {
    args: D,
}

impl<D: ArgumentDecoder> PacketDecoder<D> {
    pub fn new(args: D) -> Self {
        PacketDecoder { args }
    }

    /// Decode a datagram into a message or a (possibly nested) bundle.
    ///
    /// Error offsets are relative to the start of `dgram`.
    pub fn decode(&self, dgram: &[u8]) -> Result<Packet, ParseError> {
        self.decode_at(dgram, 0, 0)
    }

    fn decode_at(&self, buf: &[u8], base: usize, depth: usize) -> Result<Packet, ParseError> {
        if is_bundle(buf) {
            let depth = depth + 1;
            if depth > MAX_BUNDLE_DEPTH {
                return Err(ParseError::NestingTooDeep {
                    offset: base,
                    depth,
                });
            }
            self.decode_bundle(buf, base, depth).map(Packet::Bundle)
        } else if buf.first() == Some(&b'/') {
            self.decode_message(buf, base).map(Packet::Message)
        } else {
            Err(ParseError::NotAPacket { len: buf.len() })
        }
    }

    fn decode_bundle(&self, buf: &[u8], base: usize, depth: usize) -> Result<Bundle, ParseError> {
        if buf.len() < BUNDLE_HEADER_LEN {
            return Err(ParseError::Truncated {
                offset: base + BUNDLE_TAG.len(),
                needed: 8,
                available: buf.len() - BUNDLE_TAG.len(),
            });
        }
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&buf[BUNDLE_TAG.len()..BUNDLE_HEADER_LEN]);
        let timetag = TimeTag(u64::from_be_bytes(raw));

        let mut content = Vec::new();
        let mut pos = BUNDLE_HEADER_LEN;
        while pos < buf.len() {
            let available = buf.len() - pos;
            if available < 4 {
                return Err(ParseError::Truncated {
                    offset: base + pos,
                    needed: 4,
                    available,
                });
            }
            let mut size = [0u8; 4];
            size.copy_from_slice(&buf[pos..pos + 4]);
            let size = u32::from_be_bytes(size) as usize;

            let start = pos + 4;
            let available = buf.len() - start;
            if size > available {
                return Err(ParseError::ElementSize {
                    offset: base + pos,
                    size,
                    available,
                });
            }
            content.push(self.decode_at(&buf[start..start + size], base + start, depth)?);
            pos = start + size;
        }

        Ok(Bundle { timetag, content })
    }

    fn decode_message(&self, buf: &[u8], base: usize) -> Result<OscMessage, ParseError> {
        let (addr, addr_len) = self
            .args
            .read_string(buf, 0)
            .map_err(|source| ParseError::Address {
                offset: base,
                source,
            })?;

        let mut pos = addr_len;
        if buf.get(pos) != Some(&b',') {
            return Err(ParseError::MissingTypeTags { offset: base + pos });
        }
        let (tags, tags_len) = self
            .args
            .read_string(buf, pos)
            .map_err(|source| ParseError::TypeTags {
                offset: base + pos,
                source,
            })?;
        pos += tags_len;

        let mut args = Vec::new();
        let mut open: Vec<Vec<OscType>> = Vec::new();
        for tag in tags.chars().skip(1) {
            match tag {
                '[' => open.push(std::mem::take(&mut args)),
                ']' => {
                    let Some(parent) = open.pop() else {
                        return Err(ParseError::UnbalancedArray { tags: tags.clone() });
                    };
                    let content = std::mem::replace(&mut args, parent);
                    args.push(OscType::Array(OscArray { content }));
                }
                _ => {
                    let (value, used) = self
                        .args
                        .decode_argument(buf, pos, tag)
                        .map_err(|source| ParseError::Argument {
                            offset: base + pos,
                            tag,
                            source,
                        })?;
                    pos += used;
                    args.push(value);
                }
            }
        }
        if !open.is_empty() {
            return Err(ParseError::UnbalancedArray { tags });
        }

        Ok(OscMessage { addr, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osc::args::ArgumentError;
    use rosc::{encoder, OscBundle, OscPacket, OscTime};

    fn message(addr: &str, args: Vec<OscType>) -> OscMessage {
        OscMessage {
            addr: addr.to_string(),
            args,
        }
    }

    fn encode(packet: OscPacket) -> Vec<u8> {
        encoder::encode(&packet).unwrap()
    }

    fn bundle(seconds: u32, content: Vec<OscPacket>) -> OscPacket {
        OscPacket::Bundle(OscBundle {
            timetag: OscTime {
                seconds,
                fractional: 0,
            },
            content,
        })
    }

    #[test]
    fn test_message_round_trip() {
        let msg = message("/foo", vec![OscType::Int(1), OscType::Float(2.5)]);
        let dgram = encode(OscPacket::Message(msg.clone()));

        assert!(!is_bundle(&dgram));
        assert_eq!(decode(&dgram).unwrap(), Packet::Message(msg));
    }

    #[test]
    fn test_message_without_arguments() {
        let dgram = encode(OscPacket::Message(message("/ping", vec![])));
        assert_eq!(decode(&dgram).unwrap(), Packet::Message(message("/ping", vec![])));
    }

    #[test]
    fn test_message_with_every_type() {
        let args = vec![
            OscType::String("hello".into()),
            OscType::Blob(vec![1, 2, 3]),
            OscType::Long(-9),
            OscType::Double(0.5),
            OscType::Bool(true),
            OscType::Bool(false),
            OscType::Nil,
            OscType::Inf,
            OscType::Time(OscTime {
                seconds: 3,
                fractional: 4,
            }),
            OscType::Char('z'),
            OscType::Array(OscArray {
                content: vec![OscType::Int(1), OscType::Int(2)],
            }),
            OscType::Int(99),
        ];
        let msg = message("/types/all", args);
        let dgram = encode(OscPacket::Message(msg.clone()));
        assert_eq!(decode(&dgram).unwrap(), Packet::Message(msg));
    }

    #[test]
    fn test_bundle_with_one_message() {
        let inner = message("/gyro", vec![OscType::Float(1.0)]);
        let dgram = encode(bundle(2, vec![OscPacket::Message(inner.clone())]));

        assert!(is_bundle(&dgram));
        let expected = Bundle {
            timetag: TimeTag(2u64 << 32),
            content: vec![Packet::Message(inner)],
        };
        assert_eq!(decode(&dgram).unwrap(), Packet::Bundle(expected));
    }

    #[test]
    fn test_nested_bundles_are_decoded() {
        let inner = message("/a", vec![OscType::Int(5)]);
        let dgram = encode(bundle(
            1,
            vec![
                bundle(2, vec![OscPacket::Message(inner.clone())]),
                OscPacket::Message(inner.clone()),
            ],
        ));

        let Packet::Bundle(outer) = decode(&dgram).unwrap() else {
            panic!("expected a bundle");
        };
        assert_eq!(outer.content.len(), 2);
        assert_eq!(
            outer.content[0],
            Packet::Bundle(Bundle {
                timetag: TimeTag(2u64 << 32),
                content: vec![Packet::Message(inner.clone())],
            })
        );
        assert_eq!(outer.content[1], Packet::Message(inner));
    }

    /// `levels` bundles, each wrapping the next, around `/a ,`.
    fn nested(levels: usize) -> Vec<u8> {
        let msg = b"/a\0\0,\0\0\0";
        let mut dgram = Vec::with_capacity(levels * 20 + msg.len());
        for i in 0..levels {
            let size = (levels - 1 - i) * 20 + msg.len();
            dgram.extend_from_slice(BUNDLE_TAG);
            dgram.extend_from_slice(&1u64.to_be_bytes());
            dgram.extend_from_slice(&(size as u32).to_be_bytes());
        }
        dgram.extend_from_slice(msg);
        dgram
    }

    #[test]
    fn test_nesting_up_to_limit_is_decoded() {
        let mut packet = decode(&nested(MAX_BUNDLE_DEPTH)).unwrap();
        let mut levels = 0;
        while let Packet::Bundle(mut b) = packet {
            levels += 1;
            packet = b.content.pop().unwrap();
        }
        assert_eq!(levels, MAX_BUNDLE_DEPTH);
        assert_eq!(packet, Packet::Message(message("/a", vec![])));
    }

    #[test]
    fn test_nesting_past_limit_is_rejected() {
        assert_eq!(
            decode(&nested(MAX_BUNDLE_DEPTH + 1)).unwrap_err(),
            ParseError::NestingTooDeep {
                offset: MAX_BUNDLE_DEPTH * 20,
                depth: MAX_BUNDLE_DEPTH + 1,
            }
        );
    }

    #[test]
    fn test_very_deep_nesting_returns_error() {
        let err = decode(&nested(200_000)).unwrap_err();
        assert!(matches!(err, ParseError::NestingTooDeep { .. }));
    }

    #[test]
    fn test_empty_bundle() {
        let dgram = encode(bundle(7, vec![]));
        let Packet::Bundle(b) = decode(&dgram).unwrap() else {
            panic!("expected a bundle");
        };
        assert!(b.content.is_empty());
    }

    #[test]
    fn test_not_a_packet() {
        assert_eq!(decode(b"").unwrap_err(), ParseError::NotAPacket { len: 0 });
        assert_eq!(decode(b"hello").unwrap_err(), ParseError::NotAPacket { len: 5 });
    }

    #[test]
    fn test_truncated_bundle_header() {
        assert_eq!(
            decode(b"#bundle\0\0\0").unwrap_err(),
            ParseError::Truncated {
                offset: 8,
                needed: 8,
                available: 2
            }
        );
    }

    #[test]
    fn test_bundle_element_too_long() {
        let mut dgram = b"#bundle\0".to_vec();
        dgram.extend_from_slice(&[0; 8]);
        dgram.extend_from_slice(&64u32.to_be_bytes());
        dgram.extend_from_slice(b"/a\0\0,\0\0\0");

        assert_eq!(
            decode(&dgram).unwrap_err(),
            ParseError::ElementSize {
                offset: 16,
                size: 64,
                available: 8
            }
        );
    }

    #[test]
    fn test_bundle_dangling_length_bytes() {
        let mut dgram = encode(bundle(0, vec![]));
        dgram.extend_from_slice(&[0, 0]);
        assert_eq!(
            decode(&dgram).unwrap_err(),
            ParseError::Truncated {
                offset: 16,
                needed: 4,
                available: 2
            }
        );
    }

    #[test]
    fn test_unknown_type_tag() {
        let mut dgram = b"/a\0\0,x\0\0".to_vec();
        dgram.extend_from_slice(&[0; 4]);
        assert_eq!(
            decode(&dgram).unwrap_err(),
            ParseError::Argument {
                offset: 8,
                tag: 'x',
                source: ArgumentError::UnknownTag('x'),
            }
        );
    }

    #[test]
    fn test_truncated_argument() {
        let mut dgram = b"/a\0\0,i\0\0".to_vec();
        dgram.extend_from_slice(&[0; 2]);
        assert_eq!(
            decode(&dgram).unwrap_err(),
            ParseError::Argument {
                offset: 8,
                tag: 'i',
                source: ArgumentError::Truncated {
                    needed: 4,
                    available: 2
                },
            }
        );
    }

    #[test]
    fn test_missing_type_tags() {
        assert_eq!(
            decode(b"/a\0\0").unwrap_err(),
            ParseError::MissingTypeTags { offset: 4 }
        );
        assert_eq!(
            decode(b"/a\0\0abc\0").unwrap_err(),
            ParseError::MissingTypeTags { offset: 4 }
        );
    }

    #[test]
    fn test_unterminated_address() {
        assert_eq!(
            decode(b"/abc").unwrap_err(),
            ParseError::Address {
                offset: 0,
                source: ArgumentError::Unterminated,
            }
        );
    }

    #[test]
    fn test_unbalanced_array() {
        let mut dgram = b"/a\0\0,[i\0".to_vec();
        dgram.extend_from_slice(&1i32.to_be_bytes());
        assert!(matches!(
            decode(&dgram).unwrap_err(),
            ParseError::UnbalancedArray { .. }
        ));

        let mut dgram = b"/a\0\0,i]\0".to_vec();
        dgram.extend_from_slice(&1i32.to_be_bytes());
        assert!(matches!(
            decode(&dgram).unwrap_err(),
            ParseError::UnbalancedArray { .. }
        ));
    }

    #[test]
    fn test_nested_error_offset_is_absolute() {
        let mut inner = b"/a\0\0,q\0\0".to_vec();
        inner.extend_from_slice(&[0; 4]);
        let mut dgram = b"#bundle\0".to_vec();
        dgram.extend_from_slice(&[0; 8]);
        dgram.extend_from_slice(&(inner.len() as u32).to_be_bytes());
        dgram.extend_from_slice(&inner);

        // element starts at 20, its first argument at 20 + 8
        assert_eq!(
            decode(&dgram).unwrap_err(),
            ParseError::Argument {
                offset: 28,
                tag: 'q',
                source: ArgumentError::UnknownTag('q'),
            }
        );
    }

    struct RejectAll;

    impl ArgumentDecoder for RejectAll {
        fn decode_argument(
            &self,
            _buf: &[u8],
            _offset: usize,
            tag: char,
        ) -> Result<(OscType, usize), ArgumentError> {
            Err(ArgumentError::UnknownTag(tag))
        }
    }

    #[test]
    fn test_custom_argument_decoder_errors_become_parse_errors() {
        let dgram = encode(OscPacket::Message(message("/x", vec![OscType::Int(1)])));
        let err = PacketDecoder::new(RejectAll).decode(&dgram).unwrap_err();
        assert!(matches!(err, ParseError::Argument { tag: 'i', .. }));
    }

    #[test]
    fn test_validate_single_message_bundle() {
        let msg = message("/gyro", vec![OscType::Float(0.1)]);
        let one = Bundle {
            timetag: TimeTag(9),
            content: vec![Packet::Message(msg.clone())],
        };
        assert_eq!(validate_single_message_bundle(one).unwrap(), msg);

        let two = Bundle {
            timetag: TimeTag(9),
            content: vec![Packet::Message(msg.clone()), Packet::Message(msg.clone())],
        };
        assert_eq!(
            validate_single_message_bundle(two).unwrap_err(),
            ValidationError::BundleSize {
                timetag: TimeTag(9),
                count: 2
            }
        );

        let empty = Bundle {
            timetag: TimeTag(9),
            content: vec![],
        };
        assert!(matches!(
            validate_single_message_bundle(empty).unwrap_err(),
            ValidationError::BundleSize { count: 0, .. }
        ));

        let nested = Bundle {
            timetag: TimeTag(9),
            content: vec![Packet::Bundle(Bundle {
                timetag: TimeTag(10),
                content: vec![Packet::Message(msg)],
            })],
        };
        assert_eq!(
            validate_single_message_bundle(nested).unwrap_err(),
            ValidationError::NestedBundle {
                timetag: TimeTag(9)
            }
        );
    }
}
