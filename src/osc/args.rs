//! Typed OSC argument decoding.
//!
//! The packet decoder only depends on [`ArgumentDecoder`]; the standard
//! implementation covers the OSC 1.0 tags plus the common 1.1 extensions.

use rosc::{OscColor, OscMidiMessage, OscTime, OscType};
use thiserror::Error;

/// Failure while decoding a single argument or padded string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("unknown type tag '{0}'")]
    UnknownTag(char),

    #[error("needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("string is not null terminated")]
    Unterminated,

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("negative blob length {0}")]
    NegativeLength(i32),

    #[error("invalid char code {0:#x}")]
    InvalidChar(u32),
}

/// Decodes one typed argument starting at `offset`.
///
/// Returns the value and the number of bytes consumed, including padding.
pub trait ArgumentDecoder {
    fn decode_argument(
        &self,
        buf: &[u8],
        offset: usize,
        tag: char,
    ) -> Result<(OscType, usize), ArgumentError>;

    /// Reads a null-terminated, 4-byte padded string (address, type tags).
    fn read_string(&self, buf: &[u8], offset: usize) -> Result<(String, usize), ArgumentError> {
        read_padded_string(buf, offset)
    }
}

/// The standard OSC type tag table.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardArguments;

impl ArgumentDecoder for StandardArguments {
    fn decode_argument(
        &self,
        buf: &[u8],
        offset: usize,
        tag: char,
    ) -> Result<(OscType, usize), ArgumentError> {
        match tag {
            'i' => Ok((OscType::Int(i32::from_be_bytes(take(buf, offset)?)), 4)),
            'f' => Ok((OscType::Float(f32::from_be_bytes(take(buf, offset)?)), 4)),
            'h' => Ok((OscType::Long(i64::from_be_bytes(take(buf, offset)?)), 8)),
            'd' => Ok((OscType::Double(f64::from_be_bytes(take(buf, offset)?)), 8)),
            's' | 'S' => {
                let (s, len) = read_padded_string(buf, offset)?;
                Ok((OscType::String(s), len))
            }
            'b' => {
                let size = i32::from_be_bytes(take(buf, offset)?);
                let size = usize::try_from(size).map_err(|_| ArgumentError::NegativeLength(size))?;
                let start = offset + 4;
                let padded = pad4(size);
                check_len(buf, start, padded)?;
                Ok((OscType::Blob(buf[start..start + size].to_vec()), 4 + padded))
            }
            't' => {
                let [s0, s1, s2, s3, f0, f1, f2, f3]: [u8; 8] = take(buf, offset)?;
                let time = OscTime {
                    seconds: u32::from_be_bytes([s0, s1, s2, s3]),
                    fractional: u32::from_be_bytes([f0, f1, f2, f3]),
                };
                Ok((OscType::Time(time), 8))
            }
            'c' => {
                let code = u32::from_be_bytes(take(buf, offset)?);
                let c = char::from_u32(code).ok_or(ArgumentError::InvalidChar(code))?;
                Ok((OscType::Char(c), 4))
            }
            'r' => {
                let [red, green, blue, alpha]: [u8; 4] = take(buf, offset)?;
                Ok((OscType::Color(OscColor { red, green, blue, alpha }), 4))
            }
            'm' => {
                let [port, status, data1, data2]: [u8; 4] = take(buf, offset)?;
                let midi = OscMidiMessage {
                    port,
                    status,
                    data1,
                    data2,
                };
                Ok((OscType::Midi(midi), 4))
            }
            'T' => Ok((OscType::Bool(true), 0)),
            'F' => Ok((OscType::Bool(false), 0)),
            'N' => Ok((OscType::Nil, 0)),
            'I' => Ok((OscType::Inf, 0)),
            other => Err(ArgumentError::UnknownTag(other)),
        }
    }
}

/// Reads a null-terminated string padded to a multiple of 4 bytes.
///
/// Returns the string and the padded length consumed from `offset`.
pub fn read_padded_string(buf: &[u8], offset: usize) -> Result<(String, usize), ArgumentError> {
    let rest = buf.get(offset..).unwrap_or_default();
    let nul = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or(ArgumentError::Unterminated)?;
    let padded = pad4(nul + 1);
    check_len(buf, offset, padded)?;
    let s = std::str::from_utf8(&rest[..nul]).map_err(|_| ArgumentError::InvalidUtf8)?;
    Ok((s.to_owned(), padded))
}

/// Round up to the next multiple of 4.
pub fn pad4(len: usize) -> usize {
    (len + 3) & !3
}

fn check_len(buf: &[u8], offset: usize, needed: usize) -> Result<(), ArgumentError> {
    let available = buf.len().saturating_sub(offset);
    if available < needed {
        return Err(ArgumentError::Truncated { needed, available });
    }
    Ok(())
}

fn take<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N], ArgumentError> {
    check_len(buf, offset, N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[offset..offset + N]);
    Ok(out)
}
