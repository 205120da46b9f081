//! Error types for capture decoding and export.

use std::path::PathBuf;
use thiserror::Error;

use crate::osc::args::ArgumentError;
use crate::osc::TimeTag;

/// A datagram could not be interpreted as an OSC bundle or message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Neither `#bundle\0` nor a leading `/`
    #[error("datagram is neither a valid bundle nor a valid message ({len} bytes)")]
    NotAPacket { len: usize },

    /// Fewer bytes than a fixed-size field requires
    #[error("truncated packet at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Bundle element length runs past the end of the bundle
    #[error("bundle element at offset {offset} claims {size} bytes, {available} available")]
    ElementSize {
        offset: usize,
        size: usize,
        available: usize,
    },

    #[error("could not read address at offset {offset}: {source}")]
    Address {
        offset: usize,
        #[source]
        source: ArgumentError,
    },

    #[error("could not read type tags at offset {offset}: {source}")]
    TypeTags {
        offset: usize,
        #[source]
        source: ArgumentError,
    },

    #[error("bundle at offset {offset} is nested {depth} levels deep")]
    NestingTooDeep { offset: usize, depth: usize },

    #[error("type tag string at offset {offset} does not start with ','")]
    MissingTypeTags { offset: usize },

    #[error("unbalanced array brackets in type tags {tags:?}")]
    UnbalancedArray { tags: String },

    /// The value decoder rejected an argument
    #[error("could not decode argument '{tag}' at offset {offset}: {source}")]
    Argument {
        offset: usize,
        tag: char,
        #[source]
        source: ArgumentError,
    },
}

/// Decoded data does not match the layout expected of a capture file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("bundle at {timetag} should contain a single OSC message, found {count} elements")]
    BundleSize { timetag: TimeTag, count: usize },

    #[error("bundle at {timetag} should contain a single OSC message, found a nested bundle")]
    NestedBundle { timetag: TimeTag },

    #[error("address {address:?} does not start with '/'")]
    Address { address: String },

    #[error("address {address:?} does not name a file")]
    EmptyName { address: String },

    #[error("address {address:?} maps to {file}, which is already written in this segment")]
    NameCollision { address: String, file: String },
}

/// Main error type for extraction.
#[derive(Error, Debug)]
pub enum Error {
    /// Decoding failed for one datagram of the capture
    #[error("datagram {index}: {source}")]
    Datagram {
        index: usize,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub fn datagram(index: usize, source: ParseError) -> Self {
        Self::Datagram { index, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_keeps_argument_source() {
        let err = ParseError::Argument {
            offset: 12,
            tag: 'q',
            source: ArgumentError::UnknownTag('q'),
        };
        let text = err.to_string();
        assert!(text.contains("'q'"));
        assert!(text.contains("12"));
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("unknown type tag 'q'"));
    }

    #[test]
    fn test_datagram_error_display() {
        let err = Error::datagram(3, ParseError::NotAPacket { len: 0 });
        assert!(err.to_string().starts_with("datagram 3:"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    }

    #[test]
    fn test_validation_is_separate_kind() {
        let err: Error = ValidationError::Address {
            address: "foo".into(),
        }
        .into();
        assert!(matches!(err, Error::Validation(ValidationError::Address { .. })));
    }
}
