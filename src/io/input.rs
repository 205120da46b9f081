use std::path::Path;

use crate::error::{Error, Result};
use crate::osc::{Packet, PacketDecoder, StandardArguments};
use crate::segment::{self, Segments};
use crate::slip;

/// The de-framed datagrams of one capture file.
///
/// Datagrams are decoded into packets lazily while iterating, so only the
/// raw bytes of the capture are held in memory.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    datagrams: Vec<Vec<u8>>,
    skip_empty: bool,
}

impl Capture {
    /// Read and de-frame a capture file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let datagrams = slip::decode_file(path)?;
        tracing::debug!(datagrams = datagrams.len(), "de-framed capture");
        Ok(Capture {
            datagrams,
            skip_empty: false,
        })
    }

    /// De-frame an in-memory SLIP stream.
    pub fn from_bytes(data: &[u8]) -> Self {
        Capture {
            datagrams: slip::decode(data),
            skip_empty: false,
        }
    }

    /// Drop zero-length datagrams instead of failing on them.
    pub fn skip_empty(mut self, skip: bool) -> Self {
        self.skip_empty = skip;
        self
    }

    pub fn datagrams(&self) -> &[Vec<u8>] {
        &self.datagrams
    }

    /// Decode each datagram in file order. Errors carry the datagram index.
    pub fn packets(&self) -> impl Iterator<Item = Result<Packet>> + '_ {
        let decoder = PacketDecoder::new(StandardArguments);
        let skip_empty = self.skip_empty;
        self.datagrams
            .iter()
            .enumerate()
            .filter(move |(index, dgram)| {
                if skip_empty && dgram.is_empty() {
                    tracing::debug!(index, "skipping empty datagram");
                    return false;
                }
                true
            })
            .map(move |(index, dgram)| {
                tracing::trace!(index, len = dgram.len(), "decoding datagram");
                decoder
                    .decode(dgram)
                    .map_err(|source| Error::datagram(index, source))
            })
    }

    /// Group the decoded packets into segments.
    pub fn segments(&self) -> Segments<impl Iterator<Item = Result<Packet>> + '_> {
        segment::segments(self.packets())
    }
}
