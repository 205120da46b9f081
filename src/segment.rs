//! Splitting a capture's packet stream into recording segments.
//!
//! A capture is a block of settings messages followed by timestamped
//! single-message bundles. When a settings message shows up after samples
//! have been recorded, the device was reconfigured and a new segment starts.

use std::collections::HashSet;
use std::iter::FusedIterator;
use std::mem;

use rosc::{OscMessage, OscType};

use crate::error::Result;
use crate::osc::{validate_single_message_bundle, Packet, TimeTag};

/// Message unwrapped from a single-message bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timetag: TimeTag,
    pub addr: String,
    pub args: Vec<OscType>,
}

/// Settings messages followed by the samples recorded with them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segment {
    pub messages: Vec<OscMessage>,
    pub bundles: Vec<Sample>,
}

impl Segment {
    /// Distinct sample addresses, in order of first appearance.
    pub fn addresses(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.bundles
            .iter()
            .map(|s| s.addr.as_str())
            .filter(|addr| seen.insert(*addr))
            .collect()
    }

    /// Samples recorded at `addr`, in capture order.
    pub fn samples<'a>(&'a self, addr: &'a str) -> impl Iterator<Item = &'a Sample> + 'a {
        self.bundles.iter().filter(move |s| s.addr == addr)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.bundles.is_empty()
    }
}

/// Lazily group packets into segments.
///
/// Always yields at least one segment. The first error (from the packet
/// source or from bundle validation) is yielded and ends the iteration.
pub fn segments<I>(packets: I) -> Segments<I::IntoIter>
where
    I: IntoIterator<Item = Result<Packet>>,
{
    Segments {
        packets: packets.into_iter(),
        current: Segment::default(),
        done: false,
    }
}

/// Iterator returned by [`segments`].
pub struct Segments<I> {
    packets: I,
    current: Segment,
    done: bool,
}

impl<I> Iterator for Segments<I>
where
    I: Iterator<Item = Result<Packet>>,
{
    type Item = Result<Segment>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.packets.next() {
                None => {
                    self.done = true;
                    return Some(Ok(mem::take(&mut self.current)));
                }
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err));
                }
                Some(Ok(Packet::Bundle(bundle))) => {
                    let timetag = bundle.timetag;
                    match validate_single_message_bundle(bundle) {
                        Ok(msg) => self.current.bundles.push(Sample {
                            timetag,
                            addr: msg.addr,
                            args: msg.args,
                        }),
                        Err(err) => {
                            self.done = true;
                            return Some(Err(err.into()));
                        }
                    }
                }
                Some(Ok(Packet::Message(msg))) => {
                    if self.current.bundles.is_empty() {
                        self.current.messages.push(msg);
                        continue;
                    }
                    tracing::debug!(
                        addr = %msg.addr,
                        samples = self.current.bundles.len(),
                        "settings changed after recording, starting new segment"
                    );
                    let fresh = Segment {
                        messages: vec![msg],
                        bundles: Vec::new(),
                    };
                    return Some(Ok(mem::replace(&mut self.current, fresh)));
                }
            }
        }
    }
}

impl<I> FusedIterator for Segments<I> where I: Iterator<Item = Result<Packet>> {}
