//! OSC packet model and decoding.
//!
//! Messages and argument values are `rosc` types; bundles keep their
//! timetag as the raw 64-bit value read from the wire.

pub mod args;
pub mod packet;

use std::fmt;

pub use rosc::{OscMessage, OscType};

pub use args::{ArgumentDecoder, ArgumentError, StandardArguments};
pub use packet::{decode, is_bundle, validate_single_message_bundle, PacketDecoder};

/// Raw 64-bit NTP timetag of a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeTag(pub u64);

impl TimeTag {
    pub fn raw(self) -> u64 {
        self.0
    }

    /// Whole seconds plus the 32-bit binary fraction.
    pub fn seconds(self) -> f64 {
        let whole = (self.0 >> 32) as f64;
        let fraction = (self.0 & 0xFFFF_FFFF) as f64 / 4_294_967_296.0;
        whole + fraction
    }
}

impl From<&rosc::OscTime> for TimeTag {
    fn from(time: &rosc::OscTime) -> Self {
        TimeTag(((time.seconds as u64) << 32) | time.fractional as u64)
    }
}

impl fmt::Display for TimeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// OSC bundle with its decoded elements in wire order.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    pub timetag: TimeTag,
    pub content: Vec<Packet>,
}

/// One decoded datagram.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Message(OscMessage),
    Bundle(Bundle),
}
