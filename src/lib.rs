//! Extraction of SLIP-framed OSC capture files.
//!
//! A capture is read and de-framed by [`slip`], each datagram is decoded by
//! [`osc`], the packet stream is split into recording segments by
//! [`segment`], and [`io`] writes the segments out as CSV.
//!
//! ```no_run
//! use std::path::Path;
//! use xio_extract::io::{Capture, CsvExporter};
//!
//! let capture = Capture::open("recording.bin")?;
//! let summary = xio_extract::extract::export_csv(&capture, Path::new("out"), &CsvExporter::new())?;
//! println!("{} segments", summary.segments);
//! # Ok::<(), xio_extract::Error>(())
//! ```

pub mod error;
pub mod extract;
pub mod io;
pub mod osc;
pub mod segment;
pub mod slip;

pub use error::{Error, ParseError, Result, ValidationError};
pub use osc::{Bundle, Packet, TimeTag};
pub use segment::{Sample, Segment};
