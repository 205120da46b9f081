//! Capture input and CSV/listing output.

pub mod input;
pub mod output;

pub use input::Capture;
pub use output::{csv_file_name, file_stem, format_value, write_listing, CsvExporter, TimestampFormat};
