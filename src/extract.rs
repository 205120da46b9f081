//! Whole-capture extraction into a CSV tree or a text listing.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::io::{write_listing, Capture, CsvExporter, TimestampFormat};
use crate::segment::Segment;

/// Totals over one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub segments: usize,
    pub messages: usize,
    pub samples: usize,
    pub files: Vec<PathBuf>,
}

impl ExportSummary {
    fn record(&mut self, segment: &Segment) {
        self.segments += 1;
        self.messages += segment.messages.len();
        self.samples += segment.bundles.len();
    }
}

/// Per-segment overview, as printed by `info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentInfo {
    pub messages: usize,
    pub samples: usize,
    pub addresses: Vec<String>,
}

/// Write every segment into `<out_dir>/<index>/`.
///
/// Stops at the first error; directories and files already written are left
/// in place.
pub fn export_csv(capture: &Capture, out_dir: &Path, exporter: &CsvExporter) -> Result<ExportSummary> {
    let mut summary = ExportSummary::default();
    for (index, segment) in capture.segments().enumerate() {
        let segment = segment?;
        let dir = out_dir.join(index.to_string());
        fs::create_dir_all(&dir)?;
        let files = exporter.write_segment(&segment, &dir)?;
        tracing::info!(
            segment = index,
            messages = segment.messages.len(),
            samples = segment.bundles.len(),
            files = files.len(),
            "exported segment"
        );
        summary.record(&segment);
        summary.files.extend(files);
    }
    Ok(summary)
}

/// Write all segments as one text listing.
pub fn export_listing(
    capture: &Capture,
    out_file: &Path,
    timestamps: TimestampFormat,
) -> Result<ExportSummary> {
    let mut summary = ExportSummary::default();
    let mut out = BufWriter::new(File::create(out_file)?);
    for segment in capture.segments() {
        let segment = segment?;
        write_listing(&mut out, &segment, timestamps)?;
        summary.record(&segment);
    }
    out.flush()?;
    summary.files.push(out_file.to_path_buf());
    Ok(summary)
}

pub fn describe(capture: &Capture) -> Result<Vec<SegmentInfo>> {
    capture
        .segments()
        .map(|segment| {
            let segment = segment?;
            Ok(SegmentInfo {
                messages: segment.messages.len(),
                samples: segment.bundles.len(),
                addresses: segment.addresses().into_iter().map(String::from).collect(),
            })
        })
        .collect()
}
