use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use xio_extract::extract::{ExportSummary, SegmentInfo};
use xio_extract::Error;

use super::is_debug_enabled;

// Print the hint line in blue
pub fn print_quick_help() {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Blue)).set_intense(true));
    let _ = writeln!(&mut stderr, "Run with --debug (or RUST_LOG=trace) for details");
    let _ = stderr.reset();
}

pub fn print_export_complete(summary: &ExportSummary) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_intense(true));
    let _ = writeln!(
        &mut stdout,
        "Extraction complete | {} segment(s), {} setting(s), {} sample(s), {} file(s)",
        summary.segments,
        summary.messages,
        summary.samples,
        summary.files.len()
    );
    let _ = stdout.reset();

    if is_debug_enabled() {
        for path in &summary.files {
            let _ = writeln!(&mut stdout, "  {}", path.display());
        }
    }
}

pub fn print_failed(err: &Error) {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_intense(true));
    let _ = writeln!(&mut stderr, "Extraction failed | {}", err);
    let _ = stderr.reset();
    print_quick_help();
}

pub fn print_segment_info(index: usize, info: &SegmentInfo) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
    let _ = write!(&mut stdout, "segment {}", index);
    let _ = stdout.reset();
    let _ = writeln!(
        &mut stdout,
        ": {} setting(s), {} sample(s)",
        info.messages, info.samples
    );
    for addr in &info.addresses {
        let _ = writeln!(&mut stdout, "  {}", addr);
    }
}
