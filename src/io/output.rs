use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use rosc::{OscMessage, OscType};
use serde::Deserialize;

use crate::error::{Result, ValidationError};
use crate::osc::TimeTag;
use crate::segment::{Sample, Segment};

/// How bundle timetags are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampFormat {
    /// The 64-bit wire value, verbatim
    #[default]
    Raw,
    /// NTP seconds with fraction
    Seconds,
}

impl TimestampFormat {
    pub fn format(self, timetag: TimeTag) -> String {
        match self {
            TimestampFormat::Raw => timetag.to_string(),
            TimestampFormat::Seconds => format!("{:?}", timetag.seconds()),
        }
    }
}

/// Writes segments as headerless CSV, one file per sample address.
///
/// Values are joined with bare commas; commas inside string arguments are
/// not quoted.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    timestamps: TimestampFormat,
    settings_name: String,
}

impl Default for CsvExporter {
    fn default() -> Self {
        CsvExporter {
            timestamps: TimestampFormat::Raw,
            settings_name: "settings".to_string(),
        }
    }
}

impl CsvExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timestamps(mut self, format: TimestampFormat) -> Self {
        self.timestamps = format;
        self
    }

    /// File stem of the settings CSV.
    pub fn settings_name(mut self, name: impl Into<String>) -> Self {
        self.settings_name = name.into();
        self
    }

    /// Write `settings.csv` and one CSV per sample address into `dir`.
    ///
    /// All file names are resolved before anything is created; two
    /// addresses mapping to the same file is a [`ValidationError::NameCollision`].
    /// Files are then written one after another; if one fails the earlier
    /// ones stay on disk. Returns the paths written.
    pub fn write_segment(&self, segment: &Segment, dir: &Path) -> Result<Vec<PathBuf>> {
        let files = self.file_names(segment)?;
        let mut written = Vec::new();

        if !segment.messages.is_empty() {
            let path = dir.join(self.settings_file_name());
            let mut out = BufWriter::new(File::create(&path)?);
            self.write_settings(&mut out, &segment.messages)?;
            out.flush()?;
            tracing::debug!(path = %path.display(), rows = segment.messages.len(), "wrote settings");
            written.push(path);
        }

        for (addr, file) in files {
            let path = dir.join(file);
            let mut out = BufWriter::new(File::create(&path)?);
            let rows = self.write_samples(&mut out, segment.samples(addr))?;
            out.flush()?;
            tracing::debug!(path = %path.display(), rows, "wrote samples");
            written.push(path);
        }

        Ok(written)
    }

    fn settings_file_name(&self) -> String {
        format!("{}.csv", self.settings_name)
    }

    /// CSV file name per sample address, in first-seen order.
    fn file_names<'a>(
        &self,
        segment: &'a Segment,
    ) -> std::result::Result<Vec<(&'a str, String)>, ValidationError> {
        let mut taken = HashSet::new();
        if !segment.messages.is_empty() {
            taken.insert(self.settings_file_name());
        }
        let mut files = Vec::new();
        for addr in segment.addresses() {
            let file = csv_file_name(addr)?;
            if !taken.insert(file.clone()) {
                return Err(ValidationError::NameCollision {
                    address: addr.to_string(),
                    file,
                });
            }
            files.push((addr, file));
        }
        Ok(files)
    }

    /// One `address,arg1,arg2,...` row per message.
    pub fn write_settings<W: Write>(&self, out: &mut W, messages: &[OscMessage]) -> io::Result<()> {
        for msg in messages {
            write_row(out, &msg.addr, &msg.args)?;
        }
        Ok(())
    }

    /// One `timestamp,arg1,arg2,...` row per sample. Returns the row count.
    pub fn write_samples<'a, W, I>(&self, out: &mut W, samples: I) -> io::Result<usize>
    where
        W: Write,
        I: IntoIterator<Item = &'a Sample>,
    {
        let mut rows = 0;
        for sample in samples {
            write_row(out, &self.timestamps.format(sample.timetag), &sample.args)?;
            rows += 1;
        }
        Ok(rows)
    }
}

/// Plain-text listing: `# addr [args]` per setting, then
/// `timestamp addr [args]` per sample.
pub fn write_listing<W: Write>(
    out: &mut W,
    segment: &Segment,
    timestamps: TimestampFormat,
) -> io::Result<()> {
    for msg in &segment.messages {
        writeln!(out, "# {} [{}]", msg.addr, join_values(&msg.args, ", "))?;
    }
    for sample in &segment.bundles {
        writeln!(
            out,
            "{} {} [{}]",
            timestamps.format(sample.timetag),
            sample.addr,
            join_values(&sample.args, ", ")
        )?;
    }
    Ok(())
}

/// `/foo/bar` -> `foo.bar`
pub fn file_stem(address: &str) -> std::result::Result<String, ValidationError> {
    if !address.starts_with('/') {
        return Err(ValidationError::Address {
            address: address.to_string(),
        });
    }
    let stem = address.trim_matches('/').replace('/', ".");
    if stem.is_empty() {
        return Err(ValidationError::EmptyName {
            address: address.to_string(),
        });
    }
    Ok(stem)
}

/// `/foo/bar` -> `foo.bar.csv`
pub fn csv_file_name(address: &str) -> std::result::Result<String, ValidationError> {
    Ok(format!("{}.csv", file_stem(address)?))
}

/// Natural text form of an argument, without commas.
pub fn format_value(value: &OscType) -> String {
    match value {
        OscType::Int(v) => v.to_string(),
        OscType::Long(v) => v.to_string(),
        OscType::Float(v) => format!("{v:?}"),
        OscType::Double(v) => format!("{v:?}"),
        OscType::String(s) => s.clone(),
        OscType::Blob(bytes) => bytes.iter().map(|b| format!("{b:02x}")).collect(),
        OscType::Time(t) => TimeTag::from(t).to_string(),
        OscType::Char(c) => c.to_string(),
        OscType::Color(c) => format!("#{:02x}{:02x}{:02x}{:02x}", c.red, c.green, c.blue, c.alpha),
        OscType::Midi(m) => format!("{} {} {} {}", m.port, m.status, m.data1, m.data2),
        OscType::Bool(b) => b.to_string(),
        OscType::Array(a) => format!("[{}]", join_values(&a.content, " ")),
        OscType::Nil => String::new(),
        OscType::Inf => "inf".to_string(),
    }
}

fn join_values(values: &[OscType], sep: &str) -> String {
    values.iter().map(format_value).collect::<Vec<_>>().join(sep)
}

fn write_row<W: Write>(out: &mut W, first: &str, args: &[OscType]) -> io::Result<()> {
    out.write_all(first.as_bytes())?;
    for arg in args {
        write!(out, ",{}", format_value(arg))?;
    }
    out.write_all(b"\n")
}
