use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use xio_extract::extract;
use xio_extract::io::Capture;
use xio_extract::Result;

mod general;

use general::check;
use general::config::{get_config, load_config, set_config};

#[derive(Parser)]
#[command(name = "xio-extract")]
#[command(about = "Extract SLIP-framed OSC capture files into CSV")]
#[command(version)]
struct Cli {
    /// JSON config file (defaults to ./xio-extract.json when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging and per-file output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write one directory per segment with one CSV per OSC address
    Export {
        /// Capture file
        input: PathBuf,
        /// Output directory (created if missing)
        output: PathBuf,
    },

    /// Write all settings and samples as one text listing
    Dump {
        /// Capture file
        input: PathBuf,
        /// Listing file
        output: PathBuf,
    },

    /// Print the segments of a capture
    Info {
        /// Capture file
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            check::print_failed(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let debug = cli.debug || config.debug;
    general::set_debug(debug);
    general::init_logging(debug);
    tracing::debug!(?config, "configuration");
    set_config(config);
    let config = get_config();

    match cli.command {
        Commands::Export { input, output } => {
            let capture = Capture::open(&input)?.skip_empty(config.skip_empty_datagrams);
            let summary = extract::export_csv(&capture, &output, &config.exporter())?;
            check::print_export_complete(&summary);
        }
        Commands::Dump { input, output } => {
            let capture = Capture::open(&input)?.skip_empty(config.skip_empty_datagrams);
            let summary = extract::export_listing(&capture, &output, config.timestamp_format)?;
            check::print_export_complete(&summary);
        }
        Commands::Info { input } => {
            let capture = Capture::open(&input)?.skip_empty(config.skip_empty_datagrams);
            if general::is_debug_enabled() {
                println!("{}: {} datagram(s)", input.display(), capture.datagrams().len());
            }
            for (index, info) in extract::describe(&capture)?.iter().enumerate() {
                check::print_segment_info(index, info);
            }
        }
    }
    Ok(())
}
