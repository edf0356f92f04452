//! NSx/NEV decoder CLI application.
//!
//! Decodes Blackrock and Ripple recording files and exports them as CSV.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, LevelFilter};
use nsx_core::{output, EventFile, Recording, RecordingFile};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Decoder for Blackrock NSx/NEV and Ripple NFx recording files.
///
/// The file family is detected from its contents; the suffix is only checked
/// for consistency.
#[derive(Parser, Debug)]
#[command(name = "nsx")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input .nsN, .nfN or .nev file path
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Write continuous samples to this CSV file
    ///
    /// One row per time sample, one column per channel. Only valid for
    /// continuous files.
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Keep 16-bit samples as raw digital values
    #[arg(short, long)]
    raw: bool,

    /// Write digital input packets to this CSV file
    ///
    /// Only valid for event files.
    #[arg(short, long, value_name = "PATH")]
    events: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(args: &Args) {
    let level = match (args.quiet, args.verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_secs()
        .init();
}

fn file_name(path: &Path) -> &std::ffi::OsStr {
    path.file_name().unwrap_or_default()
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    // Setup progress spinner
    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .context("Invalid progress template")?,
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };

    let start_time = Instant::now();

    progress.set_message(format!("Decoding {:?}...", file_name(&args.input)));

    let recording = nsx_core::open(&args.input, !args.raw)
        .with_context(|| format!("Failed to decode {:?}", args.input))?;

    info!(
        "Decoded {:?} in {:.2}s",
        args.input,
        start_time.elapsed().as_secs_f64()
    );

    match &recording {
        Recording::Continuous(file) => {
            if args.events.is_some() {
                bail!("--events needs an event (.nev) file");
            }
            if let Some(path) = &args.output {
                progress.set_message(format!("Writing to {:?}...", file_name(path)));
                output::write_samples_csv(path, &file.channels, &file.packets, file.header.period)
                    .context("Failed to write sample CSV")?;
            }
        }
        Recording::Events(file) => {
            if args.output.is_some() {
                bail!("Sample output needs a continuous (.nsN/.nfN) file");
            }
            if let Some(path) = &args.events {
                progress.set_message(format!("Writing to {:?}...", file_name(path)));
                output::write_digital_csv(path, file.digital_inputs())
                    .context("Failed to write digital input CSV")?;
            }
        }
    }

    let total_duration = start_time.elapsed();
    progress.finish_with_message(format!("Done in {:.2}s", total_duration.as_secs_f64()));

    if !args.quiet {
        eprintln!();
        eprintln!("Summary:");
        eprintln!("  Input:        {:?}", args.input);
        match &recording {
            Recording::Continuous(file) => print_continuous_summary(file),
            Recording::Events(file) => print_event_summary(file),
        }
        eprintln!("  Duration:     {:.3}s", total_duration.as_secs_f64());
    }

    Ok(())
}

fn print_continuous_summary(file: &RecordingFile) {
    let header = &file.header;
    eprintln!(
        "  Format:       {} v{}.{}",
        String::from_utf8_lossy(header.format.magic()),
        header.version.0,
        header.version.1
    );
    eprintln!("  Label:        {}", header.label);
    if !header.comments.is_empty() {
        eprintln!("  Comments:     {}", header.comments);
    }
    eprintln!("  Start:        {}", header.time_origin);
    eprintln!("  Rate:         {} Hz", header.sampling_frequency);
    eprintln!("  Channels:     {}", file.channels.len());
    eprintln!("  Packets:      {}", file.packets.len());
    eprintln!("  Samples:      {}", file.total_samples());
    if let Some(last) = file.packets.last() {
        let span = (last.num_samples() as u64).saturating_mul(u64::from(header.period));
        let end = last.timestamp.saturating_add(span);
        eprintln!("  Length:       {:.3}s", header.seconds(end));
    }
}

fn print_event_summary(file: &EventFile) {
    let header = &file.header;
    eprintln!(
        "  Format:       NEURALEV v{}.{}",
        header.version.0, header.version.1
    );
    eprintln!("  Application:  {}", header.application);
    if !header.comment.is_empty() {
        eprintln!("  Comment:      {}", header.comment);
    }
    eprintln!("  Start:        {}", header.time_origin);
    eprintln!("  Packet size:  {} bytes", header.packet_size);
    for (label, mode) in header.digital_labels() {
        eprintln!("  Digital port: {} ({:?})", label, mode);
    }
    eprintln!("  Digital in:   {}", file.digital_inputs().count());
}
