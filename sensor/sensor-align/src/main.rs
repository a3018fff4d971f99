//! Sensor stream alignment tool.
//!
//! # Commands
//!
//! - `sensor-align align` - Fill, normalize and align one stream pair
//! - `sensor-align fill` - Fill timestamp gaps in a reference stream
//! - `sensor-align resample` - Resample a stream to a fixed rate
//! - `sensor-align interpolate` - Evaluate a stream at another stream's timestamps
//! - `sensor-align check-freq` - Report sampling-frequency stability
//! - `sensor-align spectrum` - Report spectral energy above a cutoff
//! - `sensor-align batch` - Run a JSON manifest of stream pairs in parallel
//!
//! Logging goes to stderr. `-v` raises the level (warn, info, debug, trace);
//! `RUST_LOG` overrides it.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use sensor_fusion::{BoundaryPolicy, InterpolationMethod, Interpolator};
use sensor_types::TimeUnit;
use tracing_subscriber::EnvFilter;

/// Align camera and inertial sensor streams onto one time base
#[derive(Parser)]
#[command(name = "sensor-align")]
#[command(about = "Align sensor streams onto a common time base", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Arguments of `sensor-align align`
#[derive(Args)]
struct AlignArgs {
    /// Reference stream (camera frame timestamps)
    #[arg(long)]
    reference: PathBuf,

    /// Data stream (inertial or phone sensor)
    #[arg(long)]
    data: PathBuf,

    /// Time column shared by both files
    #[arg(long, default_value = "time_ms_loc")]
    time_column: String,

    /// Data columns to align, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    columns: Vec<String>,

    /// Reference gap threshold in reference time units
    #[arg(long, default_value_t = 40.0)]
    gap_threshold: f64,

    /// Average records that share a timestamp in the data stream
    #[arg(long)]
    collapse: bool,

    /// Resample the data stream to this rate (Hz) before aligning
    #[arg(long)]
    rate: Option<f64>,

    /// Unit of the data stream's time column (ns, us, ms, s)
    #[arg(long, default_value = "ns", value_parser = parse_unit)]
    unit: TimeUnit,

    /// Interpolation method (linear, nearest, previous, next, cubic, natural_cubic)
    #[arg(long, default_value = "linear")]
    method: InterpolationMethod,

    /// Out-of-range policy (reject, clamp, extrapolate, nan, fill:<value>)
    #[arg(long, default_value = "nan")]
    boundary: BoundaryPolicy,

    /// Where to write the gap-filled reference
    #[arg(long)]
    out_reference: PathBuf,

    /// Where to write the aligned data
    #[arg(long)]
    out_data: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill reference gaps and align a data stream onto the filled timestamps
    Align(AlignArgs),

    /// Insert one midpoint record into every gap wider than the threshold
    Fill {
        /// Input stream
        #[arg(name = "INPUT")]
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Time column
        #[arg(long, default_value = "time_ms_loc")]
        time_column: String,

        /// Gap threshold in the stream's time units
        #[arg(long, default_value_t = 40.0)]
        gap_threshold: f64,
    },

    /// Resample a stream onto a uniform timeline
    Resample {
        /// Input stream
        #[arg(name = "INPUT")]
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Time column
        #[arg(long, default_value = "timestamp")]
        time_column: String,

        /// Target rate in Hz
        #[arg(long, default_value_t = 60.0)]
        rate: f64,

        /// Unit of the time column (ns, us, ms, s)
        #[arg(long, default_value = "ns", value_parser = parse_unit)]
        unit: TimeUnit,

        /// Average records that share a timestamp first
        #[arg(long)]
        collapse: bool,
    },

    /// Evaluate a stream's columns at another stream's timestamps
    Interpolate {
        /// Stream providing the values
        #[arg(long)]
        source: PathBuf,

        /// Stream providing the timestamps
        #[arg(long)]
        target: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Time column shared by both files
        #[arg(long, default_value = "time_ms_loc")]
        time_column: String,

        /// Source columns to interpolate, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        columns: Vec<String>,

        /// Interpolation method (linear, nearest, previous, next, cubic, natural_cubic)
        #[arg(long, default_value = "linear")]
        method: InterpolationMethod,

        /// Out-of-range policy (reject, clamp, extrapolate, nan, fill:<value>)
        #[arg(long, default_value = "nan")]
        boundary: BoundaryPolicy,
    },

    /// Estimate sampling frequency over sliding windows and flag outliers
    CheckFreq {
        /// Input stream
        #[arg(name = "INPUT")]
        input: PathBuf,

        /// Time column
        #[arg(long, default_value = "timestamp")]
        time_column: String,

        /// Timestamps per window
        #[arg(long, default_value_t = 100)]
        window: usize,

        /// Unit of the time column (ns, us, ms, s)
        #[arg(long, default_value = "ns", value_parser = parse_unit)]
        unit: TimeUnit,

        /// Planned resample rate (Hz), to report the aliasing band
        #[arg(long)]
        resample_rate: Option<f64>,
    },

    /// Report the share of spectral energy above a cutoff frequency
    Spectrum {
        /// Input stream
        #[arg(name = "INPUT")]
        input: PathBuf,

        /// Time column
        #[arg(long, default_value = "timestamp")]
        time_column: String,

        /// Column to analyze
        #[arg(long)]
        column: String,

        /// Sampling rate of the column in Hz
        #[arg(long)]
        sample_rate: f64,

        /// Cutoff frequency in Hz
        #[arg(long)]
        cutoff: f64,
    },

    /// Run every stream pair of a JSON manifest on a worker pool
    Batch {
        /// Manifest file
        #[arg(name = "MANIFEST")]
        manifest: PathBuf,

        /// Worker threads, overriding the manifest (0 = one per CPU)
        #[arg(long)]
        workers: Option<usize>,
    },
}

fn parse_unit(name: &str) -> std::result::Result<TimeUnit, String> {
    TimeUnit::from_short_name(name)
        .ok_or_else(|| format!("unknown time unit '{name}' (expected ns, us, ms or s)"))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Align(args) => commands::align(&args),
        Commands::Fill {
            input,
            output,
            time_column,
            gap_threshold,
        } => commands::fill(&input, &output, &time_column, gap_threshold),
        Commands::Resample {
            input,
            output,
            time_column,
            rate,
            unit,
            collapse,
        } => commands::resample(&input, &output, &time_column, rate, unit, collapse),
        Commands::Interpolate {
            source,
            target,
            output,
            time_column,
            columns,
            method,
            boundary,
        } => commands::interpolate(
            &source,
            &target,
            &output,
            &time_column,
            &columns,
            Interpolator::new(method, boundary),
        ),
        Commands::CheckFreq {
            input,
            time_column,
            window,
            unit,
            resample_rate,
        } => commands::check_freq(&input, &time_column, window, unit, resample_rate),
        Commands::Spectrum {
            input,
            time_column,
            column,
            sample_rate,
            cutoff,
        } => commands::spectrum(&input, &time_column, &column, sample_rate, cutoff),
        Commands::Batch { manifest, workers } => commands::batch(&manifest, workers),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn align_arguments_parse() {
        let cli = Cli::try_parse_from([
            "sensor-align",
            "align",
            "--reference",
            "cam.csv",
            "--data",
            "imu.csv",
            "--columns",
            "x,y",
            "--method",
            "natural_cubic",
            "--boundary",
            "clamp",
            "--out-reference",
            "out/cam.csv",
            "--out-data",
            "out/imu.csv",
        ])
        .unwrap();

        let Commands::Align(args) = cli.command else {
            panic!("expected the align subcommand");
        };
        assert_eq!(args.columns, ["x", "y"]);
        assert_eq!(args.method, InterpolationMethod::NaturalCubic);
        assert_eq!(args.boundary, BoundaryPolicy::Clamp);
        assert_eq!(args.unit, TimeUnit::Nanoseconds);
        assert!(!args.collapse);
    }
}
