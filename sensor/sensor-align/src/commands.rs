//! Subcommand handlers.

use std::path::Path;

use anyhow::{Context, Result, bail};
use owo_colors::OwoColorize;
use sensor_align::{BatchConfig, PairSummary, StreamPair, run_pair};
use sensor_fusion::{
    AlignmentConfig, CanonicalRate, DuplicateHandling, FrequencySummary, Interpolator,
    aliasing_band, collapse_duplicates, detect_gaps, energy_above_cutoff, estimate_frequencies,
    fill_table_gaps, frequency_outliers, interpolate_onto, resample_to_rate,
};
use sensor_io::{read_series, read_table, write_series, write_table};
use sensor_types::{CellPolicy, TimeUnit};

use crate::AlignArgs;

/// Align one stream pair
pub(crate) fn align(args: &AlignArgs) -> Result<()> {
    let duplicates = if args.collapse {
        DuplicateHandling::Collapse
    } else {
        DuplicateHandling::Unique
    };
    let config = AlignmentConfig::new(
        args.gap_threshold,
        duplicates,
        args.rate.map(|hz| CanonicalRate::new(hz, args.unit)),
        Interpolator::new(args.method, args.boundary),
    );

    let pair = StreamPair::new(
        args.data
            .file_stem()
            .map_or_else(|| "pair".to_string(), |s| s.to_string_lossy().into_owned()),
        &args.reference,
        &args.data,
        &args.time_column,
        &args.columns,
        &args.out_reference,
        &args.out_data,
    )
    .with_duplicates(duplicates);

    let summary = run_pair(&pair, &config)
        .with_context(|| format!("aligning {}", args.data.display()))?;
    print_summary(&summary);
    Ok(())
}

/// Fill gaps in one stream, keeping non-time cells as written
pub(crate) fn fill(
    input: &Path,
    output: &Path,
    time_column: &str,
    gap_threshold: f64,
) -> Result<()> {
    let table = read_table(input).with_context(|| format!("reading {}", input.display()))?;
    let times = table
        .to_series(time_column, Some(&[]), CellPolicy::Strict)
        .with_context(|| format!("reading {}", input.display()))?;
    let gaps = detect_gaps(&times, gap_threshold)?;
    let filled = fill_table_gaps(&table, time_column, gap_threshold)?;
    write_table(output, &filled).with_context(|| format!("writing {}", output.display()))?;

    println!(
        "{} {} gap(s) filled, {} -> {} records",
        "✓".green(),
        gaps.len().bold(),
        table.len(),
        filled.len()
    );
    for gap in &gaps {
        println!(
            "  {} {} -> {} (delta {}, filled at {})",
            "gap".dimmed(),
            gap.start,
            gap.end,
            gap.delta(),
            gap.midpoint()
        );
    }
    Ok(())
}

/// Resample one stream to a fixed rate
pub(crate) fn resample(
    input: &Path,
    output: &Path,
    time_column: &str,
    rate: f64,
    unit: TimeUnit,
    collapse: bool,
) -> Result<()> {
    let policy = if collapse {
        CellPolicy::Lenient
    } else {
        CellPolicy::Strict
    };
    let mut series = read_series(input, time_column, None, policy)
        .with_context(|| format!("reading {}", input.display()))?;
    if collapse {
        series = collapse_duplicates(&series)?;
    }

    let resampled = resample_to_rate(&series, rate, unit)
        .with_context(|| format!("resampling {} at {rate} Hz", input.display()))?;
    write_series(output, &resampled).with_context(|| format!("writing {}", output.display()))?;

    println!(
        "{} {} records -> {} records at {} Hz",
        "✓".green(),
        series.len(),
        resampled.len().bold(),
        rate
    );
    Ok(())
}

/// Evaluate a stream at another stream's timestamps
pub(crate) fn interpolate(
    source: &Path,
    target: &Path,
    output: &Path,
    time_column: &str,
    columns: &[String],
    interpolator: Interpolator,
) -> Result<()> {
    let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
    let data = read_series(source, time_column, Some(&columns), CellPolicy::Strict)
        .with_context(|| format!("reading {}", source.display()))?;
    let timeline = read_series(target, time_column, Some(&[]), CellPolicy::Strict)
        .with_context(|| format!("reading {}", target.display()))?;

    let interpolated = interpolate_onto(&data, &columns, &timeline.times(), &interpolator)?
        .into_series(timeline.time_column(), timeline.time_kind())?;
    write_series(output, &interpolated)
        .with_context(|| format!("writing {}", output.display()))?;

    println!(
        "{} {} column(s) at {} timestamps ({}, {:?})",
        "✓".green(),
        columns.len(),
        interpolated.len().bold(),
        interpolator.method(),
        interpolator.boundary()
    );
    Ok(())
}

/// Report sampling-frequency stability
pub(crate) fn check_freq(
    input: &Path,
    time_column: &str,
    window: usize,
    unit: TimeUnit,
    resample_rate: Option<f64>,
) -> Result<()> {
    let series = read_series(input, time_column, Some(&[]), CellPolicy::Strict)
        .with_context(|| format!("reading {}", input.display()))?;
    let frequencies = estimate_frequencies(&series.times(), window, unit.ticks_per_second())?;
    let Some(summary) = FrequencySummary::from_frequencies(&frequencies) else {
        bail!("no frequency windows in {}", input.display());
    };

    println!();
    println!("{}", format!("Frequency of {}", input.display()).bold());
    println!("  windows        {}", summary.windows);
    println!("  mean           {:.3} Hz", summary.mean);
    println!("  std dev        {:.3} Hz", summary.std_dev);
    println!("  max deviation  {:.3} Hz", summary.max_deviation);

    let outliers = frequency_outliers(&frequencies);
    if outliers.is_empty() {
        println!("{}", "  ✓ no outlier windows".green());
    } else {
        println!("{}", format!("  ⚠ {} outlier window(s)", outliers.len()).yellow());
        for outlier in &outliers {
            println!("    window {:>6}  {:.3} Hz", outlier.window, outlier.hz);
        }
    }

    if let Some(rate) = resample_rate {
        match aliasing_band(summary.mean, rate) {
            Some((low, high)) => println!(
                "{}",
                format!("  ⚠ resampling to {rate} Hz aliases content in {low:.2}-{high:.2} Hz")
                    .yellow()
            ),
            None => println!("{}", format!("  ✓ {rate} Hz does not decimate").green()),
        }
    }
    println!();
    Ok(())
}

/// Report spectral energy above a cutoff
pub(crate) fn spectrum(
    input: &Path,
    time_column: &str,
    column: &str,
    sample_rate: f64,
    cutoff: f64,
) -> Result<()> {
    let series = read_series(input, time_column, Some(&[column]), CellPolicy::Strict)
        .with_context(|| format!("reading {}", input.display()))?;
    let signal = series.column_values(column)?;
    let ratio = energy_above_cutoff(&signal, sample_rate, cutoff)?;

    println!(
        "{}: {:.2}% of energy above {cutoff} Hz",
        column.bold(),
        ratio * 100.0
    );
    Ok(())
}

/// Run a batch manifest
pub(crate) fn batch(manifest: &Path, workers: Option<usize>) -> Result<()> {
    let mut batch = BatchConfig::from_file(manifest)
        .with_context(|| format!("loading {}", manifest.display()))?;
    if workers.is_some() {
        batch.workers = workers;
    }

    let outcomes = batch.run()?;
    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(summary) => print_summary(summary),
            Err(err) => {
                failed += 1;
                println!("{} {}: {}", "✗".red().bold(), outcome.name, err);
            }
        }
    }

    println!();
    if failed == 0 {
        println!(
            "{}",
            format!("✓ All {} pair(s) aligned", outcomes.len()).green().bold()
        );
        Ok(())
    } else {
        bail!("{failed} of {} pair(s) failed", outcomes.len())
    }
}

fn print_summary(summary: &PairSummary) {
    let report = &summary.report;
    println!(
        "{} {}: {} gap(s) filled, {} duplicate(s) removed, {} aligned rows -> {}",
        "✓".green(),
        summary.name.bold(),
        report.gaps_filled,
        report.duplicates_removed,
        report.aligned_len,
        summary.output_data.display()
    );
}
