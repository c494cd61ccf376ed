//! Inspection tool for pairs of encoded DDSketches.
//!
//! Reads an "ok" and an "error" sketch from disk, converts them into rank summaries, and prints both summaries along
//! with the requested quantiles.

#![deny(warnings)]
#![deny(missing_docs)]

use std::{fmt::Write as _, path::Path};

use anyhow::{Context as _, Result};
use clap::Parser as _;
use ddsketch_gk::{ddsketch_to_gk, Entry, GkSummaries, RankSummary};
use serde::Serialize;
use tracing::{debug, error, info};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

mod config;
use self::config::{Cli, OutputFormat};

fn main() {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(true)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        error!("{:?}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let ok = read_payload(&cli.ok)?;
    let err = read_payload(&cli.err)?;

    let summaries = ddsketch_to_gk(&ok, &err).context("Failed to convert sketches.")?;
    info!(
        hits = summaries.hits.n(),
        errors = summaries.errors.n(),
        "Converted sketches."
    );

    let output = match cli.format {
        OutputFormat::Text => render_text(&summaries, &cli.quantiles)?,
        OutputFormat::Json => render_json(&summaries, &cli.quantiles)?,
    };
    println!("{}", output);

    Ok(())
}

fn read_payload(path: &Path) -> Result<Vec<u8>> {
    let payload = std::fs::read(path).with_context(|| format!("Failed to read sketch from '{}'.", path.display()))?;
    debug!(path = %path.display(), len = payload.len(), "Read sketch payload.");
    Ok(payload)
}

#[derive(Serialize)]
struct Report<'a> {
    hits: SummaryReport<'a>,
    errors: SummaryReport<'a>,
}

#[derive(Serialize)]
struct SummaryReport<'a> {
    n: u64,
    entries: &'a [Entry],
    quantiles: Vec<QuantileReport>,
}

#[derive(Serialize)]
struct QuantileReport {
    q: f64,
    value: Option<f64>,
}

impl<'a> SummaryReport<'a> {
    fn new(summary: &'a RankSummary, quantiles: &[f64]) -> Self {
        Self {
            n: summary.n(),
            entries: summary.entries(),
            quantiles: quantiles
                .iter()
                .map(|&q| QuantileReport {
                    q,
                    value: summary.quantile(q),
                })
                .collect(),
        }
    }
}

fn render_json(summaries: &GkSummaries, quantiles: &[f64]) -> Result<String> {
    let report = Report {
        hits: SummaryReport::new(&summaries.hits, quantiles),
        errors: SummaryReport::new(&summaries.errors, quantiles),
    };
    serde_json::to_string_pretty(&report).context("Failed to serialize summaries.")
}

fn render_text(summaries: &GkSummaries, quantiles: &[f64]) -> Result<String> {
    let mut output = String::new();
    for (name, summary) in [("hits", &summaries.hits), ("errors", &summaries.errors)] {
        writeln!(output, "{}: n={} entries={}", name, summary.n(), summary.len())?;
        for entry in summary.entries() {
            writeln!(output, "  v={} g={} delta={}", entry.v, entry.g, entry.delta)?;
        }
        for &q in quantiles {
            match summary.quantile(q) {
                Some(value) => writeln!(output, "  q{}={}", q, value)?,
                None => writeln!(output, "  q{}=none", q)?,
            }
        }
    }

    Ok(output.trim_end().to_string())
}
