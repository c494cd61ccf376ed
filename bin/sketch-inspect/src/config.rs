use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Clone, Debug, Parser)]
#[command(about)]
pub struct Cli {
    /// Path to the encoded sketch of successful observations.
    ///
    /// The file must hold a single protobuf-encoded `DDSketch` message.
    #[arg(long)]
    pub ok: PathBuf,

    /// Path to the encoded sketch of error observations.
    ///
    /// The file must hold a single protobuf-encoded `DDSketch` message, using the same index mapping as the `ok` sketch.
    #[arg(long)]
    pub err: PathBuf,

    /// Quantiles to compute for each summary, separated by commas.
    #[arg(long, value_delimiter = ',', value_parser = parse_quantile, default_values_t = [0.5, 0.9, 0.99])]
    pub quantiles: Vec<f64>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Output format of the rendered summaries.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,

    /// A single JSON document.
    Json,
}

fn parse_quantile(s: &str) -> Result<f64, String> {
    let q = s
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid quantile '{}': {}", s, e))?;
    if !(0.0..=1.0).contains(&q) {
        return Err(format!("quantile {} is outside of [0, 1]", q));
    }

    Ok(q)
}
