// Command-line entry point: analyze a text file (or stdin) and print the
// comprehensive detection result as JSON.
//
// Usage:
//   analyze_text [FILE] [--dimensions perplexity,burstiness,...] [--sequential]

use anyhow::{bail, Context, Result};
use origo::services::{AppConfig, ConfigStore};
use origo::{AggregationEngine, DimensionId};
use std::collections::BTreeMap;
use std::io::Read;
use tracing::warn;

struct CliArgs {
    file: Option<String>,
    dimensions: Option<Vec<DimensionId>>,
    sequential: bool,
}

fn parse_args() -> Result<CliArgs> {
    let mut args = std::env::args().skip(1);
    let mut parsed = CliArgs {
        file: None,
        dimensions: None,
        sequential: false,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--sequential" => parsed.sequential = true,
            "--dimensions" => {
                let value = args
                    .next()
                    .context("--dimensions requires a comma-separated list")?;
                let mut dims = Vec::new();
                for name in value.split(',') {
                    match DimensionId::parse(name) {
                        Some(dim) => dims.push(dim),
                        None => bail!("unknown dimension: {}", name),
                    }
                }
                parsed.dimensions = Some(dims);
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: analyze_text [FILE] [--dimensions a,b,c] [--sequential]\n\
                     Reads FILE (or stdin) and prints the comprehensive analysis as JSON."
                );
                std::process::exit(0);
            }
            other if parsed.file.is_none() && !other.starts_with('-') => {
                parsed.file = Some(other.to_string());
            }
            other => bail!("unrecognized argument: {}", other),
        }
    }

    Ok(parsed)
}

fn read_input(file: Option<&str>) -> Result<String> {
    match file {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))
        }
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    origo::init_logging();
    let args = parse_args()?;
    let text = read_input(args.file.as_deref())?;

    let config = match ConfigStore::default_config_dir() {
        Some(dir) => ConfigStore::new(dir).load().unwrap_or_else(|e| {
            warn!(error = %e, "config load failed, using defaults");
            AppConfig::default()
        }),
        None => AppConfig::default(),
    };

    let mut engine_config = config.detection.to_engine_config();
    if args.sequential {
        engine_config.parallel_enabled = false;
    }

    let engine = AggregationEngine::new(engine_config);
    if let Some(weights) = &config.weights {
        if let Err(e) = engine.update_weights(weights) {
            warn!(error = %e, "ignoring invalid weight overrides from config");
        }
    }

    let enabled: Option<BTreeMap<DimensionId, bool>> = args.dimensions.map(|dims| {
        DimensionId::ALL
            .iter()
            .map(|d| (*d, dims.contains(d)))
            .collect()
    });

    let result = engine
        .analyze_text_comprehensive(&text, enabled.as_ref())
        .await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
