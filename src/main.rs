use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use recipe_reconcile::catalog::load_catalog;
use recipe_reconcile::config::ReconcileConfig;
use recipe_reconcile::pipeline::reconcile_sources;
use recipe_reconcile::sources::{load_records, SourceFormat};

/// Reconcile recipe sources against a nutrient catalog
#[derive(Debug, Parser)]
#[command(name = "recipe-reconcile", version)]
struct Cli {
    /// Nutrient catalog JSON (generic entries or USDA FoodData Central foods)
    #[arg(long, env = "RECONCILE_CATALOG")]
    catalog: PathBuf,

    /// Recipe source as FORMAT=PATH (formats: generic, mealdb, recipenlg); repeatable
    #[arg(long = "source", value_parser = parse_source, required = true)]
    sources: Vec<(SourceFormat, PathBuf)>,

    /// Link ingredient keys across sources
    #[arg(long)]
    link: bool,

    /// Write the JSON report here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, env = "RECONCILE_LOG_JSON")]
    json_logs: bool,
}

fn parse_source(value: &str) -> std::result::Result<(SourceFormat, PathBuf), String> {
    let (format, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected FORMAT=PATH, got '{}'", value))?;
    let format = format.parse::<SourceFormat>().map_err(|e| e.to_string())?;
    Ok((format, PathBuf::from(path)))
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.json_logs);

    info!("Starting recipe reconciliation");

    let config = ReconcileConfig::from_env().context("Invalid RECONCILE_* configuration")?;

    let catalog = load_catalog(&cli.catalog)
        .with_context(|| format!("Failed to load catalog {}", cli.catalog.display()))?;

    let mut inputs = Vec::with_capacity(cli.sources.len());
    for (format, path) in &cli.sources {
        let batch = load_records(*format, path)
            .with_context(|| format!("Failed to read {} source {}", format, path.display()))?;
        inputs.push((*format, batch));
    }

    let report = reconcile_sources(&catalog, &config, &inputs, cli.link);

    let writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, &report).context("Failed to write report")?;
    writeln!(writer)?;
    writer.flush()?;

    info!(
        "Reconciled {} sources against '{}' ({} links)",
        report.sources.len(),
        report.catalog,
        report.links.len()
    );

    Ok(())
}
