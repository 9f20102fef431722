//! Urban Growth - UN World Urbanization Prospects city growth maps
//!
//! Loads the WUP2018 table of urban agglomerations, derives absolute and
//! relative growth between two years and renders a world map or a globe.

mod charts;
mod cli;
mod config;
mod data;
mod stats;

use anyhow::{Context, Result};
use charts::{GlobeWriter, LayoutOverrides, StaticMapRenderer};
use clap::Parser;
use cli::{CliArgs, Commands};
use config::AppConfig;
use data::{DataLoader, GrowthMetric, TableExporter, UrbanTable};
use stats::StatsCalculator;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env).with_target(false).init();

    let args = CliArgs::parse();
    let config = resolve_config(&args)?;

    let table = DataLoader::new(config.dataset.clone())
        .load()
        .with_context(|| format!("loading {}", config.dataset.path.display()))?;

    match args.command.unwrap_or(Commands::Map { output: None }) {
        Commands::Map { output } => {
            let path = output.unwrap_or(config.output.map_path);
            StaticMapRenderer::render_to_file(&table, &path, config.output.map_size)
                .context("rendering static map")?;
        }
        Commands::Globe { output, open } => {
            let overrides = LayoutOverrides::from(&config.output);
            let path = output.unwrap_or(config.output.globe_path);
            GlobeWriter::write(
                &table,
                &path,
                &overrides,
                open || config.output.auto_open,
            )
            .context("writing globe")?;
        }
        Commands::Summary { top } => {
            summarize(&table, top.unwrap_or(config.output.top_n));
        }
        Commands::Export { output } => {
            let path = output.unwrap_or(config.output.export_path);
            TableExporter::write_csv(&table, &path).context("exporting table")?;
        }
    }
    Ok(())
}

/// Config file (if any) with command line overrides applied.
fn resolve_config(args: &CliArgs) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => AppConfig::default(),
    };

    if let Some(input) = &args.input {
        config.dataset.path = input.clone();
    }
    if let Some(year) = args.start_year {
        config.dataset.start_year = year;
    }
    if let Some(year) = args.end_year {
        config.dataset.end_year = year;
    }
    config.validate()?;
    Ok(config)
}

/// Log growth summaries and rankings; returns how many cities have no
/// relative growth.
fn summarize(table: &UrbanTable, top_n: usize) -> usize {
    let (start, end) = table.reference_years();
    info!(cities = table.len(), "growth {}-{}", start, end);

    for metric in [GrowthMetric::Absolute, GrowthMetric::Percent] {
        let s = StatsCalculator::summarize_metric(table, metric);
        info!(
            count = s.count,
            mean = s.mean,
            median = s.median,
            min = s.min,
            max = s.max,
            p01 = s.p01,
            p95 = s.p95,
            "{}",
            metric.label()
        );

        for (rank, city) in StatsCalculator::top_by(table, metric, top_n)
            .into_iter()
            .enumerate()
        {
            info!("  {:>2}. {}", rank + 1, charts::hover_label(city));
        }
    }

    let undefined = table.len() - table.growth_pct().len();
    if undefined > 0 {
        info!(
            cities = undefined,
            "no relative growth (zero population in {})", start
        );
    }
    undefined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetConfig;
    use crate::data::DataProcessor;
    use polars::prelude::*;
    use std::path::PathBuf;

    #[test]
    fn no_arguments_reproduce_default_run() {
        let args = CliArgs::parse_from(["urban-growth"]);
        assert!(args.command.is_none());
        let config = resolve_config(&args).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn flags_override_config() {
        let args = CliArgs::parse_from([
            "urban-growth",
            "globe",
            "--open",
            "-i",
            "cities.csv",
            "--start-year",
            "2000",
        ]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.dataset.path, PathBuf::from("cities.csv"));
        assert_eq!(config.dataset.start_year, 2000);
        assert_eq!(config.dataset.end_year, 2035);
        assert!(matches!(
            args.command,
            Some(Commands::Globe { open: true, .. })
        ));
    }

    #[test]
    fn reversed_years_are_rejected() {
        let args = CliArgs::parse_from(["urban-growth", "--start-year", "2040"]);
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn summary_counts_cities_without_relative_growth() {
        let df = DataFrame::new(vec![
            Column::new("Index".into(), vec!["1", "2", "3"]),
            Column::new("Country or area".into(), vec!["India", "Japan", "Nowhere"]),
            Column::new("Latitude".into(), vec!["28.6667", "35.6895", "0"]),
            Column::new("Longitude".into(), vec!["77.2167", "139.6917", "0"]),
            Column::new("Urban Agglomeration".into(), vec!["Delhi", "Tokyo", "Newtown"]),
            Column::new("2018".into(), vec!["28 513.682", "37 468.302", "0"]),
            Column::new("2035".into(), vec!["43 345.161", "36 014.211", "500"]),
        ])
        .unwrap();
        let table = DataProcessor::build_table(&df, &DatasetConfig::default()).unwrap();

        assert_eq!(summarize(&table, 10), 1);
        assert_eq!(summarize(&table, 0), 1);
        assert_eq!(summarize(&UrbanTable::default(), 5), 0);
    }
}
