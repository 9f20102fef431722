use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for urban-growth
#[derive(Debug, Parser)]
#[command(
    name = "urban-growth",
    version,
    about = "Projected growth of cities over 300,000 inhabitants (UN WUP 2018)"
)]
pub struct CliArgs {
    /// JSON config file; flags below override it
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Path to the WUP2018 F22 CSV (default: data/WUP2018-F22-Cities_Over_300K_Annual.csv)
    #[arg(short = 'i', long = "input", global = true)]
    pub input: Option<PathBuf>,

    /// First reference year for growth (default: 2018)
    #[arg(long = "start-year", global = true)]
    pub start_year: Option<i32>,

    /// Second reference year for growth (default: 2035)
    #[arg(long = "end-year", global = true)]
    pub end_year: Option<i32>,

    /// Defaults to `map`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Save the static world map (SVG, or PNG by extension)
    Map {
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },

    /// Save the interactive globe as HTML
    Globe {
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,

        /// Open the page in the default browser
        #[arg(long)]
        open: bool,
    },

    /// Log growth statistics and the fastest growing cities
    Summary {
        /// Number of cities per ranking
        #[arg(short = 'n', long = "top")]
        top: Option<usize>,
    },

    /// Write the table with derived growth columns to CSV
    Export {
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
}
