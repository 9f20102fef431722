//! Configuration Module
//! Dataset layout and output settings, loaded from an optional JSON file.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Start year {start} must be before end year {end}")]
    InvalidYears { start: i32, end: i32 },
}

/// Layout of the WUP2018 F22 table as exported to CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub path: PathBuf,
    /// Metadata lines above the header row
    pub skip_rows: usize,
    /// Zero-based position of the city name column
    pub index_column: usize,
    pub separator: char,
    pub thousands_separator: char,
    pub country_column: String,
    pub latitude_column: String,
    pub longitude_column: String,
    pub start_year: i32,
    pub end_year: i32,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/WUP2018-F22-Cities_Over_300K_Annual.csv"),
            skip_rows: 16,
            index_column: 4,
            separator: ',',
            thousands_separator: ' ',
            country_column: "Country or area".to_string(),
            latitude_column: "Latitude".to_string(),
            longitude_column: "Longitude".to_string(),
            start_year: 2018,
            end_year: 2035,
        }
    }
}

/// Where and how rendered output is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub map_path: PathBuf,
    pub globe_path: PathBuf,
    pub export_path: PathBuf,
    /// 16x8 inches at 140 dpi
    pub map_size: (u32, u32),
    pub auto_open: bool,
    pub top_n: usize,
    /// Plotly layout keys replacing the globe defaults
    pub globe_layout: Map<String, Value>,
    /// Same for the layout's `geo` object
    pub globe_geo: Map<String, Value>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            map_path: PathBuf::from("graphics/wup-urban-growth.svg"),
            globe_path: PathBuf::from("graphics/wup-urban-growth.html"),
            export_path: PathBuf::from("graphics/wup-urban-growth.csv"),
            map_size: (2240, 1120),
            auto_open: false,
            top_n: 10,
            globe_layout: Map::new(),
            globe_geo: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dataset: DatasetConfig,
    pub output: OutputConfig,
}

impl AppConfig {
    /// Load config from a JSON file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let DatasetConfig {
            start_year,
            end_year,
            ..
        } = self.dataset;
        if start_year >= end_year {
            return Err(ConfigError::InvalidYears {
                start: start_year,
                end: end_year,
            });
        }
        Ok(())
    }
}
