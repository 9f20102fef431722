//! Table Export Module
//! Writes the derived city table to CSV.

use crate::data::model::UrbanTable;
use crate::data::processor::{DataProcessor, ProcessorError};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error(transparent)]
    Processor(#[from] ProcessorError),
}

pub struct TableExporter;

impl TableExporter {
    /// Write every input column plus `growth_abs` / `growth_pct` to a CSV file.
    pub fn write_csv(table: &UrbanTable, path: &Path) -> Result<(), ExportError> {
        let io_err = |source: std::io::Error| ExportError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut df = DataProcessor::to_dataframe(table)?;
        let mut file = File::create(path).map_err(io_err)?;
        CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;

        info!(rows = df.height(), "exported table to {}", path.display());
        Ok(())
    }
}
