//! CSV Data Loader Module
//! Reads the UN urban agglomeration table with Polars and hands it to the processor.

use crate::config::DatasetConfig;
use crate::data::model::UrbanTable;
use crate::data::processor::{DataProcessor, ProcessorError};
use polars::prelude::*;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Dataset not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Separator must be an ASCII character, got {0:?}")]
    InvalidSeparator(char),
    #[error(transparent)]
    Processor(#[from] ProcessorError),
}

/// Loads the dataset described by a `DatasetConfig`.
pub struct DataLoader {
    config: DatasetConfig,
}

impl DataLoader {
    pub fn new(config: DatasetConfig) -> Self {
        Self { config }
    }

    /// Read the raw table. Every column comes back as a string column so that
    /// thousands-separated numbers survive until the processor parses them.
    pub fn read_raw(&self) -> Result<DataFrame, LoaderError> {
        let path = &self.config.path;
        if !path.is_file() {
            return Err(LoaderError::NotFound(path.clone()));
        }
        let separator = self.config.separator;
        if !separator.is_ascii() {
            return Err(LoaderError::InvalidSeparator(separator));
        }

        let path_str = path.to_string_lossy().to_string();
        let df = LazyCsvReader::new(&path_str)
            .with_has_header(true)
            .with_skip_rows(self.config.skip_rows)
            .with_separator(separator as u8)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?;

        debug!(
            rows = df.height(),
            columns = df.width(),
            "read {}",
            path.display()
        );
        Ok(df)
    }

    /// Load the file and derive the growth columns.
    pub fn load(&self) -> Result<UrbanTable, LoaderError> {
        let df = self.read_raw()?;
        let table = DataProcessor::build_table(&df, &self.config)?;
        let (start, end) = table.reference_years();
        info!(
            cities = table.len(),
            years = table.years().len(),
            "loaded dataset, growth {}-{}",
            start,
            end
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const METADATA: &str = "United Nations\nPopulation Division\n";

    fn write_csv(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}{}", METADATA, body).unwrap();
        file
    }

    fn config_for(file: &NamedTempFile) -> DatasetConfig {
        DatasetConfig {
            path: file.path().to_path_buf(),
            skip_rows: 2,
            ..DatasetConfig::default()
        }
    }

    const HEADER: &str =
        "Index,Country Code,Country or area,City Code,Urban Agglomeration,Note,Latitude,Longitude,2018,2035\n";

    #[test]
    fn loads_and_derives_growth() {
        let file = write_csv(&format!(
            "{}1,392,Japan,21671,Tokyo,,35.6895,139.6917,37 468.302,36 014.211\n\
             2,356,India,21228,Delhi,,28.6667,77.2167,28 513.682,43 345.161\n",
            HEADER
        ));
        let table = DataLoader::new(config_for(&file)).load().unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.years(), &[2018, 2035]);

        let delhi = table.get("Delhi").unwrap();
        assert_eq!(delhi.country, "India");
        assert_eq!(delhi.population(2018), Some(28513.682));
        assert!((delhi.growth_abs - (43345.161 - 28513.682)).abs() < 1e-9);

        let tokyo = table.get("Tokyo").unwrap();
        assert!(tokyo.growth_abs < 0.0);
        assert!(tokyo.growth_pct.unwrap() < 0.0);
    }

    #[test]
    fn loading_twice_is_deterministic() {
        let file = write_csv(&format!(
            "{}1,392,Japan,21671,Tokyo,,35.6895,139.6917,37 468.302,36 014.211\n\
             2,356,India,21228,Delhi,,28.6667,77.2167,28 513.682,43 345.161\n",
            HEADER
        ));
        let loader = DataLoader::new(config_for(&file));
        let first = loader.load().unwrap();
        let second = loader.load().unwrap();
        assert_eq!(first.growth_abs(), second.growth_abs());
        assert_eq!(first.growth_pct(), second.growth_pct());
    }

    #[test]
    fn header_only_file_gives_empty_table() {
        let file = write_csv(HEADER);
        let table = DataLoader::new(config_for(&file)).load().unwrap();
        assert!(table.is_empty());

        let df = DataProcessor::to_dataframe(&table).unwrap();
        assert_eq!(df.height(), 0);
        assert!(df.column("growth_abs").is_ok());
        assert!(df.column("growth_pct").is_ok());
    }

    #[test]
    fn missing_file_is_reported() {
        let config = DatasetConfig {
            path: PathBuf::from("no/such/file.csv"),
            ..DatasetConfig::default()
        };
        let err = DataLoader::new(config).load().unwrap_err();
        assert!(matches!(err, LoaderError::NotFound(_)));
    }

    #[test]
    fn missing_reference_year_is_reported() {
        let file = write_csv(
            "Index,Country Code,Country or area,City Code,Urban Agglomeration,Note,Latitude,Longitude,2018,2030\n\
             1,392,Japan,21671,Tokyo,,35.6895,139.6917,37 468.302,36 574.000\n",
        );
        let err = DataLoader::new(config_for(&file)).load().unwrap_err();
        assert!(matches!(
            err,
            LoaderError::Processor(ProcessorError::MissingYear(2035))
        ));
    }

    #[test]
    fn non_ascii_separator_is_rejected() {
        let file = write_csv(HEADER);
        let config = DatasetConfig {
            separator: '§',
            ..config_for(&file)
        };
        let err = DataLoader::new(config).read_raw().unwrap_err();
        assert!(matches!(err, LoaderError::InvalidSeparator('§')));
    }
}
