//! Data Processor Module
//! Turns the raw string table into typed city records and derives growth metrics.

use crate::config::DatasetConfig;
use crate::data::model::{CityRecord, UrbanTable};
use polars::prelude::*;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Missing column: {0}")]
    MissingColumn(String),
    #[error("Index column {index} out of range ({width} columns)")]
    IndexColumnOutOfRange { index: usize, width: usize },
    #[error("Reference year {0} not present in dataset")]
    MissingYear(i32),
    #[error("Row {row}: missing city name")]
    MissingCityName { row: usize },
    #[error("{city}: invalid number in column {column}: {value:?}")]
    InvalidNumber {
        city: String,
        column: String,
        value: String,
    },
}

/// Handles typing and transformation of the loaded table.
pub struct DataProcessor;

impl DataProcessor {
    /// Absolute and percentage growth between two populations.
    ///
    /// Percentage growth is `None` when the start population is zero.
    pub fn growth(start: f64, end: f64) -> (f64, Option<f64>) {
        let abs = end - start;
        let pct = if start == 0.0 {
            None
        } else {
            Some(abs / start * 100.0)
        };
        (abs, pct)
    }

    /// Parse a number that may carry thousands separators ("37 468.302").
    pub fn parse_number(raw: &str, thousands_separator: char) -> Option<f64> {
        let cleaned: String = raw
            .chars()
            .filter(|&c| c != thousands_separator && !is_group_space(c))
            .collect();
        if cleaned.is_empty() {
            return None;
        }
        cleaned.parse::<f64>().ok()
    }

    /// Build the typed table from a raw all-string DataFrame.
    pub fn build_table(df: &DataFrame, config: &DatasetConfig) -> Result<UrbanTable, ProcessorError> {
        let column_names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let key_column = column_names
            .get(config.index_column)
            .cloned()
            .ok_or(ProcessorError::IndexColumnOutOfRange {
                index: config.index_column,
                width: column_names.len(),
            })?;

        let years: Vec<(i32, String)> = column_names
            .iter()
            .filter_map(|name| year_of(name).map(|year| (year, name.clone())))
            .collect();
        for year in [config.start_year, config.end_year] {
            if !years.iter().any(|(y, _)| *y == year) {
                return Err(ProcessorError::MissingYear(year));
            }
        }

        let modelled = [
            key_column.as_str(),
            config.country_column.as_str(),
            config.latitude_column.as_str(),
            config.longitude_column.as_str(),
        ];
        let extra_columns: Vec<String> = column_names
            .iter()
            .filter(|name| !modelled.contains(&name.as_str()) && year_of(name).is_none())
            .cloned()
            .collect();

        let names = string_values(df, &key_column)?;
        let countries = string_values(df, &config.country_column)?;
        let latitudes = string_values(df, &config.latitude_column)?;
        let longitudes = string_values(df, &config.longitude_column)?;
        let year_values = years
            .iter()
            .map(|(_, name)| string_values(df, name))
            .collect::<Result<Vec<_>, _>>()?;
        let extra_values = extra_columns
            .iter()
            .map(|name| string_values(df, name))
            .collect::<Result<Vec<_>, _>>()?;

        let sep = config.thousands_separator;
        let mut records = Vec::with_capacity(df.height());
        let mut index = HashMap::with_capacity(df.height());

        for row in 0..df.height() {
            let name = names[row]
                .clone()
                .ok_or(ProcessorError::MissingCityName { row })?;
            let number = |values: &[Option<String>], column: &str| {
                let raw = values[row].as_deref().unwrap_or("");
                Self::parse_number(raw, sep).ok_or_else(|| ProcessorError::InvalidNumber {
                    city: name.clone(),
                    column: column.to_string(),
                    value: raw.to_string(),
                })
            };

            let latitude = number(&latitudes, &config.latitude_column)?;
            let longitude = number(&longitudes, &config.longitude_column)?;
            let mut populations = BTreeMap::new();
            for ((year, column), values) in years.iter().zip(&year_values) {
                populations.insert(*year, number(values, column)?);
            }

            // Both years were checked against the header above
            let start = populations[&config.start_year];
            let end = populations[&config.end_year];
            let (growth_abs, growth_pct) = Self::growth(start, end);
            if growth_pct.is_none() {
                warn!(city = %name, "zero population in {}, percentage growth undefined", config.start_year);
            }

            if index.contains_key(&name) {
                warn!(city = %name, "duplicate city name, lookups return the first row");
            } else {
                index.insert(name.clone(), row);
            }

            records.push(CityRecord {
                country: countries[row].clone().unwrap_or_default(),
                latitude,
                longitude,
                populations,
                extras: extra_values.iter().map(|values| values[row].clone()).collect(),
                growth_abs,
                growth_pct,
                name,
            });
        }

        Ok(UrbanTable {
            records,
            index,
            years: years.into_iter().map(|(year, _)| year).collect(),
            extra_columns,
            start_year: config.start_year,
            end_year: config.end_year,
        })
    }

    /// Convert the table back to a DataFrame with the derived columns appended.
    ///
    /// Output columns: ["city", "country", "latitude", "longitude", extras..., years..., "growth_abs", "growth_pct"]
    pub fn to_dataframe(table: &UrbanTable) -> Result<DataFrame, ProcessorError> {
        let records = table.records();
        let mut columns = vec![
            Column::new(
                "city".into(),
                records.iter().map(|r| r.name.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                "country".into(),
                records.iter().map(|r| r.country.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                "latitude".into(),
                records.iter().map(|r| r.latitude).collect::<Vec<_>>(),
            ),
            Column::new(
                "longitude".into(),
                records.iter().map(|r| r.longitude).collect::<Vec<_>>(),
            ),
        ];

        for (i, name) in table.extra_columns().iter().enumerate() {
            let values: Vec<Option<String>> = records.iter().map(|r| r.extras[i].clone()).collect();
            columns.push(Column::new(name.as_str().into(), values));
        }

        for &year in table.years() {
            let values: Vec<Option<f64>> = records.iter().map(|r| r.population(year)).collect();
            columns.push(Column::new(year.to_string().into(), values));
        }

        columns.push(Column::new("growth_abs".into(), table.growth_abs()));
        columns.push(Column::new(
            "growth_pct".into(),
            records.iter().map(|r| r.growth_pct).collect::<Vec<_>>(),
        ));

        Ok(DataFrame::new(columns)?)
    }
}

fn is_group_space(c: char) -> bool {
    matches!(c, ' ' | '\u{a0}' | '\u{202f}')
}

fn year_of(column: &str) -> Option<i32> {
    if column.len() == 4 && column.bytes().all(|b| b.is_ascii_digit()) {
        column.parse().ok()
    } else {
        None
    }
}

fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, ProcessorError> {
    let column = df
        .column(name)
        .map_err(|_| ProcessorError::MissingColumn(name.to_string()))?;
    let as_str = column.cast(&DataType::String)?;
    let ca = as_str.as_materialized_series().str()?;
    Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect())
}
