//! City table types.

use std::collections::{BTreeMap, HashMap};

/// One urban agglomeration with its yearly populations (thousands).
#[derive(Debug, Clone, PartialEq)]
pub struct CityRecord {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub populations: BTreeMap<i32, f64>,
    /// Unmodelled columns (codes, notes), aligned with `UrbanTable::extra_columns`
    pub extras: Vec<Option<String>>,
    pub growth_abs: f64,
    /// `None` when the start-year population is zero
    pub growth_pct: Option<f64>,
}

impl CityRecord {
    pub fn population(&self, year: i32) -> Option<f64> {
        self.populations.get(&year).copied()
    }
}

/// Which derived metric to rank or summarize on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthMetric {
    Absolute,
    Percent,
}

impl GrowthMetric {
    pub fn value(&self, record: &CityRecord) -> Option<f64> {
        match self {
            GrowthMetric::Absolute => Some(record.growth_abs),
            GrowthMetric::Percent => record.growth_pct,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GrowthMetric::Absolute => "absolute growth (thousands)",
            GrowthMetric::Percent => "relative growth (%)",
        }
    }
}

/// All cities of one dataset, in file order, indexed by name.
#[derive(Debug, Clone, Default)]
pub struct UrbanTable {
    pub(crate) records: Vec<CityRecord>,
    pub(crate) index: HashMap<String, usize>,
    pub(crate) years: Vec<i32>,
    pub(crate) extra_columns: Vec<String>,
    pub(crate) start_year: i32,
    pub(crate) end_year: i32,
}

impl UrbanTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[CityRecord] {
        &self.records
    }

    /// Look up a city by name. With duplicate names the first row wins.
    pub fn get(&self, name: &str) -> Option<&CityRecord> {
        self.index.get(name).map(|&i| &self.records[i])
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    pub fn reference_years(&self) -> (i32, i32) {
        (self.start_year, self.end_year)
    }

    pub fn growth_abs(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.growth_abs).collect()
    }

    /// Defined percentage growth values only.
    pub fn growth_pct(&self) -> Vec<f64> {
        self.records.iter().filter_map(|r| r.growth_pct).collect()
    }
}
