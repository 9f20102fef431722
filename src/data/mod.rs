//! Data module - CSV loading, growth derivation and export

mod export;
mod loader;
mod model;
mod processor;

pub use export::TableExporter;
pub use loader::DataLoader;
pub use model::{CityRecord, GrowthMetric, UrbanTable};
pub use processor::DataProcessor;
