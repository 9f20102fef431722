//! Stats module - summaries and rankings of growth metrics

mod calculator;

pub use calculator::StatsCalculator;
