//! Stats module - Recession impact statistics

mod calculator;

pub use calculator::{RecessionImpact, SampleStats, StatsCalculator};
