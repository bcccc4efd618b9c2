//! Automobile Sales Statistics Dashboard
//!
//! Loads the historical automobile sales CSV once and shows yearly and
//! recession-period charts driven by two dropdowns.

mod charts;
mod config;
mod data;
mod gui;
mod stats;

use anyhow::Context;
use config::DashboardConfig;
use data::{DataSource, SalesDataLoader};
use eframe::egui;
use gui::DashboardApp;
use stats::StatsCalculator;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::EnvFilter;

const APP_TITLE: &str = "Automobile Sales Statistics Dashboard";

/// Initializes the tracing subscriber. `RUST_LOG` overrides the default INFO level.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("autosales_dashboard=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run() -> anyhow::Result<()> {
    let config = DashboardConfig::load().context("failed to load configuration")?;

    // Startup load is fatal on failure; the table is immutable afterwards.
    let source = DataSource::parse(&config.data_source);
    let loader = SalesDataLoader::new(Duration::from_secs(config.fetch_timeout_secs));
    let table = Arc::new(
        loader
            .load(&source)
            .with_context(|| format!("failed to load sales data from {source}"))?,
    );
    let impacts = StatsCalculator::recession_impact(&table);

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_min_inner_size([1100.0, 700.0])
            .with_title(APP_TITLE),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(move |cc| Ok(Box::new(DashboardApp::new(cc, table, impacts, config)))),
    )
    .map_err(|e| anyhow::anyhow!("dashboard window failed: {e}"))
}

fn main() -> ExitCode {
    init_logging();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
