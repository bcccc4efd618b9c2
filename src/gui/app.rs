//! Dashboard Main Application
//! Main window with control panel and chart viewer.

use crate::charts::StaticChartRenderer;
use crate::config::DashboardConfig;
use crate::data::{DashboardAggregator, SalesTable, Selection};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::stats::RecessionImpact;
use egui::SidePanel;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Main application window.
pub struct DashboardApp {
    table: Arc<SalesTable>,
    impacts: Vec<RecessionImpact>,
    config: DashboardConfig,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
}

impl DashboardApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        table: Arc<SalesTable>,
        impacts: Vec<RecessionImpact>,
        config: DashboardConfig,
    ) -> Self {
        let default_year = config.default_year.filter(|year| {
            let present = table.contains_year(*year);
            if !present {
                warn!(year, "configured default year not in data, using latest");
            }
            present
        });
        let control_panel = ControlPanel::new(
            table.years().to_vec(),
            default_year,
            config.data_source.clone(),
            table.row_count(),
        );
        let view = Self::compute(&table, control_panel.selection);
        let mut app = Self {
            table,
            impacts,
            config,
            control_panel,
            chart_viewer: ChartViewer::new(view),
        };
        app.sync_export_state();
        app
    }

    fn compute(table: &SalesTable, selection: Selection) -> crate::data::ViewResult {
        DashboardAggregator::compute_view(table, selection.mode, selection.year)
    }

    /// Recompute the view for the current selection.
    fn handle_selection_changed(&mut self) {
        let selection = self.control_panel.selection;
        debug!(?selection, "selection changed");
        self.chart_viewer
            .set_view(Self::compute(&self.table, selection));
        self.sync_export_state();
    }

    fn sync_export_state(&mut self) {
        self.control_panel.export_enabled = !self.chart_viewer.view.is_placeholder();
    }

    /// Handle PNG export - render charts to memory and write the chosen file
    fn handle_export_png(&mut self) {
        let output_path = match rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name("automobile_sales_dashboard.png")
            .save_file()
        {
            Some(path) => path,
            None => return, // User cancelled
        };

        let png = match StaticChartRenderer::render_view_png(
            &self.chart_viewer.view,
            self.config.export_width,
            self.config.export_height,
        ) {
            Ok(png) => png,
            Err(e) => {
                error!(error = %e, "chart export failed");
                self.control_panel.set_status(format!("Error: {e}"));
                return;
            }
        };

        if let Err(e) = std::fs::write(&output_path, &png) {
            error!(path = %output_path.display(), error = %e, "failed to write export");
            self.control_panel.set_status(format!("Error: {e}"));
            return;
        }

        info!(path = %output_path.display(), bytes = png.len(), "dashboard exported");
        self.control_panel
            .set_status(format!("Exported {}", output_path.display()));

        if self.config.open_after_export {
            if let Err(e) = open::that(&output_path) {
                warn!(error = %e, "could not open exported image");
            }
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(340.0)
            .max_width(420.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui, &self.impacts);

                    match action {
                        ControlPanelAction::SelectionChanged => self.handle_selection_changed(),
                        ControlPanelAction::ExportPng => self.handle_export_png(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui);
        });
    }
}
