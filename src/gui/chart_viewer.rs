//! Chart Viewer Widget
//! Central panel showing the four dashboard charts in a 2x2 grid.

use crate::charts::ChartPlotter;
use crate::data::{ChartPanel, ViewResult};
use egui::{Color32, RichText, ScrollArea};

/// Chart card configuration
const CHART_SPACING: f32 = 15.0;
const CARD_HEIGHT: f32 = 380.0;
const MIN_CARD_WIDTH: f32 = 420.0;

/// Displays the current dashboard view.
pub struct ChartViewer {
    pub view: ViewResult,
}

impl ChartViewer {
    pub fn new(view: ViewResult) -> Self {
        Self { view }
    }

    pub fn set_view(&mut self, view: ViewResult) {
        self.view = view;
    }

    /// Draw two rows of two cards, or the placeholder message.
    pub fn show(&self, ui: &mut egui::Ui) {
        let panels = match &self.view {
            ViewResult::Charts(panels) => panels,
            ViewResult::Placeholder(message) => {
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new(message).size(20.0));
                });
                return;
            }
        };

        ui.vertical_centered(|ui| {
            ui.label(
                RichText::new("Automobile Sales Statistics Dashboard")
                    .size(24.0)
                    .strong(),
            );
        });
        ui.add_space(CHART_SPACING);

        let card_width = ((ui.available_width() - CHART_SPACING * 3.0) / 2.0).max(MIN_CARD_WIDTH);

        ScrollArea::both()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (row, pair) in panels.chunks(2).enumerate() {
                    ui.horizontal(|ui| {
                        for (col, panel) in pair.iter().enumerate() {
                            Self::draw_chart_card(ui, panel, row * 2 + col, card_width);
                            ui.add_space(CHART_SPACING);
                        }
                    });
                    ui.add_space(CHART_SPACING);
                }
            });
    }

    fn draw_chart_card(ui: &mut egui::Ui, panel: &ChartPanel, id: usize, card_width: f32) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.5, Color32::from_rgb(100, 149, 237)))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(card_width - 24.0);
                ui.set_height(CARD_HEIGHT);

                ui.vertical(|ui| {
                    ui.label(RichText::new(&panel.title).size(16.0).strong());
                    ui.add_space(8.0);
                    ChartPlotter::draw_panel(ui, panel, id, CARD_HEIGHT - 40.0);
                });
            });
    }
}
