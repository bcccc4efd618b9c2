//! Control Panel Widget
//! Left side panel with the statistic and year selectors.

use crate::charts::ChartPlotter;
use crate::data::{DashboardAggregator, Selection, StatisticMode};
use crate::stats::RecessionImpact;
use egui::{Color32, ComboBox, RichText};

/// Left side control panel with selection controls, export and status.
pub struct ControlPanel {
    pub selection: Selection,
    pub years: Vec<i32>,
    pub source_label: String,
    pub row_count: usize,
    pub status: String,
    pub export_enabled: bool,
}

impl ControlPanel {
    /// Start on Yearly Statistics with `preferred_year` if present, else the latest year.
    pub fn new(
        years: Vec<i32>,
        preferred_year: Option<i32>,
        source_label: String,
        row_count: usize,
    ) -> Self {
        let year = preferred_year
            .filter(|y| years.contains(y))
            .or_else(|| years.last().copied());

        Self {
            selection: Selection {
                mode: Some(StatisticMode::Yearly),
                year,
            },
            years,
            source_label,
            row_count,
            status: "Ready".to_string(),
            export_enabled: false,
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui, impacts: &[RecessionImpact]) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🚗 Automobile Sales")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Statistics Dashboard")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(RichText::new(&self.source_label).size(11.0))
                    .on_hover_text(self.source_label.as_str());
                ui.label(
                    RichText::new(format!("{} rows, {} years", self.row_count, self.years.len()))
                        .size(11.0)
                        .color(Color32::GRAY),
                );
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Selection Section =====
        ui.label(RichText::new("⚙️ Report Type").size(14.0).strong());
        ui.add_space(8.0);

        let label_width = 80.0;
        let combo_width = 220.0;
        let before = self.selection;

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Statistics:"));
            let selected = self
                .selection
                .mode
                .map(StatisticMode::label)
                .unwrap_or("Select statistics");
            ComboBox::from_id_salt("statistic_mode")
                .width(combo_width)
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for mode in StatisticMode::ALL {
                        ui.selectable_value(&mut self.selection.mode, Some(mode), mode.label());
                    }
                });
        });

        ui.add_space(5.0);

        let year_enabled = !DashboardAggregator::year_selector_disabled(self.selection.mode);
        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Year:"));
            ui.add_enabled_ui(year_enabled, |ui| {
                let selected = self
                    .selection
                    .year
                    .map(|y| y.to_string())
                    .unwrap_or_else(|| "Select year".to_string());
                ComboBox::from_id_salt("select_year")
                    .width(combo_width * 0.5)
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        for year in &self.years {
                            ui.selectable_value(&mut self.selection.year, Some(*year), year.to_string());
                        }
                    });
            });
        });

        if self.selection != before {
            action = ControlPanelAction::SelectionChanged;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.export_enabled, |ui| {
                let button = egui::Button::new(RichText::new("🖼 Export PNG").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportPng;
                }
            });
        });

        ui.add_space(8.0);
        let status_color = if self.status.starts_with("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.starts_with("Exported") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Recession Impact Section =====
        ui.label(RichText::new("📉 Recession Impact").size(14.0).strong());
        ui.add_space(5.0);
        if impacts.is_empty() {
            ui.label(RichText::new("No vehicle types").color(Color32::GRAY));
        } else {
            ChartPlotter::draw_impact_table(ui, impacts);
        }

        action
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    SelectionChanged,
    ExportPng,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_configured_year_when_present() {
        let panel = ControlPanel::new(vec![2020, 2021, 2022, 2023], Some(2022), "x".into(), 4);
        assert_eq!(panel.selection.mode, Some(StatisticMode::Yearly));
        assert_eq!(panel.selection.year, Some(2022));
    }

    #[test]
    fn falls_back_to_latest_year() {
        let panel = ControlPanel::new(vec![1980, 1981], Some(2022), "x".into(), 2);
        assert_eq!(panel.selection.year, Some(1981));

        let empty = ControlPanel::new(Vec::new(), None, "x".into(), 0);
        assert_eq!(empty.selection.year, None);
    }
}
