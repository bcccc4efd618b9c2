//! Chart Plotter Module
//! Draws the dashboard panels interactively using egui_plot.

use crate::data::{AggregatedTable, ChartKind, ChartPanel, GroupedTable, PanelData};
use crate::stats::{RecessionImpact, SampleStats};
use egui::{Color32, RichText, Shape, Stroke};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};
use std::f64::consts::TAU;

pub const LINE_COLOR: Color32 = Color32::from_rgb(52, 152, 219); // Blue

pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(231, 76, 60),  // Red
    Color32::from_rgb(46, 204, 113), // Green
    Color32::from_rgb(155, 89, 182), // Purple
    Color32::from_rgb(243, 156, 18), // Orange
    Color32::from_rgb(26, 188, 156), // Teal
    Color32::from_rgb(233, 30, 99),  // Pink
    Color32::from_rgb(0, 188, 212),  // Cyan
    Color32::from_rgb(255, 87, 34),  // Deep Orange
    Color32::from_rgb(121, 85, 72),  // Brown
    Color32::from_rgb(96, 125, 139), // Blue Grey
];

/// Segments per full turn when tessellating pie slices.
const PIE_SEGMENTS: f64 = 180.0;

/// Label for an integer tick on a category axis; blank between categories.
pub fn category_label(labels: &[String], value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}

/// Angular extents (start, end) in radians of each pie slice, clockwise from 12 o'clock.
pub fn pie_slices(shares: &[f64]) -> Vec<(f64, f64)> {
    let mut start = -TAU / 4.0;
    shares
        .iter()
        .map(|share| {
            let end = start + share * TAU;
            let slice = (start, end);
            start = end;
            slice
        })
        .collect()
}

/// Creates the dashboard charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn series_color(index: usize) -> Color32 {
        PALETTE[index % PALETTE.len()]
    }

    /// Draw one panel according to its chart kind.
    pub fn draw_panel(ui: &mut egui::Ui, panel: &ChartPanel, id: usize, height: f32) {
        if panel.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No data").size(16.0).color(Color32::GRAY));
            });
            return;
        }

        match (&panel.data, panel.kind) {
            (PanelData::Table(table), ChartKind::Line) => {
                Self::draw_line_chart(ui, table, id, height)
            }
            (PanelData::Table(table), ChartKind::Pie) => Self::draw_pie_chart(ui, table, height),
            (PanelData::Table(table), _) => Self::draw_bar_chart(ui, table, id, height),
            (PanelData::Grouped(table), _) => Self::draw_grouped_bar_chart(ui, table, id, height),
        }
    }

    /// Line chart. Numeric keys (years) sit on a numeric axis, others on a category axis.
    pub fn draw_line_chart(ui: &mut egui::Ui, table: &AggregatedTable, id: usize, height: f32) {
        let numeric = table.rows.iter().all(|row| row.key.as_f64().is_some());
        let labels = table.labels();

        let points: Vec<[f64; 2]> = table
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let x = if numeric {
                    row.key.as_f64().unwrap_or(i as f64)
                } else {
                    i as f64
                };
                [x, row.value]
            })
            .collect();

        let mut plot = Plot::new(format!("line_{id}"))
            .height(height)
            .allow_scroll(false)
            .x_axis_label(table.key_label.clone())
            .y_axis_label(table.value_label.clone())
            .include_y(0.0);
        if !numeric {
            plot = plot.x_axis_formatter(move |mark, _range| category_label(&labels, mark.value));
        }

        let value_label = table.value_label.clone();
        plot.show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from_iter(points.iter().copied()))
                    .color(LINE_COLOR)
                    .width(2.0)
                    .name(value_label),
            );
            plot_ui.points(
                Points::new(PlotPoints::from_iter(points.iter().copied()))
                    .radius(3.0)
                    .color(LINE_COLOR),
            );
        });
    }

    /// Bar chart with one colored bar per key.
    pub fn draw_bar_chart(ui: &mut egui::Ui, table: &AggregatedTable, id: usize, height: f32) {
        let labels = table.labels();
        let bars: Vec<Bar> = table
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                Bar::new(i as f64, row.value)
                    .width(0.6)
                    .name(row.key.to_string())
                    .fill(Self::series_color(i))
            })
            .collect();

        Plot::new(format!("bar_{id}"))
            .height(height)
            .allow_scroll(false)
            .x_axis_label(table.key_label.clone())
            .y_axis_label(table.value_label.clone())
            .include_y(0.0)
            .x_axis_formatter(move |mark, _range| category_label(&labels, mark.value))
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).name(table.value_label.clone()));
            });
    }

    /// Bars keyed by the first column, one colored series per second-column value.
    pub fn draw_grouped_bar_chart(ui: &mut egui::Ui, table: &GroupedTable, id: usize, height: f32) {
        let keys = table.keys();
        let labels: Vec<String> = keys.iter().map(ToString::to_string).collect();
        let names = table.series_names();
        let slot = 0.8 / names.len().max(1) as f64;

        let charts: Vec<BarChart> = names
            .iter()
            .enumerate()
            .map(|(s, name)| {
                let color = Self::series_color(s);
                let offset = -0.4 + slot * (s as f64 + 0.5);
                let bars: Vec<Bar> = table
                    .series(name)
                    .into_iter()
                    .filter_map(|(key, value)| {
                        let x = keys.iter().position(|k| *k == key)? as f64 + offset;
                        Some(Bar::new(x, value).width(slot * 0.9).fill(color))
                    })
                    .collect();
                BarChart::new(bars).name(name).color(color)
            })
            .collect();

        Plot::new(format!("grouped_{id}"))
            .height(height)
            .allow_scroll(false)
            .legend(Legend::default())
            .x_axis_label(table.key_label.clone())
            .y_axis_label(table.value_label.clone())
            .include_y(0.0)
            .x_axis_formatter(move |mark, _range| category_label(&labels, mark.value))
            .show(ui, |plot_ui| {
                for chart in charts {
                    plot_ui.bar_chart(chart);
                }
            });
    }

    /// Pie chart painted directly, with a share legend beside it.
    pub fn draw_pie_chart(ui: &mut egui::Ui, table: &AggregatedTable, height: f32) {
        let shares = table.shares();
        if shares.is_empty() {
            ui.label(RichText::new("No positive values to chart").color(Color32::GRAY));
            return;
        }
        let fractions: Vec<f64> = shares.iter().map(|(_, share)| *share).collect();

        ui.horizontal(|ui| {
            let size = height.min(ui.available_width() * 0.6);
            let (rect, _) = ui.allocate_exact_size(egui::vec2(size, size), egui::Sense::hover());
            let center = rect.center();
            let radius = size as f64 * 0.45;
            let painter = ui.painter();

            for (i, (start, end)) in pie_slices(&fractions).into_iter().enumerate() {
                let color = Self::series_color(i);
                let steps = (((end - start) / TAU) * PIE_SEGMENTS).ceil().max(1.0) as usize;
                let point = |angle: f64| {
                    center + egui::vec2((radius * angle.cos()) as f32, (radius * angle.sin()) as f32)
                };
                // Fan of triangles keeps every polygon convex.
                for step in 0..steps {
                    let a0 = start + (end - start) * step as f64 / steps as f64;
                    let a1 = start + (end - start) * (step + 1) as f64 / steps as f64;
                    painter.add(Shape::convex_polygon(
                        vec![center, point(a0), point(a1)],
                        color,
                        Stroke::new(0.5, color),
                    ));
                }
                painter.line_segment([center, point(start)], Stroke::new(1.0, Color32::WHITE));
            }

            ui.add_space(12.0);
            ui.vertical(|ui| {
                for (i, (key, share)) in shares.iter().enumerate() {
                    ui.horizontal(|ui| {
                        let (swatch, _) =
                            ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
                        ui.painter().rect_filled(swatch, 3.0, Self::series_color(i));
                        ui.label(RichText::new(format!("{key}  {:.1}%", share * 100.0)).size(13.0));
                    });
                }
            });
        });
    }

    /// Recession vs. normal sales per vehicle type.
    pub fn draw_impact_table(ui: &mut egui::Ui, impacts: &[RecessionImpact]) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new("recession_impact_table")
                    .striped(true)
                    .min_col_width(45.0)
                    .spacing([8.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(RichText::new("Vehicle").strong().size(11.0));
                        ui.label(RichText::new("Rec. mean").strong().size(11.0));
                        ui.label(RichText::new("Normal mean").strong().size(11.0));
                        ui.label(RichText::new("Change").strong().size(11.0));
                        ui.label(RichText::new("P-value").strong().size(11.0));
                        ui.end_row();

                        let default_text_color = ui.visuals().text_color();

                        for impact in impacts {
                            let p_color = if impact.is_significant() {
                                Color32::from_rgb(220, 53, 69)
                            } else {
                                default_text_color
                            };

                            ui.label(RichText::new(&impact.vehicle_type).size(11.0))
                                .on_hover_text(format!(
                                    "Recession: {}\nNormal: {}",
                                    sample_summary(&impact.recession),
                                    sample_summary(&impact.normal)
                                ));
                            ui.label(RichText::new(fmt_number(impact.recession.mean)).size(11.0));
                            ui.label(RichText::new(fmt_number(impact.normal.mean)).size(11.0));
                            match impact.mean_change() {
                                Some(change) => ui.label(
                                    RichText::new(format!("{:+.1}%", change * 100.0)).size(11.0),
                                ),
                                None => ui.label(RichText::new("-").size(11.0)),
                            };
                            match impact.welch {
                                Some(test) if !test.p_value.is_nan() => {
                                    ui.label(
                                        RichText::new(format!("{:.4}", test.p_value))
                                            .size(11.0)
                                            .color(p_color),
                                    )
                                    .on_hover_text(format!("t = {:.2}, df = {:.1}", test.t, test.dof));
                                }
                                _ => {
                                    ui.label(RichText::new("-").size(11.0));
                                }
                            }
                            ui.end_row();
                        }
                    });
            });
    }
}

fn sample_summary(stats: &SampleStats) -> String {
    format!(
        "n = {}, median {}, std {}",
        stats.count,
        fmt_number(stats.median),
        fmt_number(stats.std)
    )
}

fn fmt_number(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.1}")
    } else {
        "-".to_string()
    }
}
