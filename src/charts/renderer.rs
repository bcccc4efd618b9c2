//! Static Chart Renderer
//! Renders the four dashboard panels into a single PNG.
//!
//! Layout: 2x2 grid in panel order
//! 1. top-left, 2. top-right, 3. bottom-left, 4. bottom-right

use crate::charts::plotter::{category_label, pie_slices};
use crate::data::{AggregatedTable, ChartKind, ChartPanel, GroupedTable, PanelData, ViewResult};
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::f64::consts::TAU;
use std::io::Cursor;
use thiserror::Error;

const PALETTE: [RGBColor; 10] = [
    RGBColor(231, 76, 60),
    RGBColor(46, 204, 113),
    RGBColor(155, 89, 182),
    RGBColor(243, 156, 18),
    RGBColor(26, 188, 156),
    RGBColor(233, 30, 99),
    RGBColor(0, 188, 212),
    RGBColor(255, 87, 34),
    RGBColor(121, 85, 72),
    RGBColor(96, 125, 139),
];
const LINE_COLOR: RGBColor = RGBColor(52, 152, 219);
const FONT: &str = "sans-serif";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Nothing to export: {0}")]
    NothingToRender(String),
    #[error("Invalid export size {0}x{1}")]
    InvalidSize(u32, u32),
    #[error("Chart drawing failed: {0}")]
    Draw(String),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

fn color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// Value axis range with headroom; always includes zero.
fn value_range(values: impl Iterator<Item = f64>) -> std::ops::Range<f64> {
    let (min, max) = values.fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let max = if max > 0.0 { max * 1.1 } else { 1.0 };
    let min = if min < 0.0 { min * 1.1 } else { 0.0 };
    min..max
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render all panels of `view` to PNG bytes.
    pub fn render_view_png(view: &ViewResult, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
        let panels = match view {
            ViewResult::Charts(panels) => panels,
            ViewResult::Placeholder(message) => {
                return Err(RenderError::NothingToRender(message.clone()))
            }
        };
        if width < 200 || height < 200 {
            return Err(RenderError::InvalidSize(width, height));
        }

        let mut buffer = vec![0u8; (width as usize) * (height as usize) * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;
            let areas = root.split_evenly((2, 2));
            for (area, panel) in areas.iter().zip(panels.iter()) {
                Self::draw_panel(area, panel)?;
            }
            root.present().map_err(draw_err)?;
        }

        let image = RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| RenderError::Draw("bitmap buffer size mismatch".to_string()))?;
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(png)
    }

    fn draw_panel<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        panel: &ChartPanel,
    ) -> Result<(), RenderError> {
        let area = area.margin(10, 10, 10, 10);
        if panel.is_empty() {
            let inner = area.titled(&panel.title, (FONT, 20)).map_err(draw_err)?;
            let (w, h) = inner.dim_in_pixel();
            inner
                .draw(&Text::new("No data", (w as i32 / 2 - 30, h as i32 / 2), (FONT, 16)))
                .map_err(draw_err)?;
            return Ok(());
        }

        match (&panel.data, panel.kind) {
            (PanelData::Table(table), ChartKind::Line) => Self::draw_line(&area, &panel.title, table),
            (PanelData::Table(table), ChartKind::Pie) => Self::draw_pie(&area, &panel.title, table),
            (PanelData::Table(table), _) => Self::draw_bars(&area, &panel.title, table),
            (PanelData::Grouped(table), _) => Self::draw_grouped(&area, &panel.title, table),
        }
    }

    fn draw_line<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        title: &str,
        table: &AggregatedTable,
    ) -> Result<(), RenderError> {
        let labels = table.labels();
        let n = labels.len();
        let mut chart = ChartBuilder::on(area)
            .caption(title, (FONT, 20))
            .margin(8)
            .x_label_area_size(35)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), value_range(table.rows.iter().map(|r| r.value)))
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_labels(n.min(12))
            .x_label_formatter(&|x| category_label(&labels, *x))
            .x_desc(table.key_label.as_str())
            .y_desc(table.value_label.as_str())
            .draw()
            .map_err(draw_err)?;

        let points: Vec<(f64, f64)> = table
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| (i as f64, row.value))
            .collect();
        chart
            .draw_series(LineSeries::new(points.iter().copied(), LINE_COLOR.stroke_width(2)))
            .map_err(draw_err)?;
        chart
            .draw_series(points.iter().map(|&p| Circle::new(p, 3, LINE_COLOR.filled())))
            .map_err(draw_err)?;
        Ok(())
    }

    fn draw_bars<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        title: &str,
        table: &AggregatedTable,
    ) -> Result<(), RenderError> {
        let labels = table.labels();
        let n = labels.len();
        let mut chart = ChartBuilder::on(area)
            .caption(title, (FONT, 20))
            .margin(8)
            .x_label_area_size(35)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), value_range(table.rows.iter().map(|r| r.value)))
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&|x| category_label(&labels, *x))
            .y_desc(table.value_label.as_str())
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(table.rows.iter().enumerate().map(|(i, row)| {
                let x = i as f64;
                Rectangle::new([(x - 0.3, 0.0), (x + 0.3, row.value)], color(i).filled())
            }))
            .map_err(draw_err)?;
        Ok(())
    }

    fn draw_grouped<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        title: &str,
        table: &GroupedTable,
    ) -> Result<(), RenderError> {
        let keys = table.keys();
        let labels: Vec<String> = keys.iter().map(ToString::to_string).collect();
        let names = table.series_names();
        let n = keys.len();
        let slot = 0.8 / names.len().max(1) as f64;

        let mut chart = ChartBuilder::on(area)
            .caption(title, (FONT, 20))
            .margin(8)
            .x_label_area_size(35)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), value_range(table.rows.iter().map(|r| r.value)))
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n.min(15))
            .x_label_formatter(&|x| category_label(&labels, *x))
            .x_desc(table.key_label.as_str())
            .y_desc(table.value_label.as_str())
            .draw()
            .map_err(draw_err)?;

        for (s, name) in names.iter().enumerate() {
            let series_color = color(s);
            let offset = -0.4 + slot * s as f64;
            let bars: Vec<Rectangle<(f64, f64)>> = table
                .series(name)
                .into_iter()
                .filter_map(|(key, value)| {
                    let x = keys.iter().position(|k| *k == key)? as f64 + offset;
                    Some(Rectangle::new(
                        [(x, 0.0), (x + slot * 0.9, value)],
                        series_color.filled(),
                    ))
                })
                .collect();
            chart
                .draw_series(bars)
                .map_err(draw_err)?
                .label(name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], series_color.filled()));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err)?;
        Ok(())
    }

    fn draw_pie<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        title: &str,
        table: &AggregatedTable,
    ) -> Result<(), RenderError> {
        let inner = area.titled(title, (FONT, 20)).map_err(draw_err)?;
        let shares = table.shares();
        let fractions: Vec<f64> = shares.iter().map(|(_, share)| *share).collect();

        let (w, h) = inner.dim_in_pixel();
        let radius = (w.min(h) as f64) * 0.4;
        let center = (w as f64 * 0.35, h as f64 / 2.0);
        let point = |angle: f64| {
            (
                (center.0 + radius * angle.cos()).round() as i32,
                (center.1 + radius * angle.sin()).round() as i32,
            )
        };

        for (i, (start, end)) in pie_slices(&fractions).into_iter().enumerate() {
            let steps = (((end - start) / TAU) * 180.0).ceil().max(1.0) as usize;
            let mut outline = vec![(center.0.round() as i32, center.1.round() as i32)];
            for step in 0..=steps {
                outline.push(point(start + (end - start) * step as f64 / steps as f64));
            }
            inner
                .draw(&Polygon::new(outline, color(i).filled()))
                .map_err(draw_err)?;
        }

        let legend_x = (w as f64 * 0.72) as i32;
        for (i, (key, share)) in shares.iter().enumerate() {
            let y = 30 + i as i32 * 24;
            inner
                .draw(&Rectangle::new(
                    [(legend_x, y), (legend_x + 14, y + 14)],
                    color(i).filled(),
                ))
                .map_err(draw_err)?;
            inner
                .draw(&Text::new(
                    format!("{key} {:.1}%", share * 100.0),
                    (legend_x + 20, y),
                    (FONT, 15),
                ))
                .map_err(draw_err)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DashboardAggregator, SalesTable, StatisticMode};
    use polars::df;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    fn sample_table() -> SalesTable {
        let df = df!(
            "Year" => [1980i32, 1980, 1981, 1981],
            "Month" => ["Jan", "Feb", "Jan", "Feb"],
            "Vehicle_Type" => ["Sports", "Supperminicar", "Sports", "Executivecar"],
            "Automobile_Sales" => [120.0, 80.0, 300.0, 210.0],
            "Advertising_Expenditure" => [1500.0, 900.0, 2200.0, 1800.0],
            "Unemployment_Rate" => [6.1, 6.4, 3.2, 3.5],
            "Recession" => [1i32, 1, 0, 0],
        )
        .unwrap();
        SalesTable::from_dataframe(df).unwrap()
    }

    #[test]
    fn both_modes_export_as_png() {
        let table = sample_table();
        for mode in StatisticMode::ALL {
            let view = DashboardAggregator::compute_view(&table, Some(mode), Some(1980));
            assert!(!view.is_placeholder());
            let png = StaticChartRenderer::render_view_png(&view, 800, 600).unwrap();
            assert!(png.starts_with(&PNG_SIGNATURE), "{mode} export is not a PNG");
        }
    }

    #[test]
    fn tiny_export_size_is_rejected() {
        let view = DashboardAggregator::compute_view(
            &sample_table(),
            Some(StatisticMode::Yearly),
            Some(1981),
        );
        assert!(matches!(
            StaticChartRenderer::render_view_png(&view, 100, 600),
            Err(RenderError::InvalidSize(100, 600))
        ));
    }

    #[test]
    fn placeholder_view_cannot_be_exported() {
        let view = ViewResult::Placeholder("Please select a valid option.".to_string());
        assert!(matches!(
            StaticChartRenderer::render_view_png(&view, 800, 600),
            Err(RenderError::NothingToRender(_))
        ));
    }

    #[test]
    fn value_range_includes_zero_with_headroom() {
        let range = value_range([10.0, 50.0].into_iter());
        assert_eq!(range.start, 0.0);
        assert!((range.end - 55.0).abs() < 1e-9);
        assert_eq!(value_range(std::iter::empty()), 0.0..1.0);
    }
}
